//! Scenario tests for the bounded task runner.

#[cfg(test)]
mod tests {
    use crate::errors::RunError;
    use crate::runner::{run_tasks, RunnerConfig, Task, TaskRunner};
    use crate::testing::TaskProbe;
    use pretty_assertions::assert_eq;
    use rand::Rng;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::{Duration, Instant};

    fn random_delay() -> Duration {
        Duration::from_millis(rand::thread_rng().gen_range(0..100))
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_errors_in_all_tasks_bound_started_count() {
        let probe = TaskProbe::new();
        let tasks: Vec<Task> = (0..50)
            .map(|i| probe.failing(random_delay(), format!("error from task {i}")))
            .collect();

        let workers = 10;
        let budget = 23;
        let result = run_tasks(tasks, workers, budget).await;

        assert!(
            matches!(result, Err(RunError::ErrorsLimitExceeded { budget: 23, .. })),
            "actual result - {result:?}"
        );
        assert!(
            probe.invoked() <= workers + budget,
            "extra tasks were started: {}",
            probe.invoked()
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_tasks_without_errors_run_concurrently() {
        let probe = TaskProbe::new();
        let mut sum = Duration::ZERO;
        let tasks: Vec<Task> = (0..50)
            .map(|_| {
                let delay = random_delay();
                sum += delay;
                probe.succeeding(delay)
            })
            .collect();

        let start = Instant::now();
        let summary = TaskRunner::new(RunnerConfig::new(5, 1))
            .run(tasks)
            .await
            .unwrap();
        let elapsed = start.elapsed();

        assert_eq!(probe.invoked(), 50, "not all tasks were completed");
        assert_eq!(summary.succeeded, 50);
        assert!(elapsed <= sum / 2, "tasks were run sequentially? {elapsed:?} vs {sum:?}");
    }

    #[tokio::test]
    async fn test_zero_budget_and_zero_workers() {
        assert_eq!(run_tasks(Vec::new(), 0, 0).await, Err(RunError::InvalidBudget));
        assert_eq!(run_tasks(Vec::new(), 0, 1).await, Err(RunError::InvalidWorkerCount));
    }

    #[tokio::test]
    async fn test_every_task_invoked_exactly_once() {
        let calls: Arc<Vec<AtomicUsize>> = Arc::new((0..40).map(|_| AtomicUsize::new(0)).collect());
        let tasks = (0..40)
            .map(|i| {
                let calls = calls.clone();
                Task::new(move || async move {
                    calls[i].fetch_add(1, Ordering::SeqCst);
                    tokio::task::yield_now().await;
                    if i % 10 == 0 {
                        return Err(anyhow::anyhow!("task {i} failed"));
                    }
                    Ok(())
                })
                .with_label(format!("task-{i}"))
            })
            .collect();

        // Four failures against a budget of five.
        let summary = TaskRunner::new(RunnerConfig::new(6, 5))
            .run(tasks)
            .await
            .unwrap();

        assert_eq!(summary.failed, 4);
        assert_eq!(summary.dispatched, 40);
        for (i, count) in calls.iter().enumerate() {
            assert_eq!(count.load(Ordering::SeqCst), 1, "task {i}");
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrency_reaches_worker_count() {
        const TASKS: usize = 100;
        const WORKERS: usize = 5;

        let current = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let tasks = (0..TASKS)
            .map(|_| {
                let current = current.clone();
                let peak = peak.clone();
                Task::new(move || async move {
                    let now = current.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(2)).await;
                    current.fetch_sub(1, Ordering::SeqCst);
                    Ok(())
                })
            })
            .collect();

        run_tasks(tasks, WORKERS, 1).await.unwrap();

        assert_eq!(peak.load(Ordering::SeqCst), WORKERS);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_mixed_failures_stop_dispatch() {
        let probe = TaskProbe::new();
        let mut tasks = Vec::new();
        for i in 0..60 {
            if i % 2 == 0 {
                tasks.push(probe.failing(Duration::from_millis(5), "even"));
            } else {
                tasks.push(probe.succeeding(Duration::from_millis(5)));
            }
        }

        let result = run_tasks(tasks, 4, 3).await;

        let Err(RunError::ErrorsLimitExceeded { failed, budget }) = result.clone() else {
            panic!("expected limit error, got {result:?}");
        };
        assert_eq!(budget, 3);
        assert!(failed >= 3);
        assert!(probe.invoked() < 60, "dispatch did not stop");
    }
}
