//! Bounded worker pool with an error budget.
//!
//! A single dispatcher hands tasks out in input order. Each worker announces
//! readiness by queueing a one-shot slot, and the dispatcher fills the next
//! ready slot with the next task. Failures are counted in one atomic
//! counter; when it reaches the budget an internal cancellation token fires,
//! the dispatcher stops handing out work, and workers exit after the task
//! they are running.
//!
//! Up to `workers` tasks can be in flight when the budget-th failure lands,
//! so the number of started tasks is bounded by `workers + error_budget`.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinSet;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use super::{RunnerConfig, Task};
use crate::cancellation::CancellationToken;
use crate::errors::RunError;

/// Slot a ready worker waits on for its next task.
type Slot = oneshot::Sender<Task>;

/// Outcome counts of a run that stayed within its error budget.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Number of workers spawned.
    pub workers: usize,
    /// Number of tasks handed to a worker.
    pub dispatched: usize,
    /// Number of tasks that returned `Ok`.
    pub succeeded: usize,
    /// Number of tasks that returned an error.
    pub failed: usize,
}

#[derive(Default)]
struct Counters {
    dispatched: AtomicUsize,
    succeeded: AtomicUsize,
    failed: AtomicUsize,
}

/// Executes tasks across a bounded number of concurrent workers.
#[derive(Debug, Clone)]
pub struct TaskRunner {
    config: RunnerConfig,
}

impl TaskRunner {
    /// Creates a runner with the given configuration.
    #[must_use]
    pub fn new(config: RunnerConfig) -> Self {
        Self { config }
    }

    /// Returns the runner configuration.
    #[must_use]
    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Runs every task, stopping dispatch once the error budget is spent.
    ///
    /// Configuration errors are returned before anything is spawned. The
    /// call completes only after every dispatched task has finished and
    /// every worker has exited. If a task panics, the panic is resumed on
    /// the caller once the remaining workers are joined.
    pub async fn run(&self, tasks: Vec<Task>) -> Result<RunSummary, RunError> {
        self.config.validate()?;

        let workers = self.config.effective_workers(tasks.len());
        let budget = self.config.error_budget;
        let span = info_span!(
            "task_run",
            run_id = %Uuid::new_v4(),
            workers,
            budget,
            tasks = tasks.len(),
        );

        execute(tasks, workers, budget).instrument(span).await
    }
}

/// Runs `tasks` with `workers` workers and an error budget of `budget`.
///
/// Shorthand for [`TaskRunner::run`] that discards the summary.
pub async fn run_tasks(tasks: Vec<Task>, workers: usize, budget: usize) -> Result<(), RunError> {
    TaskRunner::new(RunnerConfig::new(workers, budget))
        .run(tasks)
        .await
        .map(|_| ())
}

async fn execute(tasks: Vec<Task>, workers: usize, budget: usize) -> Result<RunSummary, RunError> {
    if workers == 0 {
        debug!("No tasks to run");
        return Ok(RunSummary::default());
    }

    info!("Starting task run");

    let counters = Arc::new(Counters::default());
    let exhausted = CancellationToken::new();
    let (ready_tx, ready_rx) = mpsc::channel::<Slot>(workers);

    let mut pool = JoinSet::new();
    for worker_id in 0..workers {
        pool.spawn(
            worker(
                ready_tx.clone(),
                counters.clone(),
                exhausted.clone(),
                budget,
            )
            .instrument(tracing::debug_span!("worker", worker_id)),
        );
    }
    drop(ready_tx);

    dispatch(tasks, ready_rx, &exhausted, &counters).await;

    let mut panic = None;
    while let Some(joined) = pool.join_next().await {
        if let Err(err) = joined {
            if err.is_panic() {
                panic.get_or_insert(err.into_panic());
            }
        }
    }
    if let Some(payload) = panic {
        std::panic::resume_unwind(payload);
    }

    let summary = RunSummary {
        workers,
        dispatched: counters.dispatched.load(Ordering::SeqCst),
        succeeded: counters.succeeded.load(Ordering::SeqCst),
        failed: counters.failed.load(Ordering::SeqCst),
    };

    if summary.failed >= budget {
        warn!(
            failed = summary.failed,
            dispatched = summary.dispatched,
            "Errors limit exceeded"
        );
        return Err(RunError::ErrorsLimitExceeded {
            failed: summary.failed,
            budget,
        });
    }

    info!(
        dispatched = summary.dispatched,
        succeeded = summary.succeeded,
        failed = summary.failed,
        "Task run finished"
    );
    Ok(summary)
}

/// Hands tasks to ready workers in input order.
///
/// Returns when every task was handed out, the budget is exhausted, or no
/// worker is left to accept work. Dropping `ready` on return releases any
/// worker still waiting for a task.
async fn dispatch(
    tasks: Vec<Task>,
    mut ready: mpsc::Receiver<Slot>,
    exhausted: &CancellationToken,
    counters: &Counters,
) {
    let mut pending = tasks.into_iter();
    let mut next = pending.next();

    while let Some(task) = next.take() {
        let slot = tokio::select! {
            biased;
            () = exhausted.cancelled() => None,
            slot = ready.recv() => slot,
        };
        let Some(slot) = slot else {
            break;
        };
        if exhausted.is_cancelled() {
            break;
        }

        match slot.send(task) {
            Ok(()) => {
                counters.dispatched.fetch_add(1, Ordering::SeqCst);
                next = pending.next();
            }
            // The worker behind this slot is gone; offer the task to the next one.
            Err(task) => next = Some(task),
        }
    }

    debug!(
        dispatched = counters.dispatched.load(Ordering::SeqCst),
        remaining = pending.len(),
        "Dispatcher stopped"
    );
}

async fn worker(
    ready: mpsc::Sender<Slot>,
    counters: Arc<Counters>,
    exhausted: CancellationToken,
    budget: usize,
) {
    while !exhausted.is_cancelled() {
        let (slot_tx, slot_rx) = oneshot::channel();
        if ready.send(slot_tx).await.is_err() {
            break;
        }
        let Ok(task) = slot_rx.await else {
            break;
        };

        let label = task.label().map(str::to_owned);
        match task.invoke().await {
            Ok(()) => {
                counters.succeeded.fetch_add(1, Ordering::SeqCst);
            }
            Err(err) => {
                let failed = counters.failed.fetch_add(1, Ordering::SeqCst) + 1;
                debug!(task = ?label, failed, error = %err, "Task failed");
                if failed >= budget {
                    exhausted.cancel("errors limit exceeded");
                }
            }
        }
    }
}
