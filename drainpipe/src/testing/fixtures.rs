//! Fixtures for exercising the runner and the pipeline.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use crate::cancellation::ActivityTracker;
use crate::pipeline::{PipelineOutput, Stage};
use crate::runner::Task;

/// Builds tasks that record how often they were invoked.
#[derive(Debug, Clone, Default)]
pub struct TaskProbe {
    invoked: Arc<AtomicUsize>,
}

impl TaskProbe {
    /// Creates a probe with a zero count.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns how many probe tasks have been invoked.
    #[must_use]
    pub fn invoked(&self) -> usize {
        self.invoked.load(Ordering::SeqCst)
    }

    /// A task that sleeps for `delay` and then succeeds.
    #[must_use]
    pub fn succeeding(&self, delay: Duration) -> Task {
        self.task(delay, None)
    }

    /// A task that sleeps for `delay` and then fails with `message`.
    #[must_use]
    pub fn failing(&self, delay: Duration, message: impl Into<String>) -> Task {
        self.task(delay, Some(message.into()))
    }

    fn task(&self, delay: Duration, error: Option<String>) -> Task {
        let invoked = self.invoked.clone();
        Task::new(move || async move {
            invoked.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(delay).await;
            match error {
                Some(message) => Err(anyhow::anyhow!(message)),
                None => Ok(()),
            }
        })
    }
}

/// Returns a receiver that yields `values` and then ends.
///
/// The producer task stops early if the receiver is dropped.
pub fn feed<T>(values: Vec<T>) -> mpsc::Receiver<T>
where
    T: Send + 'static,
{
    let (tx, rx) = mpsc::channel(1);
    tokio::spawn(async move {
        for value in values {
            if tx.send(value).await.is_err() {
                break;
            }
        }
    });
    rx
}

/// Receives from `output` until it is exhausted.
pub async fn collect<T>(mut output: PipelineOutput<T>) -> Vec<T>
where
    T: Send + 'static,
{
    let mut values = Vec::new();
    while let Some(value) = output.recv().await {
        values.push(value);
    }
    values
}

/// A stage that forwards each value after `delay` and ignores cancellation.
///
/// Its task is spawned through `tracker` so tests can await its exit. Send
/// failures abort the stage with a panic, which makes a stage that was left
/// blocked or cut off visible as a failed tracked task.
pub fn tracked_passthrough<T>(tracker: &ActivityTracker, delay: Duration) -> Stage<T>
where
    T: Send + 'static,
{
    let tracker = tracker.clone();
    Box::new(move |mut input: mpsc::Receiver<T>| {
        let (tx, rx) = mpsc::channel(1);
        tracker.spawn("passthrough", async move {
            while let Some(value) = input.recv().await {
                tokio::time::sleep(delay).await;
                tx.send(value)
                    .await
                    .unwrap_or_else(|_| panic!("downstream closed before input ended"));
            }
        });
        rx
    })
}
