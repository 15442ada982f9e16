//! Units of work executed by the task runner.

use futures::future::BoxFuture;
use futures::FutureExt;
use std::future::Future;

type BoxedWork = Box<dyn FnOnce() -> BoxFuture<'static, anyhow::Result<()>> + Send>;

/// A single unit of work.
///
/// The work is consumed when invoked, so a task runs at most once. It must
/// be safe to run concurrently with other tasks; the runner imposes no
/// shared-state assumptions.
pub struct Task {
    label: Option<String>,
    work: BoxedWork,
}

impl Task {
    /// Creates a task from an async closure.
    pub fn new<F, Fut>(work: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        Self {
            label: None,
            work: Box::new(move || work().boxed()),
        }
    }

    /// Creates a task from a synchronous closure.
    ///
    /// The closure runs on tokio's blocking pool, so it may sleep or do
    /// blocking I/O without stalling other workers.
    pub fn blocking<F>(work: F) -> Self
    where
        F: FnOnce() -> anyhow::Result<()> + Send + 'static,
    {
        Self::new(move || async move {
            match tokio::task::spawn_blocking(work).await {
                Ok(result) => result,
                Err(err) if err.is_panic() => std::panic::resume_unwind(err.into_panic()),
                Err(err) => Err(err.into()),
            }
        })
    }

    /// Attaches a label used in log records.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Returns the task label, if any.
    #[must_use]
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub(crate) async fn invoke(self) -> anyhow::Result<()> {
        (self.work)().await
    }
}

impl std::fmt::Debug for Task {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Task").field("label", &self.label).finish()
    }
}
