//! Tracking of background tasks spawned on behalf of a pipeline.

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::Instrument;

#[derive(Default)]
struct Shared {
    active: AtomicUsize,
    spawned: AtomicUsize,
    panicked: AtomicUsize,
    idle: Notify,
}

/// Counts the live tasks of a group and lets callers await quiescence.
///
/// Clones share the same counters. A task is counted from the moment it is
/// spawned until its future completes or panics. Panicked tasks are also
/// tallied separately.
#[derive(Clone, Default)]
pub struct ActivityTracker {
    shared: Arc<Shared>,
}

/// Decrements the live count when the tracked task ends, however it ends.
struct ActiveGuard {
    shared: Arc<Shared>,
}

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        if std::thread::panicking() {
            self.shared.panicked.fetch_add(1, Ordering::SeqCst);
        }
        if self.shared.active.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.shared.idle.notify_waiters();
        }
    }
}

impl ActivityTracker {
    /// Creates a new, idle tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawns a tracked task on the current tokio runtime.
    ///
    /// The task runs inside a `debug` span named after `name`.
    pub fn spawn<Fut>(&self, name: &str, task: Fut) -> JoinHandle<()>
    where
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.shared.active.fetch_add(1, Ordering::SeqCst);
        self.shared.spawned.fetch_add(1, Ordering::SeqCst);

        let guard = ActiveGuard {
            shared: self.shared.clone(),
        };
        let span = tracing::debug_span!("tracked_task", task = %name);

        tokio::spawn(
            async move {
                let _guard = guard;
                task.await;
            }
            .instrument(span),
        )
    }

    /// Returns the number of tasks still running.
    #[must_use]
    pub fn active(&self) -> usize {
        self.shared.active.load(Ordering::SeqCst)
    }

    /// Returns the number of tasks ever spawned through this tracker.
    #[must_use]
    pub fn spawned(&self) -> usize {
        self.shared.spawned.load(Ordering::SeqCst)
    }

    /// Returns the number of tracked tasks that ended by panicking.
    #[must_use]
    pub fn panicked(&self) -> usize {
        self.shared.panicked.load(Ordering::SeqCst)
    }

    /// Returns true if no tracked task is running.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.active() == 0
    }

    /// Completes once every tracked task has finished.
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.shared.idle.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            if self.is_idle() {
                return;
            }
            notified.await;
        }
    }
}

impl std::fmt::Debug for ActivityTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActivityTracker")
            .field("active", &self.active())
            .field("spawned", &self.spawned())
            .field("panicked", &self.panicked())
            .finish()
    }
}
