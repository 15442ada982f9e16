//! Cancellation token for cooperative cancellation.

use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use tokio_util::sync::CancellationToken as Signal;
use tracing::warn;

/// A callback type for cancellation notifications.
pub type CancelCallback = Box<dyn FnOnce() + Send>;

#[derive(Default)]
struct Shared {
    signal: Signal,
    reason: RwLock<Option<String>>,
    callbacks: Mutex<Vec<CancelCallback>>,
}

/// A level-triggered, broadcast cancellation signal.
///
/// Clones share the same state. Once fired the token stays cancelled, and
/// any number of listeners may observe it any number of times, either by
/// polling [`is_cancelled`](Self::is_cancelled) or by awaiting
/// [`cancelled`](Self::cancelled).
///
/// Cancellation is idempotent - only the first cancellation reason is kept.
#[derive(Clone, Default)]
pub struct CancellationToken {
    shared: Arc<Shared>,
}

impl CancellationToken {
    /// Creates a new cancellation token.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation with a reason.
    ///
    /// Returns `true` if this call fired the token, `false` if it was
    /// already cancelled. Waiters are woken and callbacks are invoked once.
    /// Panics in callbacks are logged and suppressed.
    pub fn cancel(&self, reason: impl Into<String>) -> bool {
        {
            // The reason lock serializes competing cancels; the first one wins.
            let mut slot = self.shared.reason.write();
            if self.shared.signal.is_cancelled() {
                return false;
            }
            *slot = Some(reason.into());
            self.shared.signal.cancel();
        }

        let callbacks = std::mem::take(&mut *self.shared.callbacks.lock());
        for callback in callbacks {
            invoke_suppressed(callback);
        }

        true
    }

    /// Registers a callback to be invoked on cancellation.
    ///
    /// If already cancelled, the callback is invoked immediately.
    pub fn on_cancel<F>(&self, callback: F)
    where
        F: FnOnce() + Send + 'static,
    {
        {
            // Checked under the lock so `cancel` cannot take the list between
            // the check and the push.
            let mut callbacks = self.shared.callbacks.lock();
            if !self.is_cancelled() {
                callbacks.push(Box::new(callback));
                return;
            }
        }
        invoke_suppressed(Box::new(callback));
    }

    /// Returns whether cancellation has been requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.shared.signal.is_cancelled()
    }

    /// Returns the cancellation reason, if any.
    #[must_use]
    pub fn reason(&self) -> Option<String> {
        self.shared.reason.read().clone()
    }

    /// Completes once the token has been cancelled.
    ///
    /// Returns immediately if cancellation already happened.
    pub async fn cancelled(&self) {
        self.shared.signal.cancelled().await;
    }
}

fn invoke_suppressed(callback: CancelCallback) {
    if let Err(e) = std::panic::catch_unwind(std::panic::AssertUnwindSafe(callback)) {
        warn!("Cancellation callback panicked: {:?}", e);
    }
}

impl std::fmt::Debug for CancellationToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancellationToken")
            .field("cancelled", &self.is_cancelled())
            .field("reason", &self.reason())
            .finish()
    }
}
