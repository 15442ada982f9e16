//! The consumer-facing end of a pipeline.

use futures::Stream;
use tokio::sync::mpsc;

use crate::cancellation::{ActivityTracker, CancellationToken};

/// Final output sequence of a pipeline.
///
/// Yields values from the last stage until that stage finishes or the
/// cancellation signal fires, whichever comes first. After the signal has
/// fired no value is returned, even one already buffered.
pub struct PipelineOutput<T> {
    rx: mpsc::Receiver<T>,
    cancel: CancellationToken,
    activity: ActivityTracker,
}

impl<T> PipelineOutput<T>
where
    T: Send + 'static,
{
    pub(crate) fn new(
        rx: mpsc::Receiver<T>,
        cancel: CancellationToken,
        activity: ActivityTracker,
    ) -> Self {
        Self {
            rx,
            cancel,
            activity,
        }
    }

    /// Returns an output that is already exhausted.
    pub(crate) fn exhausted(cancel: CancellationToken) -> Self {
        let (_, rx) = mpsc::channel(1);
        Self::new(rx, cancel, ActivityTracker::new())
    }

    /// Receives the next value, or `None` once the sequence has ended.
    pub async fn recv(&mut self) -> Option<T> {
        if self.cancel.is_cancelled() {
            self.rx.close();
            return None;
        }

        tokio::select! {
            biased;
            () = self.cancel.cancelled() => {
                self.rx.close();
                None
            }
            value = self.rx.recv() => value,
        }
    }

    /// Returns the tracker of every relay and drain task behind this output.
    ///
    /// Awaiting [`ActivityTracker::wait_idle`] after the output is exhausted
    /// confirms that the pipeline left nothing running.
    #[must_use]
    pub fn activity(&self) -> ActivityTracker {
        self.activity.clone()
    }

    /// Converts the output into a [`Stream`].
    pub fn into_stream(self) -> impl Stream<Item = T> + Send {
        futures::stream::unfold(self, |mut output| async move {
            output.recv().await.map(|value| (value, output))
        })
    }
}

impl<T> std::fmt::Debug for PipelineOutput<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineOutput")
            .field("cancelled", &self.cancel.is_cancelled())
            .field("activity", &self.activity)
            .finish()
    }
}
