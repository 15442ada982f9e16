//! Cancellation-aware relay between adjacent pipeline stages.
//!
//! A relay copies values from an upstream receiver to a downstream sender.
//! Every wait races the cancellation signal and the signal wins ties. Once a
//! relay stops forwarding it closes its downstream side and hands upstream
//! to a drain task, which discards values until upstream ends so the
//! producing stage is never left blocked on a send.

use tokio::sync::mpsc;
use tracing::debug;

use crate::cancellation::{ActivityTracker, CancellationToken};

/// Lifecycle of a relay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RelayState {
    /// Copying values downstream.
    Forwarding,
    /// Cancelled or abandoned by downstream; discarding upstream output.
    Draining,
    /// Upstream ended; downstream is closed.
    Closed,
}

pub(crate) struct Relay<T> {
    name: String,
    upstream: mpsc::Receiver<T>,
    downstream: mpsc::Sender<T>,
    cancel: CancellationToken,
}

impl<T> Relay<T>
where
    T: Send + 'static,
{
    /// Spawns a relay reading `upstream` and returns its downstream end.
    pub(crate) fn spawn(
        name: String,
        upstream: mpsc::Receiver<T>,
        cancel: &CancellationToken,
        tracker: &ActivityTracker,
        capacity: usize,
    ) -> mpsc::Receiver<T> {
        let (downstream, rx) = mpsc::channel(capacity);
        let relay = Self {
            name: name.clone(),
            upstream,
            downstream,
            cancel: cancel.clone(),
        };

        let drain_tracker = tracker.clone();
        tracker.spawn(&name, async move {
            relay.run(&drain_tracker).await;
        });

        rx
    }

    async fn run(mut self, tracker: &ActivityTracker) -> RelayState {
        let mut state = RelayState::Forwarding;
        while state == RelayState::Forwarding {
            state = self.step().await;
        }
        debug!(relay = %self.name, ?state, "Relay stopped forwarding");

        if state == RelayState::Draining {
            let Self { name, upstream, downstream, .. } = self;
            drop(downstream);
            tracker.spawn(&format!("{name}-drain"), drain(name.clone(), upstream));
        }

        state
    }

    /// Moves at most one value downstream and returns the next state.
    async fn step(&mut self) -> RelayState {
        let next = tokio::select! {
            biased;
            () = self.cancel.cancelled() => return RelayState::Draining,
            () = self.downstream.closed() => return RelayState::Draining,
            next = self.upstream.recv() => next,
        };

        let Some(value) = next else {
            return RelayState::Closed;
        };

        // The value is dropped if cancellation pre-empts the send.
        tokio::select! {
            biased;
            () = self.cancel.cancelled() => RelayState::Draining,
            sent = self.downstream.send(value) => match sent {
                Ok(()) => RelayState::Forwarding,
                Err(_) => RelayState::Draining,
            },
        }
    }
}

async fn drain<T>(relay: String, mut upstream: mpsc::Receiver<T>) {
    let mut discarded = 0usize;
    while upstream.recv().await.is_some() {
        discarded += 1;
    }
    debug!(%relay, discarded, "Upstream drained");
}
