//! Cancellable stage pipeline.
//!
//! Stages are chained so that each stage's output feeds the next stage's
//! input. A relay sits in front of the first stage and behind every stage;
//! relays are the only components that observe the cancellation signal.
//! When the signal fires each relay stops forwarding, closes its downstream
//! side and drains its upstream, so every stage sees its input end and can
//! exit even if it never looks at the signal itself.

mod config;
mod output;
mod relay;
pub mod stage;


pub use config::PipelineConfig;
pub use output::PipelineOutput;
pub use stage::Stage;

use tokio::sync::mpsc;
use tracing::{debug, info_span};
use uuid::Uuid;

use crate::cancellation::{ActivityTracker, CancellationToken};
use relay::Relay;

/// Builds and starts stage pipelines.
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    /// Creates a pipeline builder with the given configuration.
    #[must_use]
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Returns the pipeline configuration.
    #[must_use]
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Wires `stages` onto `input` and returns the final output sequence.
    ///
    /// `None` entries in `stages` are skipped. If `input` is `None` or no
    /// stage remains, the returned output is already exhausted and `input`
    /// is dropped. Must be called within a tokio runtime.
    pub fn execute<T>(
        &self,
        input: Option<mpsc::Receiver<T>>,
        cancel: &CancellationToken,
        stages: Vec<Option<Stage<T>>>,
    ) -> PipelineOutput<T>
    where
        T: Send + 'static,
    {
        let stages: Vec<Stage<T>> = stages.into_iter().flatten().collect();
        let Some(input) = input.filter(|_| !stages.is_empty()) else {
            debug!(pipeline = %self.config.name, "Nothing to run, output is exhausted");
            return PipelineOutput::exhausted(cancel.clone());
        };

        let span = info_span!(
            "pipeline",
            name = %self.config.name,
            run_id = %Uuid::new_v4(),
            stages = stages.len(),
        );
        let _entered = span.enter();

        let tracker = ActivityTracker::new();
        let capacity = self.config.effective_relay_capacity();

        let mut current = Relay::spawn("relay-input".to_string(), input, cancel, &tracker, capacity);
        for (index, stage) in stages.into_iter().enumerate() {
            let stage_output = stage(current);
            current = Relay::spawn(format!("relay-{index}"), stage_output, cancel, &tracker, capacity);
        }

        debug!(relays = tracker.spawned(), "Pipeline started");
        PipelineOutput::new(current, cancel.clone(), tracker)
    }
}

/// Runs `input` through `stages` with the default configuration.
///
/// See [`Pipeline::execute`].
pub fn execute_pipeline<T>(
    input: Option<mpsc::Receiver<T>>,
    cancel: &CancellationToken,
    stages: Vec<Option<Stage<T>>>,
) -> PipelineOutput<T>
where
    T: Send + 'static,
{
    Pipeline::default().execute(input, cancel, stages)
}
