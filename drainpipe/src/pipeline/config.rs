//! Configuration for the stage pipeline.

use serde::{Deserialize, Serialize};

/// Configuration for a [`Pipeline`](super::Pipeline).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Name recorded on the pipeline's tracing span.
    #[serde(default = "default_name")]
    pub name: String,
    /// Buffer size of each relay channel. Zero is treated as one.
    #[serde(default = "default_relay_capacity")]
    pub relay_capacity: usize,
}

fn default_name() -> String {
    "pipeline".to_string()
}

fn default_relay_capacity() -> usize {
    1
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            relay_capacity: default_relay_capacity(),
        }
    }
}

impl PipelineConfig {
    /// Creates a configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the pipeline name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the relay channel capacity.
    #[must_use]
    pub fn with_relay_capacity(mut self, capacity: usize) -> Self {
        self.relay_capacity = capacity;
        self
    }

    /// Returns the relay capacity clamped to a usable channel size.
    #[must_use]
    pub fn effective_relay_capacity(&self) -> usize {
        self.relay_capacity.max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.name, "pipeline");
        assert_eq!(config.relay_capacity, 1);
    }

    #[test]
    fn test_zero_capacity_clamped() {
        let config = PipelineConfig::new().with_relay_capacity(0);
        assert_eq!(config.effective_relay_capacity(), 1);

        let config = config.with_relay_capacity(16);
        assert_eq!(config.effective_relay_capacity(), 16);
    }

    #[test]
    fn test_deserialize_partial() {
        let config: PipelineConfig = serde_json::from_str(r#"{"name": "ingest"}"#).unwrap();
        assert_eq!(config, PipelineConfig::new().with_name("ingest"));
    }
}
