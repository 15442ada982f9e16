//! Error types for the drainpipe engines.
//!
//! Only the task runner reports errors. The pipeline signals cancellation
//! solely by ending its output sequence early.

use std::collections::HashMap;
use thiserror::Error;

/// Errors returned by the task runner.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RunError {
    /// The error budget was zero.
    #[error("invalid error budget: must be greater than zero")]
    InvalidBudget,

    /// The worker count was zero.
    #[error("invalid workers count: must be greater than zero")]
    InvalidWorkerCount,

    /// At least `budget` tasks failed.
    #[error("errors limit exceeded: {failed} task(s) failed, budget was {budget}")]
    ErrorsLimitExceeded {
        /// Number of failed tasks observed when the run finished.
        failed: usize,
        /// The configured error budget.
        budget: usize,
    },
}

impl RunError {
    /// Returns true for pre-flight configuration errors.
    ///
    /// These are reported before any task is invoked.
    #[must_use]
    pub fn is_config_error(&self) -> bool {
        matches!(self, Self::InvalidBudget | Self::InvalidWorkerCount)
    }

    /// Returns a stable machine-readable code for the error.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidBudget => "RUN-001-INVALID_BUDGET",
            Self::InvalidWorkerCount => "RUN-002-INVALID_WORKERS",
            Self::ErrorsLimitExceeded { .. } => "RUN-003-ERRORS_LIMIT",
        }
    }

    /// Converts to a dictionary representation.
    #[must_use]
    pub fn to_dict(&self) -> HashMap<String, serde_json::Value> {
        let mut map = HashMap::new();
        map.insert("code".to_string(), serde_json::json!(self.code()));
        map.insert("message".to_string(), serde_json::json!(self.to_string()));

        if let Self::ErrorsLimitExceeded { failed, budget } = self {
            map.insert("failed".to_string(), serde_json::json!(failed));
            map.insert("budget".to_string(), serde_json::json!(budget));
        }

        map
    }
}
