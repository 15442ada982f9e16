//! Configuration for the bounded task runner.

use serde::{Deserialize, Serialize};

use crate::errors::RunError;

/// Configuration for a [`TaskRunner`](super::TaskRunner).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunnerConfig {
    /// Desired number of concurrent workers.
    #[serde(default = "default_workers")]
    pub workers: usize,
    /// Number of failed tasks that aborts the run.
    #[serde(default = "default_error_budget")]
    pub error_budget: usize,
}

fn default_workers() -> usize {
    std::thread::available_parallelism().map_or(1, std::num::NonZeroUsize::get)
}

fn default_error_budget() -> usize {
    1
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            error_budget: default_error_budget(),
        }
    }
}

impl RunnerConfig {
    /// Creates a configuration with explicit limits.
    #[must_use]
    pub fn new(workers: usize, error_budget: usize) -> Self {
        Self {
            workers,
            error_budget,
        }
    }

    /// Sets the worker count.
    #[must_use]
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Sets the error budget.
    #[must_use]
    pub fn with_error_budget(mut self, error_budget: usize) -> Self {
        self.error_budget = error_budget;
        self
    }

    /// Checks the pre-flight invariants.
    ///
    /// The budget is checked before the worker count.
    pub fn validate(&self) -> Result<(), RunError> {
        if self.error_budget == 0 {
            return Err(RunError::InvalidBudget);
        }
        if self.workers == 0 {
            return Err(RunError::InvalidWorkerCount);
        }
        Ok(())
    }

    /// Returns the number of workers actually spawned for `task_count` tasks.
    #[must_use]
    pub fn effective_workers(&self, task_count: usize) -> usize {
        self.workers.min(task_count)
    }
}
