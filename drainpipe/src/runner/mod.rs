//! Bounded task runner.
//!
//! Executes a fixed list of independent tasks across a bounded number of
//! workers and stops handing out work once an error budget is spent.

mod config;
mod pool;
mod task;

#[cfg(test)]
mod integration_tests;

pub use config::RunnerConfig;
pub use pool::{run_tasks, RunSummary, TaskRunner};
pub use task::Task;
