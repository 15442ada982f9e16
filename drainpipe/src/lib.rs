//! # Drainpipe
//!
//! Concurrent execution control on tokio with cooperative cancellation and
//! guaranteed cleanup.
//!
//! Drainpipe provides two independent engines:
//!
//! - **Task runner**: runs a fixed list of tasks on a bounded number of
//!   workers and stops dispatching once an error budget is spent
//! - **Stage pipeline**: chains concurrently running stages and stops the
//!   whole chain on a single cancellation signal, draining in-flight data so
//!   no stage is left blocked
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use drainpipe::prelude::*;
//!
//! // Run tasks on four workers, giving up after three failures.
//! let tasks = vec![Task::new(|| async { Ok(()) })];
//! run_tasks(tasks, 4, 3).await?;
//!
//! // Double every value until the token fires.
//! let cancel = CancellationToken::new();
//! let mut output = execute_pipeline(Some(input), &cancel, vec![Some(stage::map(|x| x * 2))]);
//! while let Some(value) = output.recv().await {
//!     println!("{value}");
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod cancellation;
pub mod errors;
pub mod observability;
pub mod pipeline;
pub mod runner;
pub mod testing;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::cancellation::{ActivityTracker, CancellationToken};
    pub use crate::errors::RunError;
    pub use crate::observability::{init_tracing, LogFormat};
    pub use crate::pipeline::{
        execute_pipeline, stage, Pipeline, PipelineConfig, PipelineOutput, Stage,
    };
    pub use crate::runner::{run_tasks, RunSummary, RunnerConfig, Task, TaskRunner};
}
