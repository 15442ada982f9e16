//! Testing utilities for drainpipe runs and pipelines.
//!
//! This module provides:
//! - Task probes that count invocations
//! - Channel feeders and output collectors
//! - Tracked stages for leak checks

mod fixtures;

pub use fixtures::{collect, feed, tracked_passthrough, TaskProbe};
