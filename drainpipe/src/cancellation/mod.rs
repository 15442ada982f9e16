//! Cooperative cancellation primitives.
//!
//! This module provides:
//! - CancellationToken, a level-triggered stop signal shared by clones
//! - ActivityTracker for awaiting quiescence of background tasks

mod token;
mod tracker;

pub use token::{CancelCallback, CancellationToken};
pub use tracker::ActivityTracker;
