//! Reverts `CONFIRMED` events whose expiry block height has passed,
//! refunding sign events via a failure vote before marking them
//! `REVERTED`.
//!
//! Reference: spec.md §4.7.

mod errors;
mod scheduler;
mod sweeper;

pub use errors::SweeperError;
pub use scheduler::{spawn_sweeper_loop, DEFAULT_CHECK_INTERVAL};
pub use sweeper::{ExpirySweeper, Outcome, SweepSummary, DEFAULT_BATCH_SIZE, EXPIRY_ERROR_MSG};
