//! Error taxonomy for the event store.
//!
//! Reference: spec.md §7 — "Local consistency: status update on a terminal
//! row ... log error, drop the message; never panic."

use thiserror::Error;

/// Errors returned by [`crate::EventStore`] operations.
#[derive(Debug, Error)]
pub enum EventStoreError {
    /// No row with the given `EventID`.
    #[error("event {0} not found")]
    NotFound(String),

    /// A status update was attempted on a row already in a terminal state.
    #[error("event {0} is already terminal ({1:?}); refusing transition")]
    AlreadyTerminal(String, shared_types::EventStatus),

    /// The requested status transition is not in the DAG from spec.md §3.
    #[error("event {0}: {1:?} -> {2:?} is not a legal transition")]
    IllegalTransition(String, shared_types::EventStatus, shared_types::EventStatus),

    /// `BlockHeight > ExpiryBlockHeight`, which would violate the
    /// height invariant.
    #[error("event {0}: block_height {1} exceeds expiry_block_height {2}")]
    HeightInvariantViolated(String, u64, u64),

    /// Underlying sqlite error.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// `EventData` failed to serialize/deserialize.
    #[error("event data codec error: {0}")]
    Codec(#[from] serde_json::Error),
}
