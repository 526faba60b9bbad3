//! Error taxonomy for the signing-request verifier.

use thiserror::Error;

use crate::ports::BuilderError;

/// Errors returned by [`crate::SigningVerifier::verify`].
///
/// Reference: spec.md §7 — "Validation: ... hash mismatch -> reject the
/// message; do not transition event status; log at warn."
#[derive(Debug, Error)]
pub enum VerifierError {
    /// `EventData` did not parse as `OutboundCreatedEvent`.
    #[error("event data did not parse as OutboundCreatedEvent: {0}")]
    MalformedEventData(#[from] serde_json::Error),

    /// The coordinator's gas price fell outside the oracle's tolerance band.
    #[error(
        "coordinator gas price {coordinator} outside tolerance of oracle {oracle} (±{tolerance_percent}%)"
    )]
    GasPriceOutOfTolerance {
        /// Gas price the coordinator supplied.
        coordinator: u128,
        /// Gas price observed by the oracle.
        oracle: u128,
        /// Configured tolerance percent.
        tolerance_percent: u8,
    },

    /// The locally computed pre-image hash did not match the coordinator's.
    #[error("signing hash mismatch")]
    SigningHashMismatch,

    /// The gas price oracle call failed.
    #[error("gas price oracle error: {0}")]
    Oracle(#[source] BuilderError),

    /// The transaction builder call failed.
    #[error("transaction builder error: {0}")]
    Builder(#[source] BuilderError),
}
