//! Error taxonomy for the host-ledger client.

use thiserror::Error;

/// Errors returned by [`crate::HostLedgerClient`] adapters.
#[derive(Debug, Error)]
pub enum HostLedgerError {
    /// Every configured endpoint failed (connection refused, timeout, or
    /// rejected request).
    #[error("all {attempted} host-ledger endpoints failed; last error: {last_error}")]
    AllEndpointsFailed {
        /// Number of endpoints attempted before giving up.
        attempted: usize,
        /// The last error observed.
        last_error: String,
    },

    /// One endpoint call failed (transient; caller falls through).
    #[error("host-ledger RPC error: {0}")]
    Rpc(String),

    /// An [`crate::Observation`] violated spec.md §4.6's field invariants.
    #[error("invalid observation: {0}")]
    InvalidObservation(String),
}
