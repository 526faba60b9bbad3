//! Node-level error taxonomy and the §6.7 fatal/retryable split.

use shared_types::ChainId;
use thiserror::Error;

/// Errors raised while starting or running the node.
///
/// Reference: spec.md §6.7 — "Nonzero exit on config load failure, DB open
/// failure for declared chains, or failure to derive the local validator
/// identity. All steady-state errors are logged and retried."
#[derive(Debug, Error)]
pub enum NodeError {
    /// The configuration failed validation.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// A declared chain's database could not be opened.
    #[error("failed to open chain database for {0}: {1}")]
    ChainDbOpen(ChainId, #[source] uv_chain_db::ChainDbError),

    /// The event store could not be built on top of an opened chain
    /// handle.
    #[error("failed to initialize event store for {0}: {1}")]
    EventStoreInit(ChainId, #[source] uv_event_store::EventStoreError),

    /// This validator's address could not be resolved against the
    /// host ledger's current validator set.
    #[error("failed to derive the local validator identity: {0}")]
    IdentityDerivation(String),

    /// The host ledger could not be reached at startup.
    #[error(transparent)]
    HostLedger(#[from] uv_host_ledger_client::HostLedgerError),
}

impl NodeError {
    /// `true` for the three conditions spec.md §6.7 names as fatal
    /// (process should exit nonzero rather than retry).
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            NodeError::Config(_) | NodeError::ChainDbOpen(_, _) | NodeError::IdentityDerivation(_)
        )
    }
}
