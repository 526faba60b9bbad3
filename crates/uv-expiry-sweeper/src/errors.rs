//! Error taxonomy for the expiry sweeper.

use shared_types::EventId;
use thiserror::Error;

/// Errors raised while sweeping an expired `CONFIRMED` event.
#[derive(Debug, Error)]
pub enum SweeperError {
    /// A `SIGN` row's `EventData` did not parse as `OutboundCreatedEvent`.
    #[error("event {0} has malformed EventData: {1}")]
    MalformedEventData(EventId, serde_json::Error),

    /// An `EventStore` operation failed.
    #[error(transparent)]
    EventStore(#[from] uv_event_store::EventStoreError),

    /// A `HostLedgerClient` call failed.
    #[error(transparent)]
    HostLedger(#[from] uv_host_ledger_client::HostLedgerError),
}
