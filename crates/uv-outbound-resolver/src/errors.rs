//! Error taxonomy for the outbound resolver.

use shared_types::EventId;
use thiserror::Error;

/// Errors raised while resolving a broadcasted sign event.
#[derive(Debug, Error)]
pub enum ResolverError {
    /// A `BROADCASTED` row had no `broadcasted_tx_hash`, which should be
    /// impossible per the `Event` status invariant.
    #[error("event {0} is BROADCASTED but has no broadcasted_tx_hash")]
    MissingBroadcastHash(EventId),

    /// `broadcasted_tx_hash` was not a well-formed CAIP tx hash.
    #[error("event {0} has a malformed broadcasted_tx_hash: {1}")]
    MalformedHash(EventId, String),

    /// `EventData` did not parse as `OutboundCreatedEvent`.
    #[error("event {0} has malformed EventData: {1}")]
    MalformedEventData(EventId, serde_json::Error),

    /// The destination-chain builder reported an error polling receipt
    /// status.
    #[error("builder error resolving event {0}: {1}")]
    Builder(EventId, uv_signing_verifier::BuilderError),

    /// An `EventStore` operation failed.
    #[error(transparent)]
    EventStore(#[from] uv_event_store::EventStoreError),

    /// A `HostLedgerClient` vote submission failed.
    #[error(transparent)]
    HostLedger(#[from] uv_host_ledger_client::HostLedgerError),
}
