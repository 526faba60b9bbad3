//! Error taxonomy for the session manager.

use shared_types::{EventId, PeerId};
use thiserror::Error;

/// Errors raised while driving the setup/step/begin flow or a DKLS engine.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The event named by a `setup`/`step`/`begin` message is unknown.
    #[error("event {0} not found")]
    UnknownEvent(EventId),

    /// The sender of a `setup` message is not the elected coordinator for
    /// this event at the current block height.
    #[error("peer {0} is not the elected coordinator for event {1}")]
    NotCoordinator(PeerId, EventId),

    /// The participant list on a `setup` message violates the per-protocol
    /// cardinality rule, or names an ineligible validator.
    #[error("invalid participant set for event {0}: {1}")]
    InvalidParticipants(EventId, String),

    /// `Type=SIGN` independent verification (spec.md §4.5) rejected the
    /// request.
    #[error("signing request verification failed for event {0}: {1}")]
    SigningVerificationFailed(EventId, String),

    /// A `step`/`begin` message named a session that has not been set up.
    #[error("no session registered for event {0}")]
    SessionNotFound(EventId),

    /// A `step` message's sender did not map to a participant of this
    /// session.
    #[error("peer {0} is not a participant of event {1}")]
    NotAParticipant(PeerId, EventId),

    /// `begin` arrived from a peer other than the one that sent `setup`.
    #[error("begin for event {0} did not come from the session's coordinator")]
    BeginFromWrongCoordinator(EventId),

    /// The underlying DKLS engine reported an error.
    #[error("DKLS engine error for event {0}: {1}")]
    Dkls(EventId, String),

    /// A party/peer lookup failed.
    #[error(transparent)]
    Coordinator(#[from] uv_coordinator::CoordinatorError),

    /// An `EventStore` operation failed.
    #[error(transparent)]
    EventStore(#[from] uv_event_store::EventStoreError),

    /// A `HostLedgerClient` vote submission failed.
    #[error(transparent)]
    HostLedger(#[from] uv_host_ledger_client::HostLedgerError),

    /// Sending a message over the peer transport failed.
    #[error(transparent)]
    Transport(#[from] uv_peer_transport::TransportError),
}
