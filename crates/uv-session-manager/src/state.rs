//! Per-event session state.
//!
//! Reference: spec.md §4.3 — "Owns one sessionState{dklsSession,
//! protocolType, coordinatorPeerID, expiryTime, participants,
//! cachedSigningRequest, stepMutex} per active event."

use shared_types::{Address, EventType, PeerId};
use tokio::sync::Mutex as AsyncMutex;

use crate::dkls::DklsSession;

/// The reconstructed unsigned-transaction request cached at setup time for
/// a `SIGN` session, so completion can engage the resolver's broadcast
/// contract without recomputing it.
#[derive(Debug, Clone)]
pub struct CachedSigningRequest {
    /// The raw `OutboundCreatedEvent` JSON this request was built from.
    pub event_data: Vec<u8>,
    /// Gas price the request was built with.
    pub gas_price: u128,
    /// Pre-image hash every participant reproduced independently.
    pub signing_hash: Vec<u8>,
    /// Chain-specific serialized transaction pre-image.
    pub serialized_pre_image: Vec<u8>,
}

/// Fixed metadata for one session, set at construction and never mutated
/// afterward. Separate from the mutable DKLS engine so readers (the step
/// router, the expiry sweep) don't contend with an in-flight `Step()`.
pub struct SessionMeta {
    /// Key ceremony or sign.
    pub protocol_type: EventType,
    /// The peer that proposed this session; only `begin` messages from
    /// this peer are honored.
    pub coordinator_peer_id: PeerId,
    /// Unix-second deadline; past this, the expiry sweep closes the
    /// session and requeues its event.
    pub expiry_time: i64,
    /// Validator addresses participating, in the order the DKLS engine
    /// was constructed with.
    pub participants: Vec<Address>,
    /// Set only for `SIGN` sessions.
    pub cached_signing_request: Option<CachedSigningRequest>,
}

/// A registered session: immutable metadata plus the mutable engine,
/// guarded by its own mutex so `Step()` calls are serialized per-session
/// without blocking unrelated sessions.
///
/// Reference: spec.md §4.3 — "Each session's Step() is serialized by its
/// own mutex."
pub struct SessionHandle {
    /// Immutable session metadata.
    pub meta: SessionMeta,
    /// The session's DKLS engine, plus a flag recording whether `begin`
    /// has been received (a non-driver session must not `Step()` before
    /// then).
    pub engine: AsyncMutex<EngineSlot>,
}

/// The mutable part of a [`SessionHandle`]: the engine itself and whether
/// `begin` has authorized stepping.
pub struct EngineSlot {
    /// The running DKLS engine.
    pub session: Box<dyn DklsSession>,
    /// `false` until a `begin` message arrives from the session's
    /// coordinator.
    pub begun: bool,
    /// `true` once `handleSessionFinished` has run, so a stray late
    /// `finished` report can never trigger it twice.
    pub finished_handled: bool,
}

impl SessionHandle {
    /// Wrap a freshly constructed engine with its metadata.
    pub fn new(meta: SessionMeta, session: Box<dyn DklsSession>) -> Self {
        Self {
            meta,
            engine: AsyncMutex::new(EngineSlot { session, begun: false, finished_handled: false }),
        }
    }
}
