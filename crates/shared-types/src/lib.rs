//! # Shared Types
//!
//! Cross-cutting value types shared by every validator subsystem crate:
//! CAIP-2 chain identifiers, the validator registry entry, the `Event` row
//! and its status state machine, and the sign-event payload.
//!
//! Single source of truth for these types — no behavior beyond what the
//! types themselves enforce (status-transition legality, CAIP parsing).
//! The crates that own *behavior* over these types (`uv-event-store`,
//! `uv-coordinator`, ...) depend on this crate, not the reverse.

pub mod chain;
pub mod event;
pub mod validator;

pub use chain::{parse_caip_tx_hash, CaipTxHash, ChainFamily, ChainId, ParseCaipTxHashError};
pub use event::{
    ConfirmationType, Event, EventId, EventStatus, EventType, OutboundCreatedEvent, TxType,
};
pub use validator::{Address, PeerId, Validator};
