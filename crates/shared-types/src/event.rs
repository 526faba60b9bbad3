//! The `Event` row and its associated enums.
//!
//! Reference: spec.md §3 (DATA MODEL) and invariants.

use serde::{Deserialize, Serialize};

use crate::chain::ChainId;

/// Unique identifier for an [`Event`] row.
pub type EventId = String;

/// The kind of TSS ceremony (or observation) an [`Event`] drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    /// Initial distributed key generation.
    Keygen,
    /// Refresh shares for the existing TSS key without changing participants.
    Keyrefresh,
    /// Refresh shares while changing the participant set.
    QuorumChange,
    /// Sign and broadcast an outbound transaction.
    Sign,
}

impl EventType {
    /// `true` for the three key-ceremony types (as opposed to `Sign`).
    pub fn is_key_ceremony(self) -> bool {
        !matches!(self, EventType::Sign)
    }
}

/// How the inbound watcher confirmed this event before inserting it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConfirmationType {
    /// Fast-path confirmation (fewer block confirmations required).
    Fast,
    /// Standard confirmation depth.
    Standard,
}

/// The event status state machine.
///
/// Reference: spec.md §3 invariants:
/// `PENDING → CONFIRMED → IN_PROGRESS → {COMPLETED | BROADCASTED}`;
/// `BROADCASTED → {COMPLETED | REVERTED}`;
/// any non-terminal state may move to `REVERTED` via the sweeper past
/// expiry. `COMPLETED`/`REVERTED` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventStatus {
    /// Newly observed, not yet confirmed by the inbound watcher.
    Pending,
    /// Confirmed and actionable; eligible for session setup or sweeping.
    Confirmed,
    /// A TSS session is actively running for this event.
    InProgress,
    /// Terminal: the ceremony/outbound succeeded.
    Completed,
    /// A signed outbound tx has been submitted to the destination chain.
    Broadcasted,
    /// Terminal: expired, dropped, or reverted; a refund/no-op path taken.
    Reverted,
    /// Success observed via the destination chain's own inbound watcher
    /// (reported out of band from the resolver's polling path).
    Success,
}

impl EventStatus {
    /// `true` for `COMPLETED` and `REVERTED` — no further transition is
    /// permitted once a row reaches one of these.
    pub fn is_terminal(self) -> bool {
        matches!(self, EventStatus::Completed | EventStatus::Reverted)
    }

    /// Whether `self -> next` is an allowed transition per spec.md §3.
    pub fn can_transition_to(self, next: EventStatus) -> bool {
        use EventStatus::*;
        if self.is_terminal() {
            return false;
        }
        match (self, next) {
            (Pending, Confirmed) => true,
            (Confirmed, InProgress) => true,
            (InProgress, Completed) => true,
            (InProgress, Broadcasted) => true,
            (Broadcasted, Completed) => true,
            (Broadcasted, Reverted) => true,
            // The sweeper may revert any non-terminal row once past expiry,
            // and may requeue a PENDING row by re-setting block height
            // (UpdateStatusAndBlockHeight keeps status == Pending).
            (_, Reverted) => true,
            (Pending, Pending) => true,
            (_, Success) => true,
            _ => false,
        }
    }
}

/// A persisted cross-chain action requiring TSS action or observation.
///
/// Reference: spec.md §3.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// Unique identifier.
    pub id: EventId,
    /// Block height at first observation.
    pub block_height: u64,
    /// Block height after which the event is swept as expired.
    pub expiry_block_height: u64,
    /// Key ceremony or sign.
    pub event_type: EventType,
    /// Fast vs standard confirmation depth used by the inbound watcher.
    pub confirmation_type: ConfirmationType,
    /// Current state-machine status.
    pub status: EventStatus,
    /// Opaque JSON-encoded protocol payload (parses as
    /// [`OutboundCreatedEvent`] when `event_type == Sign`).
    pub event_data: Vec<u8>,
    /// CAIP-prefixed destination-chain tx hash, once broadcast.
    pub broadcasted_tx_hash: Option<String>,
    /// Host-ledger vote tx hash, once a vote has been submitted.
    pub vote_tx_hash: Option<String>,
    /// Last error message recorded against this row, if any.
    pub last_error: Option<String>,
    /// Row creation time (Unix seconds).
    pub created_at: i64,
    /// Last update time (Unix seconds).
    pub updated_at: i64,
}

impl Event {
    /// `BlockHeight <= ExpiryBlockHeight`, checked at construction and by
    /// callers before any write that changes either field.
    ///
    /// Reference: spec.md §3 invariants, §8 testable properties.
    pub fn respects_height_invariant(&self) -> bool {
        self.block_height <= self.expiry_block_height
    }
}

/// Supported destination-chain transaction shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TxType {
    /// A plain asset transfer.
    Transfer,
    /// A transfer plus an arbitrary payload for contract execution.
    ContractCall,
}

/// The parsed payload of a `Type=SIGN` event's `EventData`.
///
/// Reference: spec.md §3 — "For Type=SIGN, EventData is parseable as
/// OutboundCreatedEvent{...}".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutboundCreatedEvent {
    /// Source-chain transaction id that created this outbound.
    pub tx_id: String,
    /// Cross-chain universal transaction id (referenced by vote calls).
    pub universal_tx_id: String,
    /// CAIP-2 destination chain.
    pub destination_chain: ChainId,
    /// Sender address on the source chain.
    pub sender: String,
    /// Recipient address on the destination chain.
    pub recipient: String,
    /// Amount to transfer, in the destination chain's base units.
    pub amount: String,
    /// Asset contract address on the destination chain, if not native.
    pub asset_addr: Option<String>,
    /// Arbitrary payload for contract-call outbounds.
    pub payload: Vec<u8>,
    /// Gas limit the destination-chain transaction should carry.
    pub gas_limit: u64,
    /// Transaction shape (plain transfer vs contract call).
    pub tx_type: TxType,
}

impl OutboundCreatedEvent {
    /// Parse from the JSON bytes stored in `Event::event_data`.
    pub fn from_event_data(bytes: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(bytes)
    }

    /// Serialize to the JSON bytes stored in `Event::event_data`.
    pub fn to_event_data(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_dag_matches_spec() {
        use EventStatus::*;
        assert!(Pending.can_transition_to(Confirmed));
        assert!(Confirmed.can_transition_to(InProgress));
        assert!(InProgress.can_transition_to(Completed));
        assert!(InProgress.can_transition_to(Broadcasted));
        assert!(Broadcasted.can_transition_to(Completed));
        assert!(Broadcasted.can_transition_to(Reverted));
        assert!(Confirmed.can_transition_to(Reverted));
        assert!(!Completed.can_transition_to(Broadcasted));
        assert!(!Reverted.can_transition_to(Confirmed));
    }

    #[test]
    fn terminal_states_are_completed_and_reverted() {
        assert!(EventStatus::Completed.is_terminal());
        assert!(EventStatus::Reverted.is_terminal());
        assert!(!EventStatus::Broadcasted.is_terminal());
        assert!(!EventStatus::Pending.is_terminal());
    }

    #[test]
    fn outbound_created_event_roundtrips_through_json() {
        let ev = OutboundCreatedEvent {
            tx_id: "tx-1".to_string(),
            universal_tx_id: "utx-1".to_string(),
            destination_chain: ChainId::new("eip155:1"),
            sender: "0xsender".to_string(),
            recipient: "0xrecipient".to_string(),
            amount: "1000".to_string(),
            asset_addr: None,
            payload: vec![],
            gas_limit: 21000,
            tx_type: TxType::Transfer,
        };
        let bytes = ev.to_event_data().unwrap();
        let parsed = OutboundCreatedEvent::from_event_data(&bytes).unwrap();
        assert_eq!(parsed.tx_id, ev.tx_id);
        assert_eq!(parsed.destination_chain, ev.destination_chain);
    }

    #[test]
    fn height_invariant_holds_and_is_checkable() {
        let ev = Event {
            id: "e1".to_string(),
            block_height: 10,
            expiry_block_height: 20,
            event_type: EventType::Sign,
            confirmation_type: ConfirmationType::Standard,
            status: EventStatus::Pending,
            event_data: vec![],
            broadcasted_tx_hash: None,
            vote_tx_hash: None,
            last_error: None,
            created_at: 0,
            updated_at: 0,
        };
        assert!(ev.respects_height_invariant());
    }
}
