//! The peer wire message envelope.
//!
//! Reference: spec.md §6.1 — "JSON, UTF-8, one logical message per
//! delivery. Fields: Type (setup|begin|ack|step), EventID, Payload (bytes,
//! base64 in JSON), Participants, UnSignedOutboundTxReq."

use serde::{Deserialize, Serialize};
use shared_types::Address;

/// The four message kinds exchanged during a TSS session.
///
/// Reference: spec.md §6.1, §4.3 setup/step flows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    /// Coordinator → participant: proposes a new session.
    Setup,
    /// Coordinator → participant: authorizes `Step()` to begin.
    Begin,
    /// Participant → coordinator: setup accepted.
    Ack,
    /// Any participant → any participant: a DKLS protocol step payload.
    Step,
}

/// The unsigned outbound transaction request carried on a `setup` message
/// for `Type=SIGN` sessions.
///
/// Reference: spec.md §6.1, §6.4.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnsignedOutboundTxReq {
    /// Gas price the coordinator computed the request with.
    pub gas_price: u128,
    /// Nonce (or chain-equivalent sequencing field).
    pub nonce: u64,
    /// The pre-image hash every participant must independently reproduce.
    #[serde(with = "base64_bytes")]
    pub signing_hash: Vec<u8>,
    /// The chain-specific serialized transaction pre-image.
    #[serde(with = "base64_bytes")]
    pub serialized_pre_image: Vec<u8>,
}

/// One wire message exchanged over the peer transport.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireMessage {
    /// Message kind.
    #[serde(rename = "Type")]
    pub msg_type: MessageType,
    /// Event this message belongs to.
    #[serde(rename = "EventID")]
    pub event_id: String,
    /// Opaque protocol payload (DKLS bytes for `step`; empty otherwise).
    #[serde(rename = "Payload", with = "base64_bytes")]
    pub payload: Vec<u8>,
    /// Validator addresses participating in the session. Non-empty only on
    /// `setup`.
    #[serde(rename = "Participants", default)]
    pub participants: Vec<Address>,
    /// Present only on `setup` for `Type=SIGN` sessions.
    #[serde(rename = "UnSignedOutboundTxReq", skip_serializing_if = "Option::is_none", default)]
    pub unsigned_outbound_tx_req: Option<UnsignedOutboundTxReq>,
}

mod base64_bytes {
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&base64::engine::general_purpose::STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        base64::engine::general_purpose::STANDARD.decode(&s).map_err(serde::de::Error::custom)
    }
}
