//! Validator registry types.
//!
//! Reference: spec.md §4.10 (`GetUniversalValidators`) and GLOSSARY
//! ("Party-ID / Peer-ID").

use serde::{Deserialize, Serialize};

/// The on-ledger address of a validator (bech32-style string, left opaque
/// here — the host-ledger client is the only component that needs to know
/// its encoding).
pub type Address = String;

/// The network-layer identity of a peer, as resolved by the transport.
///
/// Reference: spec.md GLOSSARY — "Party-ID / Peer-ID: the on-ledger
/// validator address vs the network-layer peer identity; a bijection
/// maintained by the coordinator."
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PeerId(pub String);

impl std::fmt::Display for PeerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A validator as advertised by the host ledger.
///
/// Reference: spec.md §4.10 — `Validator{address, peerID, identifyInfo,
/// bonded, tombstoned}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Validator {
    /// On-ledger validator address.
    pub address: Address,
    /// Network-layer peer identity.
    pub peer_id: PeerId,
    /// Free-form identification metadata (moniker, website, etc.).
    pub identify_info: String,
    /// Whether the validator currently has bonded stake.
    pub bonded: bool,
    /// Whether the validator has been tombstoned (permanently excluded).
    pub tombstoned: bool,
}

impl Validator {
    /// Eligibility for `KEYGEN`/`KEYREFRESH`/`QUORUM_CHANGE` sessions.
    ///
    /// Reference: spec.md §4.4 — "for KEYGEN/KEYREFRESH/QUORUM_CHANGE, all
    /// validators flagged eligible by the host ledger."
    pub fn is_keygen_eligible(&self) -> bool {
        self.bonded && !self.tombstoned
    }
}
