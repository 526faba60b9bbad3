//! Bijective party-ID / peer-ID mapping.
//!
//! Reference: spec.md §4.4 — "GetPartyIDFromPeerID, GetPeerIDFromPartyID:
//! bijective mapping cached from the host ledger's validator registry."
//! and GLOSSARY — "Party-ID / Peer-ID: the on-ledger validator address vs
//! the network-layer peer identity; a bijection maintained by the
//! coordinator."

use std::collections::HashMap;

use parking_lot::RwLock;
use shared_types::{Address, PeerId, Validator};

use crate::errors::CoordinatorError;

/// A TSS party index, assigned by sorted position in the eligible set at
/// the time the registry was last refreshed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PartyId(pub u32);

/// Caches the bijection between peer-IDs (network identity) and validator
/// addresses, refreshed from the host ledger's validator registry.
#[derive(Default)]
pub struct PartyPeerRegistry {
    inner: RwLock<Inner>,
}

#[derive(Default)]
struct Inner {
    peer_to_address: HashMap<PeerId, Address>,
    address_to_peer: HashMap<Address, PeerId>,
    address_to_party: HashMap<Address, PartyId>,
    party_to_address: HashMap<PartyId, Address>,
}

impl PartyPeerRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild the bijection from the host ledger's current validator list.
    /// Party IDs are assigned by address sort order, which both the
    /// election and the DKLS session construction rely on being stable.
    pub fn refresh(&self, validators: &[Validator]) {
        let mut sorted: Vec<&Validator> = validators.iter().collect();
        sorted.sort_by(|a, b| a.address.cmp(&b.address));

        let mut inner = Inner::default();
        for (index, validator) in sorted.into_iter().enumerate() {
            let party_id = PartyId(index as u32);
            inner.peer_to_address.insert(validator.peer_id.clone(), validator.address.clone());
            inner.address_to_peer.insert(validator.address.clone(), validator.peer_id.clone());
            inner.address_to_party.insert(validator.address.clone(), party_id);
            inner.party_to_address.insert(party_id, validator.address.clone());
        }
        *self.inner.write() = inner;
    }

    /// Resolve a peer-ID to its validator address.
    pub fn address_from_peer(&self, peer_id: &PeerId) -> Result<Address, CoordinatorError> {
        self.inner
            .read()
            .peer_to_address
            .get(peer_id)
            .cloned()
            .ok_or_else(|| CoordinatorError::UnknownPeer(peer_id.clone()))
    }

    /// Resolve a validator address to its peer-ID.
    pub fn peer_from_address(&self, address: &str) -> Result<PeerId, CoordinatorError> {
        self.inner
            .read()
            .address_to_peer
            .get(address)
            .cloned()
            .ok_or_else(|| CoordinatorError::UnknownAddress(address.to_string()))
    }

    /// `GetPartyIDFromPeerID`.
    pub fn party_id_from_peer(&self, peer_id: &PeerId) -> Result<PartyId, CoordinatorError> {
        let inner = self.inner.read();
        let address = inner
            .peer_to_address
            .get(peer_id)
            .ok_or_else(|| CoordinatorError::UnknownPeer(peer_id.clone()))?;
        inner
            .address_to_party
            .get(address)
            .copied()
            .ok_or_else(|| CoordinatorError::UnknownPeer(peer_id.clone()))
    }

    /// `GetPeerIDFromPartyID`.
    pub fn peer_id_from_party(&self, party_id: PartyId) -> Result<PeerId, CoordinatorError> {
        let inner = self.inner.read();
        let address = inner
            .party_to_address
            .get(&party_id)
            .ok_or(CoordinatorError::UnknownParty(party_id))?;
        inner.address_to_peer.get(address).cloned().ok_or(CoordinatorError::UnknownParty(party_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validator(addr: &str, peer: &str) -> Validator {
        Validator {
            address: addr.to_string(),
            peer_id: PeerId(peer.to_string()),
            identify_info: String::new(),
            bonded: true,
            tombstoned: false,
        }
    }

    #[test]
    fn mapping_is_bijective_after_refresh() {
        let registry = PartyPeerRegistry::new();
        registry.refresh(&[validator("addr-b", "peer-b"), validator("addr-a", "peer-a")]);

        let party_a = registry.party_id_from_peer(&PeerId("peer-a".to_string())).unwrap();
        assert_eq!(party_a, PartyId(0));
        assert_eq!(registry.peer_id_from_party(party_a).unwrap(), PeerId("peer-a".to_string()));
        assert_eq!(registry.address_from_peer(&PeerId("peer-a".to_string())).unwrap(), "addr-a");
        assert_eq!(registry.peer_from_address("addr-a").unwrap(), PeerId("peer-a".to_string()));
    }

    #[test]
    fn unknown_peer_is_an_error() {
        let registry = PartyPeerRegistry::new();
        registry.refresh(&[validator("addr-a", "peer-a")]);
        assert!(matches!(
            registry.address_from_peer(&PeerId("peer-ghost".to_string())),
            Err(CoordinatorError::UnknownPeer(_))
        ));
    }

    #[test]
    fn refresh_replaces_the_previous_mapping() {
        let registry = PartyPeerRegistry::new();
        registry.refresh(&[validator("addr-a", "peer-a")]);
        registry.refresh(&[validator("addr-b", "peer-b")]);
        assert!(registry.address_from_peer(&PeerId("peer-a".to_string())).is_err());
        assert!(registry.address_from_peer(&PeerId("peer-b".to_string())).is_ok());
    }
}
