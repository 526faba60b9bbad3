//! Ties together election, eligibility, and party/peer resolution into the
//! coordinator service.
//!
//! Reference: spec.md §4.4.

use std::collections::HashSet;

use shared_types::{Address, EventType, PeerId, Validator};

use crate::eligibility::eligible_validators;
use crate::election::{elect_coordinator, epoch_for_block_height};
use crate::errors::CoordinatorError;
use crate::party_mapping::{PartyId, PartyPeerRegistry};
use crate::threshold::calculate_threshold;

/// Default coordinator window, in blocks, before a new epoch is elected.
///
/// Chosen to match the default session expiry policy (§4.3's "a stuck
/// coordinator is replaced after the session-expiry policy fires").
pub const DEFAULT_EPOCH_WINDOW_BLOCKS: u64 = 30;

/// Elects coordinators and resolves party/peer identities.
///
/// Reference: spec.md §3 — this is the only component permitted to
/// maintain the party-ID / peer-ID bijection (GLOSSARY).
pub struct Coordinator {
    registry: PartyPeerRegistry,
    epoch_window_blocks: u64,
}

impl Coordinator {
    /// Construct a coordinator with the default epoch window.
    pub fn new() -> Self {
        Self { registry: PartyPeerRegistry::new(), epoch_window_blocks: DEFAULT_EPOCH_WINDOW_BLOCKS }
    }

    /// Construct a coordinator with a custom epoch window, in blocks.
    pub fn with_epoch_window(epoch_window_blocks: u64) -> Self {
        Self { registry: PartyPeerRegistry::new(), epoch_window_blocks }
    }

    /// Refresh the cached validator registry (call after each
    /// `GetUniversalValidators` poll).
    pub fn refresh_validators(&self, validators: &[Validator]) {
        self.registry.refresh(validators);
    }

    /// Elect the coordinator for `event_id` at `current_block_height`.
    pub fn elect(
        &self,
        validators: &[Validator],
        event_type: EventType,
        event_id: &str,
        current_block_height: u64,
        keyshare_holders: &HashSet<Address>,
    ) -> Result<Address, CoordinatorError> {
        let eligible = eligible_validators(validators, event_type, keyshare_holders);
        let epoch = epoch_for_block_height(current_block_height, self.epoch_window_blocks);
        elect_coordinator(&eligible, event_id, epoch)
            .cloned()
            .ok_or(CoordinatorError::NoEligibleValidators)
    }

    /// `IsPeerCoordinator(peerID)` — resolves the peer to a validator
    /// address and compares it to the elected one.
    pub fn is_peer_coordinator(
        &self,
        peer_id: &PeerId,
        validators: &[Validator],
        event_type: EventType,
        event_id: &str,
        current_block_height: u64,
        keyshare_holders: &HashSet<Address>,
    ) -> Result<bool, CoordinatorError> {
        let address = self.registry.address_from_peer(peer_id)?;
        let elected = self.elect(validators, event_type, event_id, current_block_height, keyshare_holders)?;
        Ok(address == elected)
    }

    /// `GetPartyIDFromPeerID`.
    pub fn party_id_from_peer(&self, peer_id: &PeerId) -> Result<PartyId, CoordinatorError> {
        self.registry.party_id_from_peer(peer_id)
    }

    /// Resolve a peer-ID to its validator address.
    pub fn address_from_peer(&self, peer_id: &PeerId) -> Result<Address, CoordinatorError> {
        self.registry.address_from_peer(peer_id)
    }

    /// Resolve a validator address to its peer-ID.
    pub fn peer_from_address(&self, address: &str) -> Result<PeerId, CoordinatorError> {
        self.registry.peer_from_address(address)
    }

    /// `GetPeerIDFromPartyID`.
    pub fn peer_id_from_party(&self, party_id: PartyId) -> Result<PeerId, CoordinatorError> {
        self.registry.peer_id_from_party(party_id)
    }

    /// `CalculateThreshold(n)`.
    pub fn threshold(&self, n: u64) -> u64 {
        calculate_threshold(n)
    }
}

impl Default for Coordinator {
    fn default() -> Self {
        Self::new()
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
    fn is_peer_coordinator_agrees_with_elect() {
        let coordinator = Coordinator::new();
        let validators = vec![validator("a", "peer-a"), validator("b", "peer-b"), validator("c", "peer-c")];
        coordinator.refresh_validators(&validators);

        let elected =
            coordinator.elect(&validators, EventType::Keygen, "event-1", 0, &HashSet::new()).unwrap();
        let elected_peer = validators.iter().find(|v| v.address == elected).unwrap().peer_id.clone();

        assert!(coordinator
            .is_peer_coordinator(&elected_peer, &validators, EventType::Keygen, "event-1", 0, &HashSet::new())
            .unwrap());

        let other_peer = validators
            .iter()
            .find(|v| v.address != elected)
            .unwrap()
            .peer_id
            .clone();
        assert!(!coordinator
            .is_peer_coordinator(&other_peer, &validators, EventType::Keygen, "event-1", 0, &HashSet::new())
            .unwrap());
    }

    #[test]
    fn election_requires_at_least_one_eligible_validator() {
        let coordinator = Coordinator::new();
        let result = coordinator.elect(&[], EventType::Keygen, "event-1", 0, &HashSet::new());
        assert_eq!(result, Err(CoordinatorError::NoEligibleValidators));
    }

    #[test]
    fn stuck_coordinator_rotates_across_epoch_windows() {
        let coordinator = Coordinator::with_epoch_window(10);
        let validators: Vec<Validator> =
            (0..5).map(|i| validator(&format!("addr-{i}"), &format!("peer-{i}"))).collect();

        let mut seen = HashSet::new();
        for block in (0u64..500).step_by(10) {
            let elected =
                coordinator.elect(&validators, EventType::Keygen, "stuck-event", block, &HashSet::new()).unwrap();
            seen.insert(elected);
        }
        assert!(seen.len() > 1);
    }
}
