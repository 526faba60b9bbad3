//! Error taxonomy for the coordinator.

use shared_types::PeerId;
use thiserror::Error;

use crate::party_mapping::PartyId;

/// Errors returned by [`crate::Coordinator`] and [`crate::PartyPeerRegistry`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoordinatorError {
    /// No eligible validators for this event/protocol combination.
    #[error("no eligible validators for this session")]
    NoEligibleValidators,

    /// `peer_id` is not in the current validator registry snapshot.
    #[error("peer {0} is not a known validator")]
    UnknownPeer(PeerId),

    /// `address` is not in the current validator registry snapshot.
    #[error("address {0} is not a known validator")]
    UnknownAddress(String),

    /// `party_id` is not in the current validator registry snapshot.
    #[error("party {0:?} is not a known validator")]
    UnknownParty(PartyId),
}
