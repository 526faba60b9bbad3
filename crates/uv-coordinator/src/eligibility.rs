//! Per-protocol eligibility rules.
//!
//! Reference: spec.md §4.4 — "Eligibility per protocol: for
//! KEYGEN/KEYREFRESH/QUORUM_CHANGE, all validators flagged eligible by the
//! host ledger; for SIGN, the subset of eligible validators that also hold
//! the current keyshare."

use shared_types::{Address, EventType, Validator};
use std::collections::HashSet;

/// The eligible-validator set for a session of `event_type`, sorted by
/// address (the election function requires a stable, agreed-on ordering).
///
/// `keyshare_holders` is consulted only for `EventType::Sign`; it names the
/// addresses that hold the current TSS keyshare, per §4.4.
pub fn eligible_validators(
    validators: &[Validator],
    event_type: EventType,
    keyshare_holders: &HashSet<Address>,
) -> Vec<Address> {
    let mut eligible: Vec<Address> = match event_type {
        EventType::Sign => validators
            .iter()
            .filter(|v| v.is_keygen_eligible() && keyshare_holders.contains(&v.address))
            .map(|v| v.address.clone())
            .collect(),
        EventType::Keygen | EventType::Keyrefresh | EventType::QuorumChange => {
            validators.iter().filter(|v| v.is_keygen_eligible()).map(|v| v.address.clone()).collect()
        }
    };
    eligible.sort();
    eligible
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::PeerId;

    fn validator(addr: &str, bonded: bool) -> Validator {
        Validator {
            address: addr.to_string(),
            peer_id: PeerId(format!("peer-{addr}")),
            identify_info: String::new(),
            bonded,
            tombstoned: false,
        }
    }

    #[test]
    fn keygen_includes_every_eligible_validator() {
        let validators = vec![validator("a", true), validator("b", true), validator("c", false)];
        let eligible = eligible_validators(&validators, EventType::Keygen, &HashSet::new());
        assert_eq!(eligible, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn sign_requires_both_eligibility_and_keyshare() {
        let validators = vec![validator("a", true), validator("b", true)];
        let mut holders = HashSet::new();
        holders.insert("a".to_string());
        let eligible = eligible_validators(&validators, EventType::Sign, &holders);
        assert_eq!(eligible, vec!["a".to_string()]);
    }

    #[test]
    fn sign_excludes_keyshare_holders_that_are_not_eligible() {
        let validators = vec![validator("a", false)];
        let mut holders = HashSet::new();
        holders.insert("a".to_string());
        let eligible = eligible_validators(&validators, EventType::Sign, &holders);
        assert!(eligible.is_empty());
    }
}
