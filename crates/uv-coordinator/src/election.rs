//! Deterministic coordinator election.
//!
//! Reference: spec.md §4.4 — "given a sorted list of eligible validator
//! addresses, index = hash(eventID || epoch) mod len(eligible), where epoch
//! partitions time into windows so that a stuck coordinator is replaced
//! after the session-expiry policy fires."

use sha2::{Digest, Sha256};
use shared_types::Address;

/// Elect exactly one coordinator from `eligible` for `(event_id, epoch)`.
///
/// `eligible` is sorted by the caller before this call (callers hold the
/// canonical ordering; this function does not re-sort, so two nodes given
/// differently-ordered lists would disagree — the coordinator's contract
/// requires a sorted input).
///
/// Returns `None` if `eligible` is empty.
pub fn elect_coordinator<'a>(eligible: &'a [Address], event_id: &str, epoch: u64) -> Option<&'a Address> {
    if eligible.is_empty() {
        return None;
    }
    let mut hasher = Sha256::new();
    hasher.update(event_id.as_bytes());
    hasher.update(epoch.to_be_bytes());
    let digest = hasher.finalize();
    let mut first8 = [0u8; 8];
    first8.copy_from_slice(&digest[..8]);
    let index = (u64::from_be_bytes(first8) % eligible.len() as u64) as usize;
    eligible.get(index)
}

/// The epoch an election for `current_block_height` falls into, given the
/// number of blocks each coordinator window spans.
///
/// Reference: spec.md §4.4 — "epoch partitions time into windows so that a
/// stuck coordinator is replaced after the session-expiry policy fires."
pub fn epoch_for_block_height(current_block_height: u64, window_blocks: u64) -> u64 {
    if window_blocks == 0 {
        return current_block_height;
    }
    current_block_height / window_blocks
}
