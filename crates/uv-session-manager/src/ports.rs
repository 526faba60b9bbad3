//! Outbound ports the session manager depends on but does not implement.

use async_trait::async_trait;

use crate::state::CachedSigningRequest;

/// Independently verifies a `SIGN` session's setup request.
///
/// Reference: spec.md §4.3 step 5 / §4.5. Kept as a narrow injected port
/// rather than depending on `uv-signing-verifier`'s borrowed-registry API
/// directly, so the session manager can hold it as an owned `Arc`
/// alongside its other collaborators. Production wiring's adapter
/// constructs a real `uv_signing_verifier::SigningVerifier` per call
/// against the live builder registry and gas oracle.
#[async_trait]
pub trait SignSetupVerifier: Send + Sync {
    /// Verify `event_data` against the coordinator's proposed
    /// `gas_price`/`signing_hash`, for `tss_address`.
    async fn verify(
        &self,
        event_data: &[u8],
        gas_price: u128,
        signing_hash: &[u8],
        tss_address: &str,
    ) -> Result<(), String>;
}

/// Persists a completed key-ceremony's keyshare under its storage ID.
///
/// Reference: spec.md §4.3 — "the resulting keyshare is stored under
/// SHA-256(eventID)." Storage medium (disk, HSM, ...) is out of scope
/// (§1); this port only names the capability.
pub trait KeyshareStore: Send + Sync {
    /// Store `keyshare` under `storage_id` (hex-encoded SHA-256 of the
    /// event ID).
    fn store(&self, storage_id: &str, keyshare: &[u8]) -> Result<(), String>;
}

/// Engages the resolver's broadcast contract once a `SIGN` session
/// produces a signature.
///
/// Reference: spec.md §4.3 — "the signature ... is combined with the
/// cached signing request and the resolver's broadcast contract (§4.6) is
/// engaged. Every participant attempts to broadcast for redundancy." The
/// resolver itself is a separate subsystem (`uv-outbound-resolver`); this
/// port is the seam so this crate never depends on it directly.
#[async_trait]
pub trait OutboundBroadcaster: Send + Sync {
    /// Broadcast the signed outbound transaction for `event_id`.
    async fn broadcast(
        &self,
        event_id: &str,
        request: &CachedSigningRequest,
        signature: &[u8],
    ) -> Result<(), String>;
}
