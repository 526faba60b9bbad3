//! Adapters bridging the node's owned collaborators (builder registry, gas
//! oracle, event store, keyshare directory) to the narrow ports
//! `uv-session-manager` depends on.
//!
//! Concrete chain RPC clients, the DKLS primitive, and keyring encryption
//! are out of scope (spec.md §1) and are supplied by the deployer as
//! `Arc<dyn ...>` values passed into [`crate::node::Node::new`]. The types
//! here only adapt already-built capabilities (`uv-signing-verifier`,
//! filesystem storage) to the ports those capabilities' owning crates
//! don't depend on directly.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use shared_types::OutboundCreatedEvent;
use uv_session_manager::{CachedSigningRequest, KeyshareStore, OutboundBroadcaster, SignSetupVerifier};
use uv_signing_verifier::{BuilderRegistry, GasPriceOracle, SigningVerifier, SigningVerifierConfig};

/// Adapts [`uv_signing_verifier::SigningVerifier`]'s borrowed-registry API
/// to the owned-`Arc` [`SignSetupVerifier`] port, constructing a fresh
/// verifier per call against the live builder registry and gas oracle.
pub struct SigningVerifierAdapter {
    builders: Arc<dyn BuilderRegistry>,
    oracle: Arc<dyn GasPriceOracle>,
    config: SigningVerifierConfig,
}

impl SigningVerifierAdapter {
    /// Wrap a builder registry and gas oracle behind the session manager's
    /// verification port.
    pub fn new(builders: Arc<dyn BuilderRegistry>, oracle: Arc<dyn GasPriceOracle>, config: SigningVerifierConfig) -> Self {
        Self { builders, oracle, config }
    }
}

#[async_trait]
impl SignSetupVerifier for SigningVerifierAdapter {
    async fn verify(
        &self,
        event_data: &[u8],
        gas_price: u128,
        signing_hash: &[u8],
        tss_address: &str,
    ) -> Result<(), String> {
        let verifier = SigningVerifier::new(&*self.builders, &*self.oracle, self.config);
        verifier
            .verify(event_data, gas_price, signing_hash, tss_address)
            .await
            .map_err(|err| err.to_string())
    }
}

/// Engages a destination-chain builder's broadcast call once a `SIGN`
/// session produces a signature, recording the resulting CAIP tx hash on
/// the event row before returning.
///
/// Reference: spec.md §4.6 — "always returns the computed chain-native tx
/// hash even when the broadcast step fails"; the hash is persisted
/// regardless of the broadcast outcome so the resolver's idempotent retry
/// has something to poll.
pub struct OutboundBroadcasterAdapter {
    builders: Arc<dyn BuilderRegistry>,
    event_store: Arc<uv_event_store::EventStore>,
    tss_address: String,
}

impl OutboundBroadcasterAdapter {
    /// Wrap a builder registry and this chain's event store behind the
    /// session manager's broadcast port.
    pub fn new(builders: Arc<dyn BuilderRegistry>, event_store: Arc<uv_event_store::EventStore>, tss_address: String) -> Self {
        Self { builders, event_store, tss_address }
    }
}

#[async_trait]
impl OutboundBroadcaster for OutboundBroadcasterAdapter {
    async fn broadcast(
        &self,
        event_id: &str,
        request: &CachedSigningRequest,
        signature: &[u8],
    ) -> Result<(), String> {
        let outbound = OutboundCreatedEvent::from_event_data(&request.event_data)
            .map_err(|err| format!("cached signing request has malformed EventData: {err}"))?;
        let builder = self
            .builders
            .get(&outbound.destination_chain)
            .ok_or_else(|| format!("no transaction builder configured for {}", outbound.destination_chain))?;

        let signing_request = builder
            .get_outbound_signing_request(&request.event_data, request.gas_price, &self.tss_address)
            .await
            .map_err(|err| err.to_string())?;

        let (tx_hash, result) = builder
            .broadcast_outbound_signing_request(&signing_request, &request.event_data, signature)
            .await;

        let caip_hash = format!("{}:{}", outbound.destination_chain, tx_hash);
        let now = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs() as i64;
        if let Err(err) = self.event_store.update_broadcasted_tx_hash(event_id, &caip_hash, now) {
            tracing::error!(event_id, error = %err, "failed to persist broadcasted tx hash");
        }

        result.map_err(|err| err.to_string())
    }
}

/// Plaintext on-disk keyshare store.
///
/// Reference: spec.md §4.3 — "the resulting keyshare is stored under
/// SHA-256(eventID)." Encrypted-at-rest storage via the configured keyring
/// backend is out of scope (§1); this adapter is the development-grade
/// (`KeyringBackend::Test`) fallback.
pub struct FileKeyshareStore {
    base_dir: PathBuf,
}

impl FileKeyshareStore {
    /// Store keyshares under `base_dir/keyshares/<storage_id>.bin`.
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self { base_dir: base_dir.into() }
    }

    fn path_for(&self, storage_id: &str) -> PathBuf {
        self.base_dir.join("keyshares").join(format!("{storage_id}.bin"))
    }
}

impl KeyshareStore for FileKeyshareStore {
    fn store(&self, storage_id: &str, keyshare: &[u8]) -> Result<(), String> {
        let path = self.path_for(storage_id);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|err| err.to_string())?;
        }
        std::fs::write(&path, keyshare).map_err(|err| err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_keyshare_store_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileKeyshareStore::new(dir.path());
        store.store("abc123", b"keyshare-bytes").unwrap();
        let read_back = std::fs::read(dir.path().join("keyshares").join("abc123.bin")).unwrap();
        assert_eq!(read_back, b"keyshare-bytes");
    }
}
