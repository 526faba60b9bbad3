//! Round-robin-over-endpoints adapter.
//!
//! Reference: spec.md §4.10 — "Implemented over any round-robin-capable
//! RPC to a set of endpoints; connection failures fall through to the
//! next endpoint."

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use shared_types::{ChainId, Validator};

use crate::errors::HostLedgerError;
use crate::observation::Observation;
use crate::ports::HostLedgerClient;

/// Wraps `N` single-endpoint clients and rotates through them, falling
/// through to the next on any RPC error.
///
/// The per-endpoint client is generic (`Arc<dyn HostLedgerClient>`):
/// concrete gRPC wiring is out of scope (spec.md §1), so each endpoint
/// here is itself anything implementing the port — production code
/// supplies real per-endpoint gRPC clients; tests supply fakes.
pub struct RoundRobinHostLedgerClient {
    endpoints: Vec<Arc<dyn HostLedgerClient>>,
    cursor: AtomicUsize,
}

impl RoundRobinHostLedgerClient {
    /// Build a round-robin client over `endpoints`, tried in order
    /// starting from a rotating cursor.
    pub fn new(endpoints: Vec<Arc<dyn HostLedgerClient>>) -> Self {
        Self { endpoints, cursor: AtomicUsize::new(0) }
    }

    async fn try_each<T, F, Fut>(&self, mut call: F) -> Result<T, HostLedgerError>
    where
        F: FnMut(Arc<dyn HostLedgerClient>) -> Fut,
        Fut: std::future::Future<Output = Result<T, HostLedgerError>>,
    {
        if self.endpoints.is_empty() {
            return Err(HostLedgerError::AllEndpointsFailed {
                attempted: 0,
                last_error: "no endpoints configured".to_string(),
            });
        }
        let start = self.cursor.fetch_add(1, Ordering::Relaxed) % self.endpoints.len();
        let mut last_error = String::new();
        for offset in 0..self.endpoints.len() {
            let index = (start + offset) % self.endpoints.len();
            match call(Arc::clone(&self.endpoints[index])).await {
                Ok(value) => return Ok(value),
                Err(err) => {
                    tracing::warn!(endpoint = index, error = %err, "host-ledger endpoint failed, falling through");
                    last_error = err.to_string();
                }
            }
        }
        Err(HostLedgerError::AllEndpointsFailed { attempted: self.endpoints.len(), last_error })
    }
}

#[async_trait]
impl HostLedgerClient for RoundRobinHostLedgerClient {
    async fn get_latest_block_num(&self) -> Result<u64, HostLedgerError> {
        self.try_each(|client| async move { client.get_latest_block_num().await }).await
    }

    async fn get_universal_validators(&self) -> Result<Vec<Validator>, HostLedgerError> {
        self.try_each(|client| async move { client.get_universal_validators().await }).await
    }

    async fn get_current_tss_key(&self) -> Result<(String, Vec<u8>), HostLedgerError> {
        self.try_each(|client| async move { client.get_current_tss_key().await }).await
    }

    async fn get_gas_price(&self, chain_id: &ChainId) -> Result<u128, HostLedgerError> {
        self.try_each(|client| {
            let chain_id = chain_id.clone();
            async move { client.get_gas_price(&chain_id).await }
        })
        .await
    }

    async fn vote_tss_key_process(
        &self,
        public_key: &[u8],
        storage_id: &str,
        process_id: &str,
    ) -> Result<String, HostLedgerError> {
        self.try_each(|client| async move {
            client.vote_tss_key_process(public_key, storage_id, process_id).await
        })
        .await
    }

    async fn vote_outbound(
        &self,
        tx_id: &str,
        universal_tx_id: &str,
        observation: &Observation,
    ) -> Result<String, HostLedgerError> {
        self.try_each(|client| async move {
            client.vote_outbound(tx_id, universal_tx_id, observation).await
        })
        .await
    }
}
