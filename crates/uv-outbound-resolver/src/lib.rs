//! Destination-chain receipt polling, completion classification, and
//! failure-vote refunds for `BROADCASTED` sign events.
//!
//! Reference: spec.md §4.6.

mod errors;
mod resolver;
mod scheduler;
mod tracker;

pub use errors::ResolverError;
pub use resolver::{OutboundResolver, Outcome, ResolveSummary, DEFAULT_BATCH_SIZE};
pub use scheduler::{spawn_resolver_loop, DEFAULT_CHECK_INTERVAL};
pub use tracker::{NotFoundTracker, DEFAULT_MAX_NOT_FOUND_RETRIES};

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use rusqlite::Connection;
    use shared_types::{
        ChainId, ConfirmationType, Event, EventStatus, EventType, OutboundCreatedEvent, TxType, Validator,
    };
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex as StdMutex};
    use uv_event_store::EventStore;
    use uv_host_ledger_client::{HostLedgerClient, HostLedgerError, Observation};
    use uv_signing_verifier::{BroadcastStatus, BuilderError, BuilderRegistry, SigningRequest, TransactionBuilder};

    struct FixedStatusBuilder(StdMutex<BroadcastStatus>);

    #[async_trait]
    impl TransactionBuilder for FixedStatusBuilder {
        async fn get_outbound_signing_request(
            &self,
            _outbound_data: &[u8],
            _gas_price: u128,
            _tss_address: &str,
        ) -> Result<SigningRequest, BuilderError> {
            unimplemented!()
        }

        async fn broadcast_outbound_signing_request(
            &self,
            _signing_request: &SigningRequest,
            _outbound_data: &[u8],
            _signature: &[u8],
        ) -> (String, Result<(), BuilderError>) {
            unimplemented!()
        }

        async fn verify_broadcasted_tx(&self, _tx_hash: &str) -> Result<BroadcastStatus, BuilderError> {
            Ok(*self.0.lock().unwrap())
        }
    }

    struct MapRegistry(HashMap<String, FixedStatusBuilder>);
    impl BuilderRegistry for MapRegistry {
        fn get(&self, chain_id: &ChainId) -> Option<&dyn TransactionBuilder> {
            self.0.get(chain_id.as_str()).map(|b| b as &dyn TransactionBuilder)
        }
    }

    struct RecordingHostLedger {
        votes: StdMutex<Vec<Observation>>,
        fail_votes: bool,
    }
    #[async_trait]
    impl HostLedgerClient for RecordingHostLedger {
        async fn get_latest_block_num(&self) -> Result<u64, HostLedgerError> {
            Ok(0)
        }
        async fn get_universal_validators(&self) -> Result<Vec<Validator>, HostLedgerError> {
            Ok(Vec::new())
        }
        async fn get_current_tss_key(&self) -> Result<(String, Vec<u8>), HostLedgerError> {
            Ok((String::new(), Vec::new()))
        }
        async fn get_gas_price(&self, _chain_id: &ChainId) -> Result<u128, HostLedgerError> {
            Ok(0)
        }
        async fn vote_tss_key_process(
            &self,
            _public_key: &[u8],
            _storage_id: &str,
            _process_id: &str,
        ) -> Result<String, HostLedgerError> {
            unimplemented!()
        }
        async fn vote_outbound(
            &self,
            _tx_id: &str,
            _universal_tx_id: &str,
            observation: &Observation,
        ) -> Result<String, HostLedgerError> {
            if self.fail_votes {
                return Err(HostLedgerError::Rpc("host ledger unreachable".to_string()));
            }
            self.votes.lock().unwrap().push(observation.clone());
            Ok("0xvote".to_string())
        }
    }

    fn event_store() -> Arc<EventStore> {
        let conn = Arc::new(std::sync::Mutex::new(Connection::open_in_memory().unwrap()));
        Arc::new(EventStore::new(conn).unwrap())
    }

    fn broadcasted_sign_event(id: &str, chain: &str, destination: &str) -> Event {
        let outbound = OutboundCreatedEvent {
            tx_id: format!("{id}-tx"),
            universal_tx_id: format!("{id}-utx"),
            destination_chain: ChainId::new(chain),
            sender: "0xsender".to_string(),
            recipient: "0xrecipient".to_string(),
            amount: "100".to_string(),
            asset_addr: None,
            payload: Vec::new(),
            gas_limit: 21000,
            tx_type: TxType::Transfer,
        };
        Event {
            id: id.to_string(),
            block_height: 1,
            expiry_block_height: 1000,
            event_type: EventType::Sign,
            confirmation_type: ConfirmationType::Standard,
            status: EventStatus::Broadcasted,
            event_data: outbound.to_event_data().unwrap(),
            broadcasted_tx_hash: Some(format!("{chain}:{destination}")),
            vote_tx_hash: None,
            last_error: None,
            created_at: 0,
            updated_at: 0,
        }
    }

    #[tokio::test]
    async fn svm_events_complete_immediately() {
        let store = event_store();
        store.insert_event(&broadcasted_sign_event("sign-1", "solana:mainnet", "abc")).unwrap();
        let registry = MapRegistry(HashMap::new());
        let host_ledger = RecordingHostLedger { votes: StdMutex::new(Vec::new()), fail_votes: false };
        let resolver = OutboundResolver::new(store.clone(), Arc::new(host_ledger), Arc::new(registry));

        let summary = resolver.resolve_batch(1_000).await.unwrap();
        assert_eq!(summary.completed, 1);
        assert_eq!(store.get_event("sign-1").unwrap().status, EventStatus::Completed);
    }

    #[tokio::test]
    async fn evm_success_marks_completed() {
        let store = event_store();
        store.insert_event(&broadcasted_sign_event("sign-2", "eip155:1", "0xabc")).unwrap();
        let mut builders = HashMap::new();
        builders.insert(
            "eip155:1".to_string(),
            FixedStatusBuilder(StdMutex::new(BroadcastStatus::Confirmed {
                block_height: 100,
                confirmations: 12,
                success: true,
            })),
        );
        let host_ledger = RecordingHostLedger { votes: StdMutex::new(Vec::new()), fail_votes: false };
        let resolver =
            OutboundResolver::new(store.clone(), Arc::new(host_ledger), Arc::new(MapRegistry(builders)));

        let summary = resolver.resolve_batch(1_000).await.unwrap();
        assert_eq!(summary.completed, 1);
        assert_eq!(store.get_event("sign-2").unwrap().status, EventStatus::Completed);
    }

    #[tokio::test]
    async fn evm_revert_votes_failure_and_marks_reverted() {
        let store = event_store();
        store.insert_event(&broadcasted_sign_event("sign-3", "eip155:1", "0xabc")).unwrap();
        let mut builders = HashMap::new();
        builders.insert(
            "eip155:1".to_string(),
            FixedStatusBuilder(StdMutex::new(BroadcastStatus::Confirmed {
                block_height: 100,
                confirmations: 12,
                success: false,
            })),
        );
        let host_ledger = RecordingHostLedger { votes: StdMutex::new(Vec::new()), fail_votes: false };
        let resolver =
            OutboundResolver::new(store.clone(), Arc::new(host_ledger), Arc::new(MapRegistry(builders)));

        let summary = resolver.resolve_batch(1_000).await.unwrap();
        assert_eq!(summary.reverted, 1);
        assert_eq!(store.get_event("sign-3").unwrap().status, EventStatus::Reverted);
    }

    #[tokio::test]
    async fn evm_pending_confirmations_leaves_the_event_broadcasted() {
        let store = event_store();
        store.insert_event(&broadcasted_sign_event("sign-4", "eip155:1", "0xabc")).unwrap();
        let mut builders = HashMap::new();
        builders.insert(
            "eip155:1".to_string(),
            FixedStatusBuilder(StdMutex::new(BroadcastStatus::Pending { block_height: 100, confirmations: 1 })),
        );
        let host_ledger = RecordingHostLedger { votes: StdMutex::new(Vec::new()), fail_votes: false };
        let resolver =
            OutboundResolver::new(store.clone(), Arc::new(host_ledger), Arc::new(MapRegistry(builders)));

        let summary = resolver.resolve_batch(1_000).await.unwrap();
        assert_eq!(summary.pending, 1);
        assert_eq!(store.get_event("sign-4").unwrap().status, EventStatus::Broadcasted);
    }

    #[tokio::test]
    async fn not_found_votes_protocol_drop_only_after_the_retry_budget() {
        let store = event_store();
        store.insert_event(&broadcasted_sign_event("sign-5", "eip155:1", "0xabc")).unwrap();
        let mut builders = HashMap::new();
        builders.insert(
            "eip155:1".to_string(),
            FixedStatusBuilder(StdMutex::new(BroadcastStatus::NotFound)),
        );
        let host_ledger = RecordingHostLedger { votes: StdMutex::new(Vec::new()), fail_votes: false };
        let resolver = OutboundResolver::new(store.clone(), Arc::new(host_ledger), Arc::new(MapRegistry(builders)))
            .with_max_not_found_retries(3);

        for _ in 0..2 {
            let summary = resolver.resolve_batch(1_000).await.unwrap();
            assert_eq!(summary.pending, 1);
            assert_eq!(store.get_event("sign-5").unwrap().status, EventStatus::Broadcasted);
        }

        let summary = resolver.resolve_batch(1_000).await.unwrap();
        assert_eq!(summary.reverted, 1);
        assert_eq!(store.get_event("sign-5").unwrap().status, EventStatus::Reverted);
    }

    #[tokio::test]
    async fn failed_failure_vote_leaves_event_broadcasted_for_retry() {
        let store = event_store();
        store.insert_event(&broadcasted_sign_event("sign-6", "eip155:1", "0xabc")).unwrap();
        let mut builders = HashMap::new();
        builders.insert(
            "eip155:1".to_string(),
            FixedStatusBuilder(StdMutex::new(BroadcastStatus::Confirmed {
                block_height: 100,
                confirmations: 12,
                success: false,
            })),
        );
        let host_ledger = RecordingHostLedger { votes: StdMutex::new(Vec::new()), fail_votes: true };
        let resolver =
            OutboundResolver::new(store.clone(), Arc::new(host_ledger), Arc::new(MapRegistry(builders)));

        let summary = resolver.resolve_batch(1_000).await.unwrap();
        assert_eq!(summary.pending, 1);
        assert_eq!(store.get_event("sign-6").unwrap().status, EventStatus::Broadcasted);
    }
}
