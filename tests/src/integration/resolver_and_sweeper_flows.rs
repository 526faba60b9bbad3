//! The six end-to-end resolver/sweeper scenarios, run against a real
//! per-chain database opened through `uv-chain-db::ChainDbManager` rather
//! than a bare in-memory connection.

use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex};

use async_trait::async_trait;
use shared_types::{ChainId, ConfirmationType, Event, EventStatus, EventType, OutboundCreatedEvent, TxType, Validator};
use uv_chain_db::ChainDbManager;
use uv_event_store::EventStore;
use uv_host_ledger_client::{HostLedgerClient, HostLedgerError, Observation};
use uv_outbound_resolver::OutboundResolver;
use uv_expiry_sweeper::ExpirySweeper;
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
        unimplemented!("not exercised by these resolver/sweeper scenarios")
    }

    async fn broadcast_outbound_signing_request(
        &self,
        _signing_request: &SigningRequest,
        _outbound_data: &[u8],
        _signature: &[u8],
    ) -> (String, Result<(), BuilderError>) {
        unimplemented!("not exercised by these resolver/sweeper scenarios")
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
        unimplemented!("not exercised by these resolver/sweeper scenarios")
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

/// Opens chain `chain_id` through a real `ChainDbManager` (in-memory
/// sqlite, same code path the node uses on disk) and builds an
/// `EventStore` on top of it.
fn open_chain(manager: &ChainDbManager, chain_id: &ChainId) -> Arc<EventStore> {
    let handle = manager.get_chain_db(chain_id).expect("chain database opens");
    Arc::new(EventStore::new(handle.connection()).expect("event store initializes over the chain handle"))
}

fn broadcasted_sign_event(id: &str, chain: &str, destination_tx_hash: &str) -> Event {
    let outbound = OutboundCreatedEvent {
        tx_id: format!("{id}-tx"),
        universal_tx_id: format!("{id}-utx"),
        destination_chain: ChainId::new(chain),
        sender: "push1sender".to_string(),
        recipient: "0xrecipient".to_string(),
        amount: "100".to_string(),
        asset_addr: None,
        payload: Vec::new(),
        gas_limit: 21_000,
        tx_type: TxType::Transfer,
    };
    Event {
        id: id.to_string(),
        block_height: 1,
        expiry_block_height: 1_000,
        event_type: EventType::Sign,
        confirmation_type: ConfirmationType::Standard,
        status: EventStatus::Broadcasted,
        event_data: outbound.to_event_data().unwrap(),
        broadcasted_tx_hash: Some(format!("{chain}:{destination_tx_hash}")),
        vote_tx_hash: None,
        last_error: None,
        created_at: 0,
        updated_at: 0,
    }
}

fn confirmed_event(id: &str, event_type: EventType, expiry_block_height: u64) -> Event {
    let event_data = if event_type == EventType::Sign {
        OutboundCreatedEvent {
            tx_id: format!("{id}-tx"),
            universal_tx_id: format!("{id}-utx"),
            destination_chain: ChainId::new("eip155:11155111"),
            sender: "push1sender".to_string(),
            recipient: "0xrecipient".to_string(),
            amount: "100".to_string(),
            asset_addr: None,
            payload: Vec::new(),
            gas_limit: 21_000,
            tx_type: TxType::Transfer,
        }
        .to_event_data()
        .unwrap()
    } else {
        Vec::new()
    };
    Event {
        id: id.to_string(),
        block_height: 1,
        expiry_block_height,
        event_type,
        confirmation_type: ConfirmationType::Standard,
        status: EventStatus::Confirmed,
        event_data,
        broadcasted_tx_hash: None,
        vote_tx_hash: None,
        last_error: None,
        created_at: 0,
        updated_at: 0,
    }
}

#[tokio::test]
async fn scenario_1_evm_success_marks_completed() {
    let manager = ChainDbManager::in_memory();
    let chain = ChainId::new("eip155:11155111");
    let store = open_chain(&manager, &chain);
    store.insert_event(&broadcasted_sign_event("evm-ok", chain.as_str(), "0xabc")).unwrap();

    let mut builders = HashMap::new();
    builders.insert(
        chain.as_str().to_string(),
        FixedStatusBuilder(StdMutex::new(BroadcastStatus::Confirmed {
            block_height: 100,
            confirmations: 12,
            success: true,
        })),
    );
    let host_ledger = Arc::new(RecordingHostLedger { votes: StdMutex::new(Vec::new()), fail_votes: false });
    let resolver = OutboundResolver::new(store.clone(), host_ledger, Arc::new(MapRegistry(builders)));

    let summary = resolver.resolve_batch(1_000).await.unwrap();
    assert_eq!(summary.completed, 1);

    // Re-opening the chain database returns the same handle: the write
    // just made is visible without re-fetching a fresh `EventStore`.
    let reopened = open_chain(&manager, &chain);
    assert_eq!(reopened.get_event("evm-ok").unwrap().status, EventStatus::Completed);
}

#[tokio::test]
async fn scenario_2_evm_revert_votes_failure_and_marks_reverted() {
    let manager = ChainDbManager::in_memory();
    let chain = ChainId::new("eip155:11155111");
    let store = open_chain(&manager, &chain);
    store.insert_event(&broadcasted_sign_event("evm-revert", chain.as_str(), "0xabc")).unwrap();

    let mut builders = HashMap::new();
    builders.insert(
        chain.as_str().to_string(),
        FixedStatusBuilder(StdMutex::new(BroadcastStatus::Confirmed {
            block_height: 100,
            confirmations: 12,
            success: false,
        })),
    );
    let host_ledger = Arc::new(RecordingHostLedger { votes: StdMutex::new(Vec::new()), fail_votes: false });
    let resolver = OutboundResolver::new(store.clone(), Arc::clone(&host_ledger), Arc::new(MapRegistry(builders)));

    let summary = resolver.resolve_batch(1_000).await.unwrap();
    assert_eq!(summary.reverted, 1);
    assert_eq!(store.get_event("evm-revert").unwrap().status, EventStatus::Reverted);
    assert_eq!(host_ledger.votes.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn scenario_3_evm_broadcast_never_observed_votes_protocol_drop_after_retry_budget() {
    let manager = ChainDbManager::in_memory();
    let chain = ChainId::new("eip155:11155111");
    let store = open_chain(&manager, &chain);
    store.insert_event(&broadcasted_sign_event("evm-dropped", chain.as_str(), "0xabc")).unwrap();

    let mut builders = HashMap::new();
    builders.insert(chain.as_str().to_string(), FixedStatusBuilder(StdMutex::new(BroadcastStatus::NotFound)));
    let host_ledger = Arc::new(RecordingHostLedger { votes: StdMutex::new(Vec::new()), fail_votes: false });
    let resolver = OutboundResolver::new(store.clone(), Arc::clone(&host_ledger), Arc::new(MapRegistry(builders)))
        .with_max_not_found_retries(3);

    for tick in 1..=2 {
        let summary = resolver.resolve_batch(1_000).await.unwrap();
        assert_eq!(summary.pending, 1, "tick {tick} should still be pending");
        assert_eq!(store.get_event("evm-dropped").unwrap().status, EventStatus::Broadcasted);
    }

    let summary = resolver.resolve_batch(1_000).await.unwrap();
    assert_eq!(summary.reverted, 1);
    let row = store.get_event("evm-dropped").unwrap();
    assert_eq!(row.status, EventStatus::Reverted);
    let votes = host_ledger.votes.lock().unwrap();
    assert_eq!(votes.len(), 1);
    assert!(!votes[0].success);
    assert_eq!(votes[0].tx_hash, "");
}

#[tokio::test]
async fn scenario_4_svm_events_complete_immediately_regardless_of_builder() {
    let manager = ChainDbManager::in_memory();
    let chain = ChainId::new("solana:mainnet");
    let store = open_chain(&manager, &chain);
    store.insert_event(&broadcasted_sign_event("svm-ok", chain.as_str(), "abc123")).unwrap();

    // No builder configured for this chain at all: the SVM path never
    // consults the registry.
    let registry = MapRegistry(HashMap::new());
    let host_ledger = Arc::new(RecordingHostLedger { votes: StdMutex::new(Vec::new()), fail_votes: false });
    let resolver = OutboundResolver::new(store.clone(), host_ledger, Arc::new(registry));

    let summary = resolver.resolve_batch(1_000).await.unwrap();
    assert_eq!(summary.completed, 1);
    assert_eq!(store.get_event("svm-ok").unwrap().status, EventStatus::Completed);
}

#[tokio::test]
async fn scenario_5_expiry_sweep_reverts_a_key_event_directly() {
    let manager = ChainDbManager::in_memory();
    let chain = ChainId::new("eip155:11155111");
    let store = open_chain(&manager, &chain);
    store.insert_event(&confirmed_event("keygen-expired", EventType::Keygen, 100)).unwrap();

    let host_ledger = Arc::new(RecordingHostLedger { votes: StdMutex::new(Vec::new()), fail_votes: false });
    let sweeper = ExpirySweeper::new(store.clone(), Arc::clone(&host_ledger));

    let summary = sweeper.sweep(200, 1_000).await.unwrap();
    assert_eq!(summary.reverted, 1);
    assert_eq!(store.get_event("keygen-expired").unwrap().status, EventStatus::Reverted);
    assert!(host_ledger.votes.lock().unwrap().is_empty(), "key events never vote");
}

#[tokio::test]
async fn scenario_6_expiry_sweep_refunds_a_sign_event_before_reverting() {
    let manager = ChainDbManager::in_memory();
    let chain = ChainId::new("eip155:11155111");
    let store = open_chain(&manager, &chain);
    store.insert_event(&confirmed_event("sign-expired", EventType::Sign, 100)).unwrap();

    let host_ledger = Arc::new(RecordingHostLedger { votes: StdMutex::new(Vec::new()), fail_votes: false });
    let sweeper = ExpirySweeper::new(store.clone(), Arc::clone(&host_ledger));

    let summary = sweeper.sweep(200, 1_000).await.unwrap();
    assert_eq!(summary.reverted, 1);
    let row = store.get_event("sign-expired").unwrap();
    assert_eq!(row.status, EventStatus::Reverted);
    assert_eq!(row.last_error.as_deref(), Some(uv_expiry_sweeper::EXPIRY_ERROR_MSG));

    let votes = host_ledger.votes.lock().unwrap();
    assert_eq!(votes.len(), 1);
    assert!(!votes[0].success);
    assert_eq!(votes[0].block_height, 0);
}
