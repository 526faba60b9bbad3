//! Wires per-chain subsystems together over the node's owned and injected
//! collaborators, and dispatches inbound protocol messages to the chain
//! whose event they belong to.
//!
//! Reference: spec.md §6 (node composition). The host-ledger client, peer
//! transport, DKLS engine, and destination-chain builders/gas oracle are
//! out of scope (§1) and arrive here as constructor-injected `Arc<dyn
//! ...>` values rather than concrete adapters.
//!
//! Routing a `setup`/`begin`/`step` message to the chain runtime that owns
//! its event is a one-to-one lookup, not a broadcast: [`Node::dispatch_inbound`]
//! dispatches straight to that runtime's session manager. Session-lifecycle
//! observability (a message arrived, a session started, a session failed, a
//! message that matched no open chain) is published onto a
//! [`shared_bus::InMemoryEventBus`] instead, so anything that wants to watch
//! the node's protocol traffic — telemetry, a dead-letter consumer — can
//! subscribe without the dispatch path calling into it directly.

use std::collections::HashMap;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use parking_lot::{Mutex, RwLock};
use shared_bus::{EventPublisher, InMemoryEventBus, ValidatorEvent};
use shared_types::{Address, ChainId, PeerId, Validator};
use tokio::task::JoinHandle;
use uv_chain_db::{ChainDbManager, CleanupSchedule, PerChainCleaner};
use uv_coordinator::Coordinator;
use uv_event_store::EventStore;
use uv_expiry_sweeper::ExpirySweeper;
use uv_host_ledger_client::HostLedgerClient;
use uv_outbound_resolver::OutboundResolver;
use uv_peer_transport::{PeerTransport, WireMessage};
use uv_session_manager::{DklsSessionFactory, SessionError, SessionManager, SessionManagerConfig};
use uv_signing_verifier::{BuilderRegistry, GasPriceOracle, SigningVerifierConfig};

use crate::adapters::{FileKeyshareStore, OutboundBroadcasterAdapter, SigningVerifierAdapter};
use crate::config::ValidatorConfig;
use crate::errors::NodeError;

/// The capability ports this crate does not implement.
///
/// Reference: spec.md §1 — "host ledger consensus, chain RPC clients, the
/// DKLS primitive, ... are out of scope." Supplied by the deployer at
/// process startup.
pub struct NodeDeps {
    /// Round-robined gRPC client over the host ledger's validator set.
    pub host_ledger: Arc<dyn HostLedgerClient>,
    /// Authenticated point-to-point peer delivery.
    pub transport: Arc<dyn PeerTransport>,
    /// The DKLS protocol engine.
    pub dkls_factory: Arc<dyn DklsSessionFactory>,
    /// Destination-chain transaction builders, keyed by chain.
    pub builders: Arc<dyn BuilderRegistry>,
    /// Destination-chain gas price oracle.
    pub oracle: Arc<dyn GasPriceOracle>,
}

/// One chain's event store plus the three tasks that drive it: the
/// session manager (TSS protocol), the outbound resolver (receipt
/// polling), and the expiry sweeper (stuck-event reclamation).
pub struct ChainRuntime {
    /// This chain's event store.
    pub event_store: Arc<EventStore>,
    /// Drives the setup/step/begin protocol and session completion.
    pub session_manager: Arc<SessionManager>,
    /// Polls destination-chain receipts for broadcasted sign events.
    pub outbound_resolver: Arc<OutboundResolver>,
    /// Reclaims events that expired before a TSS session could start.
    pub expiry_sweeper: Arc<ExpirySweeper>,
}

/// The running validator node: owns one [`ChainRuntime`] per chain it has
/// ever seen an event for, plus the shared coordinator, chain-database
/// manager, and transaction cleaner.
pub struct Node {
    config: ValidatorConfig,
    deps: NodeDeps,
    tss_address: String,
    coordinator: Arc<Coordinator>,
    chain_db: Arc<ChainDbManager>,
    cleaner: Arc<PerChainCleaner>,
    sign_verifier: Arc<SigningVerifierAdapter>,
    keyshare_store: Arc<FileKeyshareStore>,
    event_bus: Arc<InMemoryEventBus>,
    chains: RwLock<HashMap<ChainId, Arc<ChainRuntime>>>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl Node {
    /// Build a node over its injected capabilities. Opens no chain
    /// databases yet — those are created lazily, the first time an event
    /// for a given chain is seen (see [`Node::chain_runtime`]).
    pub fn new(config: ValidatorConfig, deps: NodeDeps, tss_address: String) -> Result<Arc<Self>, NodeError> {
        config.validate().map_err(NodeError::Config)?;

        let sign_verifier = Arc::new(SigningVerifierAdapter::new(
            Arc::clone(&deps.builders),
            Arc::clone(&deps.oracle),
            SigningVerifierConfig {
                gas_price_tolerance_percent: config.gas_price_tolerance_percent,
                permissive_on_missing_builder: config.permissive_on_missing_builder,
            },
        ));
        let keyshare_store = Arc::new(FileKeyshareStore::new(config.database_base_dir.clone()));

        Ok(Arc::new(Self {
            chain_db: Arc::new(ChainDbManager::new(config.database_base_dir.clone())),
            coordinator: Arc::new(Coordinator::new()),
            cleaner: Arc::new(PerChainCleaner::new()),
            sign_verifier,
            keyshare_store,
            event_bus: Arc::new(InMemoryEventBus::new()),
            config,
            deps,
            tss_address,
            chains: RwLock::new(HashMap::new()),
            tasks: Mutex::new(Vec::new()),
        }))
    }

    /// The coordinator shared across every chain's session manager.
    pub fn coordinator(&self) -> &Arc<Coordinator> {
        &self.coordinator
    }

    /// The bus session-lifecycle and protocol-traffic events are published
    /// on. Subscribe with [`InMemoryEventBus::subscribe`] to observe the
    /// node without coupling to its dispatch path.
    pub fn event_bus(&self) -> Arc<InMemoryEventBus> {
        Arc::clone(&self.event_bus)
    }

    /// Get or lazily build the subsystem bundle for `chain_id`.
    pub fn chain_runtime(&self, chain_id: &ChainId) -> Result<Arc<ChainRuntime>, NodeError> {
        if let Some(runtime) = self.chains.read().get(chain_id) {
            return Ok(Arc::clone(runtime));
        }

        let handle =
            self.chain_db.get_chain_db(chain_id).map_err(|err| NodeError::ChainDbOpen(chain_id.clone(), err))?;
        let event_store = Arc::new(
            EventStore::new(handle.connection())
                .map_err(|err| NodeError::EventStoreInit(chain_id.clone(), err))?,
        );

        let outbound_broadcaster = Arc::new(OutboundBroadcasterAdapter::new(
            Arc::clone(&self.deps.builders),
            Arc::clone(&event_store),
            self.tss_address.clone(),
        ));

        let session_manager = Arc::new(SessionManager::new(
            Arc::clone(&self.coordinator),
            Arc::clone(&event_store),
            Arc::clone(&self.deps.host_ledger),
            Arc::clone(&self.deps.transport),
            Arc::clone(&self.deps.dkls_factory),
            Arc::clone(&self.sign_verifier) as Arc<dyn uv_session_manager::SignSetupVerifier>,
            Arc::clone(&self.keyshare_store) as Arc<dyn uv_session_manager::KeyshareStore>,
            outbound_broadcaster as Arc<dyn uv_session_manager::OutboundBroadcaster>,
            self.tss_address.clone(),
            SessionManagerConfig {
                check_interval: std::time::Duration::from_secs(self.config.session_check_interval_seconds),
                block_delay: self.config.session_block_delay,
                session_ttl: std::time::Duration::from_secs(self.config.session_ttl_seconds),
            },
        ));

        let outbound_resolver = Arc::new(OutboundResolver::new(
            Arc::clone(&event_store),
            Arc::clone(&self.deps.host_ledger),
            Arc::clone(&self.deps.builders),
        ));
        let expiry_sweeper =
            Arc::new(ExpirySweeper::new(Arc::clone(&event_store), Arc::clone(&self.deps.host_ledger)));

        let runtime = Arc::new(ChainRuntime { event_store, session_manager, outbound_resolver, expiry_sweeper });
        self.chains.write().insert(chain_id.clone(), Arc::clone(&runtime));
        Ok(runtime)
    }

    /// Route an inbound `setup`/`begin`/`step` message to the chain whose
    /// event store holds `msg.event_id`.
    ///
    /// The event's chain isn't carried on the wire message itself (spec.md
    /// §4.9 leaves the envelope chain-agnostic); this looks the event up
    /// in every chain runtime opened so far and dispatches to the one
    /// that has it, which holds because a node never receives protocol
    /// traffic for an event before it has opened that event's chain
    /// database.
    pub async fn dispatch_inbound(
        &self,
        sender: &PeerId,
        msg: &WireMessage,
        validators: &[Validator],
        keyshare_holders: &HashSet<Address>,
        current_block_height: u64,
    ) -> Result<(), NodeError> {
        let runtime = self.runtime_owning(&msg.event_id).await?;

        validator_telemetry::PEER_MESSAGES_RECEIVED
            .with_label_values(&[message_type_label(msg.msg_type)])
            .inc();
        self.event_bus
            .publish(ValidatorEvent::PeerMessageReceived {
                peer_id: sender.clone(),
                session_id: msg.event_id.clone(),
                payload: msg.payload.clone(),
            })
            .await;

        let now = unix_now();
        let result = match msg.msg_type {
            uv_peer_transport::MessageType::Setup => runtime
                .session_manager
                .handle_setup(sender, msg, validators, keyshare_holders, current_block_height, now)
                .await,
            uv_peer_transport::MessageType::Begin => {
                runtime.session_manager.handle_begin(sender, &msg.event_id).await
            }
            uv_peer_transport::MessageType::Step => runtime.session_manager.handle_step(sender, msg).await,
            uv_peer_transport::MessageType::Ack => Ok(()),
        };

        match &result {
            Ok(()) if msg.msg_type == uv_peer_transport::MessageType::Setup => {
                let event_type = runtime
                    .event_store
                    .get_event(&msg.event_id)
                    .map(|event| event.event_type)
                    .unwrap_or(shared_types::EventType::Sign);
                validator_telemetry::SESSIONS_STARTED.with_label_values(&[event_type_label(event_type)]).inc();
                self.event_bus
                    .publish(ValidatorEvent::SessionStarted {
                        session_id: msg.event_id.clone(),
                        event_id: msg.event_id.clone(),
                        event_type,
                    })
                    .await;
            }
            Ok(()) => {}
            Err(err) => {
                validator_telemetry::COMPONENT_ERRORS
                    .with_label_values(&["session_manager", session_error_label(err)])
                    .inc();
                self.event_bus
                    .publish(ValidatorEvent::SessionFailed {
                        session_id: msg.event_id.clone(),
                        event_id: msg.event_id.clone(),
                        reason: err.to_string(),
                    })
                    .await;
            }
        }

        result.map_err(session_error_into_node_error)
    }

    async fn runtime_owning(&self, event_id: &str) -> Result<Arc<ChainRuntime>, NodeError> {
        let found = {
            let chains = self.chains.read();
            chains.values().find(|runtime| runtime.event_store.get_event(event_id).is_ok()).cloned()
        };
        match found {
            Some(runtime) => Ok(runtime),
            None => {
                validator_telemetry::COMPONENT_ERRORS
                    .with_label_values(&["node.dispatch_inbound", "unroutable_event"])
                    .inc();
                self.event_bus
                    .publish(ValidatorEvent::CriticalError {
                        component: "node.dispatch_inbound".to_string(),
                        error: format!("no open chain database holds event {event_id}"),
                    })
                    .await;
                Err(NodeError::Config(format!("no open chain database holds event {event_id}")))
            }
        }
    }

    /// Start the node's background tasks: the validator-registry poller,
    /// the chain-database cleanup poller, and, for every chain runtime
    /// opened so far, its resolver/sweeper/session-expiry loops. Returns
    /// immediately; tasks run until the returned handles are aborted or
    /// the process exits.
    ///
    /// Reference: spec.md §4.10 (validator poll), §4.2 (cleanup poller),
    /// §4.6/§4.7/§4.3 (per-chain ticks).
    pub fn run(self: &Arc<Self>) {
        let mut tasks = self.tasks.lock();

        tasks.push(self.spawn_validator_poller());
        tasks.push(self.spawn_cleanup_poller());

        for runtime in self.chains.read().values() {
            tasks.extend(self.spawn_chain_tasks(runtime));
        }
    }

    fn spawn_validator_poller(self: &Arc<Self>) -> JoinHandle<()> {
        let node = Arc::clone(self);
        let interval = std::time::Duration::from_secs(self.config.validator_poll_interval_seconds);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                match node.deps.host_ledger.get_universal_validators().await {
                    Ok(validators) => node.coordinator.refresh_validators(&validators),
                    Err(err) => tracing::error!(error = %err, "failed to refresh the validator registry"),
                }
            }
        })
    }

    fn spawn_cleanup_poller(self: &Arc<Self>) -> JoinHandle<()> {
        let chain_db = Arc::clone(&self.chain_db);
        let cleaner = Arc::clone(&self.cleaner);
        let retention = self.config.transaction_retention_period_seconds;
        let schedule = CleanupSchedule {
            default_interval: std::time::Duration::from_secs(self.config.transaction_cleanup_interval_seconds),
            overrides: HashMap::new(),
        };
        let node = Arc::downgrade(self);

        uv_chain_db::spawn_cleanup_poller(
            chain_db,
            cleaner,
            schedule,
            move |chain_id| {
                let chain_id = chain_id.clone();
                let node = node.clone();
                let sweep: uv_chain_db::SweepFn = Arc::new(move || {
                    let Some(node) = node.upgrade() else { return 0 };
                    let Ok(runtime) = node.chain_runtime(&chain_id) else { return 0 };
                    runtime
                        .event_store
                        .delete_old_confirmed_transactions(retention as i64, unix_now())
                        .unwrap_or_else(|err| {
                            tracing::error!(chain = %chain_id, error = %err, "retention sweep failed");
                            0
                        })
                });
                let wal_truncate: uv_chain_db::WalTruncateFn = Arc::new(|| {});
                (sweep, wal_truncate)
            },
            uv_chain_db::DEFAULT_POLL_INTERVAL,
        )
    }

    fn spawn_chain_tasks(self: &Arc<Self>, runtime: &Arc<ChainRuntime>) -> Vec<JoinHandle<()>> {
        let mut handles = Vec::new();

        handles.push(uv_outbound_resolver::spawn_resolver_loop(
            Arc::clone(&runtime.outbound_resolver),
            std::time::Duration::from_secs(self.config.resolver_check_interval_seconds),
            unix_now,
        ));
        handles.push(uv_expiry_sweeper::spawn_sweeper_loop(
            Arc::clone(&runtime.expiry_sweeper),
            Arc::clone(&self.deps.host_ledger),
            std::time::Duration::from_secs(self.config.sweeper_check_interval_seconds),
            unix_now,
        ));

        let session_manager = Arc::clone(&runtime.session_manager);
        let host_ledger = Arc::clone(&self.deps.host_ledger);
        let interval = std::time::Duration::from_secs(self.config.session_check_interval_seconds);
        handles.push(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                let current_block = match host_ledger.get_latest_block_num().await {
                    Ok(block) => block,
                    Err(err) => {
                        tracing::error!(error = %err, "session expiry check could not fetch current block");
                        continue;
                    }
                };
                if let Err(err) = session_manager.sweep_expired(unix_now(), current_block).await {
                    tracing::error!(error = %err, "session expiry sweep failed");
                }
            }
        }));

        handles
    }

    /// Abort every background task this node started.
    pub fn shutdown(&self) {
        for task in self.tasks.lock().drain(..) {
            task.abort();
        }
        self.cleaner.stop_all();
    }
}

fn session_error_into_node_error(err: SessionError) -> NodeError {
    match err {
        SessionError::HostLedger(inner) => NodeError::HostLedger(inner),
        other => NodeError::Config(other.to_string()),
    }
}

fn message_type_label(msg_type: uv_peer_transport::MessageType) -> &'static str {
    match msg_type {
        uv_peer_transport::MessageType::Setup => "setup",
        uv_peer_transport::MessageType::Begin => "begin",
        uv_peer_transport::MessageType::Ack => "ack",
        uv_peer_transport::MessageType::Step => "step",
    }
}

fn event_type_label(event_type: shared_types::EventType) -> &'static str {
    match event_type {
        shared_types::EventType::Keygen => "keygen",
        shared_types::EventType::Keyrefresh => "keyrefresh",
        shared_types::EventType::QuorumChange => "quorum_change",
        shared_types::EventType::Sign => "sign",
    }
}

fn session_error_label(err: &SessionError) -> &'static str {
    match err {
        SessionError::UnknownEvent(..) => "unknown_event",
        SessionError::NotCoordinator(..) => "not_coordinator",
        SessionError::InvalidParticipants(..) => "invalid_participants",
        SessionError::SigningVerificationFailed(..) => "signing_verification_failed",
        SessionError::SessionNotFound(..) => "session_not_found",
        SessionError::NotAParticipant(..) => "not_a_participant",
        SessionError::BeginFromWrongCoordinator(..) => "begin_from_wrong_coordinator",
        SessionError::Dkls(..) => "dkls",
        SessionError::Coordinator(..) => "coordinator",
        SessionError::EventStore(..) => "event_store",
        SessionError::HostLedger(..) => "host_ledger",
        SessionError::Transport(..) => "transport",
    }
}

fn unix_now() -> i64 {
    SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_secs() as i64).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use shared_types::EventType;
    use uv_host_ledger_client::{HostLedgerError, Observation};
    use uv_signing_verifier::BuilderError;

    struct NoopHostLedger;

    #[async_trait]
    impl HostLedgerClient for NoopHostLedger {
        async fn get_latest_block_num(&self) -> Result<u64, HostLedgerError> {
            Ok(1_000)
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
            Ok("tx".to_string())
        }
        async fn vote_outbound(
            &self,
            _tx_id: &str,
            _universal_tx_id: &str,
            _observation: &Observation,
        ) -> Result<String, HostLedgerError> {
            Ok("tx".to_string())
        }
    }

    struct NoopTransport;

    #[async_trait]
    impl PeerTransport for NoopTransport {
        async fn send(
            &self,
            _peer_id: &PeerId,
            _bytes: bytes::Bytes,
        ) -> Result<(), uv_peer_transport::TransportError> {
            Ok(())
        }
    }

    struct NoopDklsFactory;

    impl DklsSessionFactory for NoopDklsFactory {
        fn create(
            &self,
            _participants: &[Address],
            _threshold: u64,
            _prior_keyshare: Option<Vec<u8>>,
        ) -> Result<Box<dyn uv_session_manager::DklsSession>, String> {
            Err("DKLS engine not configured in this test".to_string())
        }
    }

    struct EmptyBuilders;

    impl BuilderRegistry for EmptyBuilders {
        fn get(&self, _chain_id: &ChainId) -> Option<&dyn uv_signing_verifier::TransactionBuilder> {
            None
        }
    }

    struct ZeroOracle;

    #[async_trait]
    impl GasPriceOracle for ZeroOracle {
        async fn get_gas_price(&self, _chain_id: &ChainId) -> Result<u128, BuilderError> {
            Ok(0)
        }
    }

    fn test_deps() -> NodeDeps {
        NodeDeps {
            host_ledger: Arc::new(NoopHostLedger),
            transport: Arc::new(NoopTransport),
            dkls_factory: Arc::new(NoopDklsFactory),
            builders: Arc::new(EmptyBuilders),
            oracle: Arc::new(ZeroOracle),
        }
    }

    fn test_config() -> ValidatorConfig {
        let mut config = ValidatorConfig::default();
        config.push_chain_grpc_urls = vec!["https://push.example:9090".to_string()];
        config.database_base_dir = tempfile::tempdir().unwrap().into_path();
        config
    }

    #[test]
    fn new_rejects_an_invalid_config() {
        let config = ValidatorConfig::default();
        assert!(Node::new(config, test_deps(), "push1validator".to_string()).is_err());
    }

    #[test]
    fn chain_runtime_is_memoized_per_chain() {
        let node = Node::new(test_config(), test_deps(), "push1validator".to_string()).unwrap();
        let chain = ChainId::new("eip155:11155111");
        let a = node.chain_runtime(&chain).unwrap();
        let b = node.chain_runtime(&chain).unwrap();
        assert!(Arc::ptr_eq(&a.event_store, &b.event_store));
    }

    #[test]
    fn chain_runtime_opens_distinct_chains_independently() {
        let node = Node::new(test_config(), test_deps(), "push1validator".to_string()).unwrap();
        let a = node.chain_runtime(&ChainId::new("eip155:11155111")).unwrap();
        let b = node.chain_runtime(&ChainId::new("solana:devnet")).unwrap();
        assert!(!Arc::ptr_eq(&a.event_store, &b.event_store));
    }

    #[tokio::test]
    async fn dispatch_inbound_errors_when_no_open_chain_holds_the_event() {
        let node = Node::new(test_config(), test_deps(), "push1validator".to_string()).unwrap();
        node.chain_runtime(&ChainId::new("eip155:11155111")).unwrap();

        let msg = WireMessage {
            msg_type: uv_peer_transport::MessageType::Setup,
            event_id: "unknown-event".to_string(),
            payload: Vec::new(),
            participants: Vec::new(),
            unsigned_outbound_tx_req: None,
        };
        let result = node
            .dispatch_inbound(&PeerId("peer-1".to_string()), &msg, &[], &HashSet::new(), 1_000)
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn unroutable_message_publishes_a_critical_error_on_the_bus() {
        let node = Node::new(test_config(), test_deps(), "push1validator".to_string()).unwrap();
        node.chain_runtime(&ChainId::new("eip155:11155111")).unwrap();
        let mut sub = node.event_bus().subscribe(shared_bus::EventFilter::all());

        let msg = WireMessage {
            msg_type: uv_peer_transport::MessageType::Setup,
            event_id: "unknown-event".to_string(),
            payload: Vec::new(),
            participants: Vec::new(),
            unsigned_outbound_tx_req: None,
        };
        node.dispatch_inbound(&PeerId("peer-1".to_string()), &msg, &[], &HashSet::new(), 1_000)
            .await
            .unwrap_err();

        let published = sub.recv().await.expect("bus closed");
        assert!(matches!(published, ValidatorEvent::CriticalError { .. }));
    }

    #[test]
    fn event_type_sign_is_not_a_key_ceremony() {
        assert!(!EventType::Sign.is_key_ceremony());
    }
}
