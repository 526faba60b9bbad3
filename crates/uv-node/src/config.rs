//! The validator node's recognized configuration options.
//!
//! Reference: spec.md §6.6. Loading this structure from a file or the
//! environment is out of scope (§1); [`ValidatorConfig::from_env`] is a
//! minimal loader sufficient to run the node, following the same
//! `std::env::var` + explicit default pattern the rest of this codebase
//! family uses rather than a config-parsing crate.

use std::collections::HashMap;
use std::path::PathBuf;

/// Which keyring backend holds this validator's signing key material.
///
/// Reference: spec.md §6.6 — `KeyringBackend: file|test`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyringBackend {
    /// Passphrase-encrypted on-disk keyring.
    File,
    /// Plaintext keyring, for development and tests only.
    Test,
}

impl KeyringBackend {
    fn parse(raw: &str) -> Option<Self> {
        match raw {
            "file" => Some(Self::File),
            "test" => Some(Self::Test),
            _ => None,
        }
    }
}

/// Per-chain overrides of the global cleanup cadence.
///
/// Reference: spec.md §6.6 — `ChainConfigs: map<chainID,
/// {CleanupIntervalSeconds?, RetentionPeriodSeconds?}>`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChainOverride {
    /// Overrides the global cleanup interval for this chain, if set.
    pub cleanup_interval_seconds: Option<u64>,
    /// Overrides the global retention period for this chain, if set.
    pub retention_period_seconds: Option<u64>,
}

/// Complete validator node configuration.
///
/// Reference: spec.md §6.6, plus the ambient subsystem tunables each
/// `uv-*` crate already exposes a default for (`[ADDED]`, listed
/// individually below).
#[derive(Debug, Clone)]
pub struct ValidatorConfig {
    /// Host-ledger gRPC endpoints, round-robined by `uv-host-ledger-client`.
    pub push_chain_grpc_urls: Vec<String>,
    /// Which keyring backend holds this validator's key material.
    pub keyring_backend: KeyringBackend,
    /// Root directory for per-chain databases (spec.md §6.3) and the
    /// local keyshare store.
    pub database_base_dir: PathBuf,
    /// Global transaction-cleanup interval, in seconds.
    pub transaction_cleanup_interval_seconds: u64,
    /// Global transaction retention period, in seconds.
    pub transaction_retention_period_seconds: u64,
    /// Per-chain overrides of the cleanup cadence, keyed by CAIP-2 chain ID.
    pub chain_configs: HashMap<String, ChainOverride>,
    /// Port for the local HTTP inspection endpoint.
    pub query_server_port: u16,

    /// `[ADDED]` Session-manager expiry-check cadence; see
    /// `uv_session_manager::DEFAULT_CHECK_INTERVAL`.
    pub session_check_interval_seconds: u64,
    /// `[ADDED]` Session time-to-live before the expiry check reclaims it;
    /// see `uv_session_manager::DEFAULT_SESSION_TTL`.
    pub session_ttl_seconds: u64,
    /// `[ADDED]` Block delay applied when requeuing an expired session; see
    /// `uv_session_manager::DEFAULT_BLOCK_DELAY`.
    pub session_block_delay: u64,
    /// `[ADDED]` Outbound-resolver tick cadence; see
    /// `uv_outbound_resolver::DEFAULT_CHECK_INTERVAL`.
    pub resolver_check_interval_seconds: u64,
    /// `[ADDED]` Expiry-sweeper tick cadence; see
    /// `uv_expiry_sweeper::DEFAULT_CHECK_INTERVAL`.
    pub sweeper_check_interval_seconds: u64,
    /// `[ADDED]` How often the node refreshes `GetUniversalValidators`
    /// into the coordinator's registry.
    pub validator_poll_interval_seconds: u64,
    /// `[ADDED]` Gas-price tolerance percent passed to
    /// `uv_signing_verifier::SigningVerifierConfig`.
    pub gas_price_tolerance_percent: u8,
    /// `[ADDED]` Whether the signing verifier accepts a setup when no
    /// builder is configured for the destination chain. Must only be set
    /// `true` in development.
    pub permissive_on_missing_builder: bool,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            push_chain_grpc_urls: Vec::new(),
            keyring_backend: KeyringBackend::Test,
            database_base_dir: PathBuf::from("./data"),
            transaction_cleanup_interval_seconds: 3_600,
            transaction_retention_period_seconds: 7 * 24 * 3_600,
            chain_configs: HashMap::new(),
            query_server_port: 8080,
            session_check_interval_seconds: 15,
            session_ttl_seconds: 300,
            session_block_delay: 60,
            resolver_check_interval_seconds: 15,
            sweeper_check_interval_seconds: 30,
            validator_poll_interval_seconds: 60,
            gas_price_tolerance_percent: 10,
            permissive_on_missing_builder: false,
        }
    }
}

impl ValidatorConfig {
    /// Build a configuration from environment variables, falling back to
    /// [`ValidatorConfig::default`] for anything unset.
    ///
    /// | Variable | Default |
    /// |---|---|
    /// | `UV_PUSH_CHAIN_GRPC_URLS` | empty (comma-separated) |
    /// | `UV_KEYRING_BACKEND` | `test` |
    /// | `UV_DATABASE_BASE_DIR` | `./data` |
    /// | `UV_TX_CLEANUP_INTERVAL_SECS` | `3600` |
    /// | `UV_TX_RETENTION_PERIOD_SECS` | `604800` |
    /// | `UV_QUERY_SERVER_PORT` | `8080` |
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(urls) = std::env::var("UV_PUSH_CHAIN_GRPC_URLS") {
            config.push_chain_grpc_urls =
                urls.split(',').map(str::trim).filter(|s| !s.is_empty()).map(str::to_string).collect();
        }
        if let Ok(backend) = std::env::var("UV_KEYRING_BACKEND") {
            if let Some(parsed) = KeyringBackend::parse(&backend) {
                config.keyring_backend = parsed;
            } else {
                tracing::warn!(value = %backend, "unrecognized UV_KEYRING_BACKEND; keeping default");
            }
        }
        if let Ok(dir) = std::env::var("UV_DATABASE_BASE_DIR") {
            config.database_base_dir = PathBuf::from(dir);
        }
        if let Some(v) = env_u64("UV_TX_CLEANUP_INTERVAL_SECS") {
            config.transaction_cleanup_interval_seconds = v;
        }
        if let Some(v) = env_u64("UV_TX_RETENTION_PERIOD_SECS") {
            config.transaction_retention_period_seconds = v;
        }
        if let Some(v) = std::env::var("UV_QUERY_SERVER_PORT").ok().and_then(|v| v.parse().ok()) {
            config.query_server_port = v;
        }

        config
    }

    /// Validate that the configuration is fit to start a production node.
    ///
    /// Reference: spec.md §6.7 — "Nonzero exit on config load failure."
    pub fn validate(&self) -> Result<(), String> {
        if self.push_chain_grpc_urls.is_empty() {
            return Err("push_chain_grpc_urls must name at least one host-ledger endpoint".to_string());
        }
        if self.gas_price_tolerance_percent == 0 || self.gas_price_tolerance_percent > 100 {
            return Err("gas_price_tolerance_percent must be in 1..=100".to_string());
        }
        Ok(())
    }
}

fn env_u64(key: &str) -> Option<u64> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}
