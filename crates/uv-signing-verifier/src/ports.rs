//! Outbound ports the verifier depends on but does not implement.
//!
//! Reference: spec.md §6.4 (the destination-chain builder capability) and
//! §4.10 (`GetGasPrice`). Concrete chain RPC clients are out of scope per
//! spec.md §1; production wiring supplies real adapters behind these
//! traits.

use async_trait::async_trait;
use shared_types::ChainId;

/// A deterministic, chain-specific unsigned-transaction builder.
///
/// Reference: spec.md §6.4.
#[async_trait]
pub trait TransactionBuilder: Send + Sync {
    /// Build the unsigned outbound request and its pre-image hash.
    ///
    /// Deterministic given `outbound_data`, `gas_price`, and
    /// `tss_address` — two nodes computing this for the same inputs must
    /// get byte-identical `signing_hash`.
    async fn get_outbound_signing_request(
        &self,
        outbound_data: &[u8],
        gas_price: u128,
        tss_address: &str,
    ) -> Result<SigningRequest, BuilderError>;

    /// Broadcast a signed outbound transaction.
    ///
    /// Always returns the computed chain-native tx hash even when the
    /// broadcast step itself fails (needed for idempotent retries, §4.6).
    async fn broadcast_outbound_signing_request(
        &self,
        signing_request: &SigningRequest,
        outbound_data: &[u8],
        signature: &[u8],
    ) -> (String, Result<(), BuilderError>);

    /// Check a previously broadcast transaction's on-chain status.
    async fn verify_broadcasted_tx(&self, tx_hash: &str) -> Result<BroadcastStatus, BuilderError>;
}

/// The deterministic unsigned-transaction request a [`TransactionBuilder`]
/// produces.
///
/// Reference: spec.md §6.1 — `UnSignedOutboundTxReq` carries `GasPrice`,
/// `Nonce`, `SigningHash`, and the chain-specific serialized pre-image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SigningRequest {
    /// Gas price used to build this request, in the destination chain's
    /// base fee unit.
    pub gas_price: u128,
    /// Account nonce (or chain-equivalent sequencing field) consumed.
    pub nonce: u64,
    /// The pre-image hash that must be byte-identical across all signers.
    pub signing_hash: Vec<u8>,
    /// The chain-specific serialized transaction pre-image.
    pub serialized_pre_image: Vec<u8>,
}

/// Outcome of polling a broadcast transaction.
///
/// Reference: spec.md §6.4 — `status 0 = reverted, 1 = success`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BroadcastStatus {
    /// Not yet observed on the destination chain.
    NotFound,
    /// Observed, but below the chain's standard confirmation depth.
    Pending {
        /// Block height the transaction landed at.
        block_height: u64,
        /// Confirmations observed so far.
        confirmations: u64,
    },
    /// Observed with sufficient confirmations.
    Confirmed {
        /// Block height the transaction landed at.
        block_height: u64,
        /// Confirmations observed.
        confirmations: u64,
        /// `true` when the destination chain reports success (status 1).
        success: bool,
    },
}

/// A registry of per-chain [`TransactionBuilder`]s, keyed by [`ChainId`].
///
/// Reference: spec.md §9 — "represent EVM vs SVM builders as a tagged
/// capability set, not inheritance." This crate treats "builder
/// unavailable for this chain" (§4.5's fail-open/fail-closed question) as
/// simply `get(chain_id)` returning `None`.
pub trait BuilderRegistry: Send + Sync {
    /// Look up the builder for `chain_id`, if this node has one configured.
    fn get(&self, chain_id: &ChainId) -> Option<&dyn TransactionBuilder>;
}

/// Queries the host ledger's observed gas price for a destination chain.
///
/// Reference: spec.md §4.10 — `GetGasPrice(ctx, chainID)`.
#[async_trait]
pub trait GasPriceOracle: Send + Sync {
    /// Fetch the currently observed gas price for `chain_id`.
    async fn get_gas_price(&self, chain_id: &ChainId) -> Result<u128, BuilderError>;
}

/// Errors surfaced by builder/oracle adapters.
#[derive(Debug, thiserror::Error)]
pub enum BuilderError {
    /// The destination-chain RPC call failed or timed out.
    #[error("destination-chain RPC error: {0}")]
    Rpc(String),
    /// The outbound data could not be interpreted by this builder.
    #[error("malformed outbound data: {0}")]
    MalformedOutboundData(String),
}
