//! The host-ledger RPC port.
//!
//! Reference: spec.md §4.10.

use async_trait::async_trait;
use shared_types::{ChainId, Validator};

use crate::errors::HostLedgerError;
use crate::observation::Observation;

/// Queries and vote submissions against the coordinating ("Push chain")
/// host ledger.
///
/// Reference: spec.md §1 — chain-specific RPC wiring is out of scope; this
/// trait is the capability boundary production code implements.
#[async_trait]
pub trait HostLedgerClient: Send + Sync {
    /// `GetLatestBlockNum() -> uint64`.
    async fn get_latest_block_num(&self) -> Result<u64, HostLedgerError>;

    /// `GetUniversalValidators() -> []Validator`.
    async fn get_universal_validators(&self) -> Result<Vec<Validator>, HostLedgerError>;

    /// `GetCurrentTSSKey(ctx) -> (keyID, publicKey)`.
    async fn get_current_tss_key(&self) -> Result<(String, Vec<u8>), HostLedgerError>;

    /// `GetGasPrice(ctx, chainID) -> *big.Int`.
    async fn get_gas_price(&self, chain_id: &ChainId) -> Result<u128, HostLedgerError>;

    /// `VoteTssKeyProcess(...) -> txHash`.
    async fn vote_tss_key_process(
        &self,
        public_key: &[u8],
        storage_id: &str,
        process_id: &str,
    ) -> Result<String, HostLedgerError>;

    /// `VoteOutbound(ctx, txID, universalTxID, observation) -> voteTxHash`.
    async fn vote_outbound(
        &self,
        tx_id: &str,
        universal_tx_id: &str,
        observation: &Observation,
    ) -> Result<String, HostLedgerError>;
}
