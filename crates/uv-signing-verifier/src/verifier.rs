//! The four-step signing-request verification flow.
//!
//! Reference: spec.md §4.5.

use shared_types::{ChainId, OutboundCreatedEvent};

use crate::config::SigningVerifierConfig;
use crate::errors::VerifierError;
use crate::ports::{BuilderRegistry, GasPriceOracle};

/// Verifies a coordinator's sign-session setup before this node ACKs it.
pub struct SigningVerifier<'a> {
    builders: &'a dyn BuilderRegistry,
    oracle: &'a dyn GasPriceOracle,
    config: SigningVerifierConfig,
}

impl<'a> SigningVerifier<'a> {
    /// Construct a verifier over the given builder registry and gas-price
    /// oracle.
    pub fn new(
        builders: &'a dyn BuilderRegistry,
        oracle: &'a dyn GasPriceOracle,
        config: SigningVerifierConfig,
    ) -> Self {
        Self { builders, oracle, config }
    }

    /// Run the four-step verification flow.
    ///
    /// `coordinator_gas_price` and `coordinator_signing_hash` come from the
    /// coordinator's `setup` message's `UnSignedOutboundTxReq` (§6.1).
    /// `tss_address` is this node's current view of the TSS ECDSA address.
    pub async fn verify(
        &self,
        event_data: &[u8],
        coordinator_gas_price: u128,
        coordinator_signing_hash: &[u8],
        tss_address: &str,
    ) -> Result<(), VerifierError> {
        // Step 1: parse EventData into OutboundCreatedEvent.
        let outbound = OutboundCreatedEvent::from_event_data(event_data)?;

        // Step 2: gas price tolerance check.
        let oracle_price = self
            .oracle
            .get_gas_price(&outbound.destination_chain)
            .await
            .map_err(VerifierError::Oracle)?;
        if !within_tolerance(coordinator_gas_price, oracle_price, self.config.gas_price_tolerance_percent) {
            return Err(VerifierError::GasPriceOutOfTolerance {
                coordinator: coordinator_gas_price,
                oracle: oracle_price,
                tolerance_percent: self.config.gas_price_tolerance_percent,
            });
        }

        // Step 3 + 4: reconstruct the pre-image hash and byte-compare.
        match self.builders.get(&outbound.destination_chain) {
            Some(builder) => {
                let raw = outbound.to_event_data().map_err(VerifierError::MalformedEventData)?;
                let request = builder
                    .get_outbound_signing_request(&raw, coordinator_gas_price, tss_address)
                    .await
                    .map_err(VerifierError::Builder)?;
                if request.signing_hash != coordinator_signing_hash {
                    return Err(VerifierError::SigningHashMismatch);
                }
                Ok(())
            }
            None => self.handle_missing_builder(&outbound.destination_chain),
        }
    }

    fn handle_missing_builder(&self, chain_id: &ChainId) -> Result<(), VerifierError> {
        if self.config.permissive_on_missing_builder {
            tracing::warn!(
                chain = %chain_id,
                "no transaction builder configured for destination chain; accepting per permissive_on_missing_builder"
            );
            Ok(())
        } else {
            tracing::warn!(chain = %chain_id, "no transaction builder configured for destination chain; rejecting (fail-closed)");
            Err(VerifierError::Builder(crate::ports::BuilderError::Rpc(format!(
                "no builder configured for {chain_id}"
            ))))
        }
    }
}

/// `tolerance = oracle / (100 / tolerancePercent)`.
///
/// Reference: spec.md §4.5.
fn within_tolerance(coordinator_price: u128, oracle_price: u128, tolerance_percent: u8) -> bool {
    if tolerance_percent == 0 {
        return coordinator_price == oracle_price;
    }
    let tolerance = oracle_price / (100 / tolerance_percent as u128);
    let diff = coordinator_price.abs_diff(oracle_price);
    diff <= tolerance
}
