//! The `VoteOutbound` observation contract.
//!
//! Reference: spec.md §4.6 — "Observation semantics: success=true requires
//! non-empty txHash and blockHeight > 0; success=false with non-empty
//! txHash requires blockHeight > 0; success=false with empty txHash and
//! zero blockHeight means a protocol-layer drop."

use crate::errors::HostLedgerError;

/// An outbound-transaction observation reported via `VoteOutbound`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Observation {
    /// `true` if the destination-chain transaction succeeded.
    pub success: bool,
    /// Destination-chain block height, or 0 for a protocol-layer drop.
    pub block_height: u64,
    /// Destination-chain tx hash, or empty for a protocol-layer drop.
    pub tx_hash: String,
    /// Human-readable reason, always present on failure.
    pub error_msg: Option<String>,
}

impl Observation {
    /// A success observation.
    pub fn success(tx_hash: impl Into<String>, block_height: u64) -> Result<Self, HostLedgerError> {
        let tx_hash = tx_hash.into();
        let obs = Self { success: true, block_height, tx_hash, error_msg: None };
        obs.validate()?;
        Ok(obs)
    }

    /// A failure observation with a known destination-chain tx (execution
    /// revert).
    pub fn failure_with_tx(
        tx_hash: impl Into<String>,
        block_height: u64,
        error_msg: impl Into<String>,
    ) -> Result<Self, HostLedgerError> {
        let obs = Self {
            success: false,
            block_height,
            tx_hash: tx_hash.into(),
            error_msg: Some(error_msg.into()),
        };
        obs.validate()?;
        Ok(obs)
    }

    /// A protocol-layer drop: no destination-chain transaction ever
    /// existed (broadcast never confirmed, or the event expired before a
    /// session could start).
    pub fn protocol_drop(error_msg: impl Into<String>) -> Self {
        Self { success: false, block_height: 0, tx_hash: String::new(), error_msg: Some(error_msg.into()) }
    }

    fn validate(&self) -> Result<(), HostLedgerError> {
        if self.success && (self.tx_hash.is_empty() || self.block_height == 0) {
            return Err(HostLedgerError::InvalidObservation(
                "success=true requires a non-empty tx_hash and block_height > 0".to_string(),
            ));
        }
        if !self.success && !self.tx_hash.is_empty() && self.block_height == 0 {
            return Err(HostLedgerError::InvalidObservation(
                "success=false with a non-empty tx_hash requires block_height > 0".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_requires_tx_hash_and_block_height() {
        assert!(Observation::success("0xabc", 100).is_ok());
        assert!(Observation::success("", 100).is_err());
        assert!(Observation::success("0xabc", 0).is_err());
    }

    #[test]
    fn failure_with_tx_requires_nonzero_block_height() {
        assert!(Observation::failure_with_tx("0xabc", 100, "reverted").is_ok());
        assert!(Observation::failure_with_tx("0xabc", 0, "reverted").is_err());
    }

    #[test]
    fn protocol_drop_is_always_valid() {
        let obs = Observation::protocol_drop("max retries exceeded");
        assert!(!obs.success);
        assert_eq!(obs.block_height, 0);
        assert!(obs.tx_hash.is_empty());
    }
}
