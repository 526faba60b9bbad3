//! Signing-verifier configuration.
//!
//! Reference: spec.md §9 — "Open question ... An implementer should treat
//! this as fail-closed in production builds (reject the setup) and expose
//! the current permissive behavior only under an explicit development
//! flag."

/// Tunables for [`crate::SigningVerifier`].
#[derive(Debug, Clone, Copy)]
pub struct SigningVerifierConfig {
    /// Acceptable deviation from the oracle gas price, as a percent.
    ///
    /// Reference: spec.md §4.5 — "Accept the coordinator's gas price iff it
    /// lies within ±10% of the oracle value."
    pub gas_price_tolerance_percent: u8,

    /// Whether to accept a sign setup when no builder is configured for the
    /// destination chain.
    ///
    /// Defaults to `false` (fail-closed). Set `true` only under an explicit
    /// development configuration — never as a silent production default.
    /// The permissive behavior spec.md describes ("logs a warning and
    /// accepts") is still implemented, gated behind this flag.
    pub permissive_on_missing_builder: bool,
}

impl Default for SigningVerifierConfig {
    fn default() -> Self {
        Self { gas_price_tolerance_percent: 10, permissive_on_missing_builder: false }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_fail_closed() {
        let config = SigningVerifierConfig::default();
        assert!(!config.permissive_on_missing_builder);
        assert_eq!(config.gas_price_tolerance_percent, 10);
    }
}
