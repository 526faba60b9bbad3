//! Universal Validator node entrypoint.
//!
//! Loads configuration, starts telemetry, and derives the local validator
//! identity before handing off to [`uv_node::Node`]. Concrete host-ledger,
//! transport, DKLS, and keyring adapters are out of scope (spec.md §1) and
//! are not constructed here; see [`derive_validator_identity`] for the one
//! identity-derivation path this binary can actually perform without them.

use uv_node::{KeyringBackend, NodeError, ValidatorConfig};
use validator_telemetry::TelemetryConfig;

/// Resolve the local validator's on-ledger address.
///
/// `KeyringBackend::Test` reads a plaintext address file written by the
/// operator (the same development-only convention `FileKeyshareStore`
/// uses for keyshares). `KeyringBackend::File` requires decrypting a
/// passphrase-protected keyring, which is out of scope here (spec.md §1)
/// — it always fails, which is the honest behavior until that adapter is
/// supplied.
fn derive_validator_identity(config: &ValidatorConfig) -> Result<String, NodeError> {
    match config.keyring_backend {
        KeyringBackend::Test => {
            let path = config.database_base_dir.join("tss_address.txt");
            std::fs::read_to_string(&path)
                .map(|s| s.trim().to_string())
                .map_err(|err| {
                    NodeError::IdentityDerivation(format!(
                        "test keyring: could not read {}: {err}",
                        path.display()
                    ))
                })
        }
        KeyringBackend::File => Err(NodeError::IdentityDerivation(
            "file keyring backend requires a concrete keyring adapter, which is not wired into this binary"
                .to_string(),
        )),
    }
}

fn run(config: &ValidatorConfig) -> Result<String, NodeError> {
    config.validate().map_err(NodeError::Config)?;
    derive_validator_identity(config)
}

#[tokio::main]
async fn main() {
    let config = ValidatorConfig::from_env();

    let _telemetry = match validator_telemetry::init_telemetry(TelemetryConfig::from_env()) {
        Ok(guard) => guard,
        Err(err) => {
            eprintln!("failed to initialize telemetry: {err}");
            std::process::exit(1);
        }
    };

    tracing::info!("universal validator node starting");

    match run(&config) {
        Ok(tss_address) => {
            tracing::info!(tss_address, "local validator identity resolved");
            tracing::error!(
                "host-ledger client, peer transport, DKLS engine, and transaction builders are capability \
                 interfaces (spec.md §1); no concrete adapters are wired into this binary, so the node cannot \
                 proceed past startup"
            );
            std::process::exit(1);
        }
        Err(err) => {
            tracing::error!(error = %err, fatal = err.is_fatal(), "node startup failed");
            std::process::exit(1);
        }
    }
}
