//! Independent reconstruction and verification of sign-session requests.
//!
//! Reference: spec.md §4.5.

mod config;
mod errors;
mod ports;
mod verifier;

pub use config::SigningVerifierConfig;
pub use errors::VerifierError;
pub use ports::{BroadcastStatus, BuilderError, BuilderRegistry, GasPriceOracle, SigningRequest, TransactionBuilder};
pub use verifier::SigningVerifier;
