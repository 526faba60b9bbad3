//! # Shared Crypto
//!
//! The cryptographic primitives the core actually needs (spec.md §1: "The
//! DKLS cryptographic primitive" itself is out of scope — this crate only
//! supplies the SHA-256 and secp256k1 helpers the core uses *around* it).
//!
//! ## Components
//!
//! | Module | Algorithm | Use Case |
//! |--------|-----------|----------|
//! | `hashing` | SHA-256 | Keyshare storage IDs, coordinator election |
//! | `ecdsa` | secp256k1 | TSS-derived address recovery/verification |

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod ecdsa;
pub mod errors;
pub mod hashing;

// Re-exports
pub use ecdsa::{Secp256k1KeyPair, Secp256k1PublicKey, Secp256k1Signature};
pub use errors::CryptoError;
pub use hashing::{sha256, sha256_hex, sha256_many};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
