//! Cross-crate end-to-end scenarios for the Universal Validator.
//!
//! Unlike each subsystem crate's own `#[cfg(test)]` unit tests (which
//! stand up an `EventStore` directly over a bare `rusqlite::Connection`),
//! these scenarios go through `uv-chain-db`'s `ChainDbManager` so the
//! resolver and sweeper are exercised against the same per-chain database
//! seam the running node uses.

pub mod integration;
