//! Validator node composition root: configuration, adapters bridging owned
//! collaborators to the ports other `uv-*` crates depend on, and the
//! [`Node`] type that wires a chain's subsystems together.
//!
//! Reference: spec.md §6.

mod adapters;
mod config;
mod errors;
mod node;

pub use adapters::{FileKeyshareStore, OutboundBroadcasterAdapter, SigningVerifierAdapter};
pub use config::{ChainOverride, KeyringBackend, ValidatorConfig};
pub use errors::NodeError;
pub use node::{ChainRuntime, Node, NodeDeps};
