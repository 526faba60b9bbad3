//! Durable per-chain event store.
//!
//! Reference: spec.md §4.1 and §3 (DATA MODEL).
//!
//! One `EventStore` wraps one chain's sqlite connection (obtained from
//! `uv-chain-db`). Ownership rule from spec.md §3: "The Event Store
//! exclusively owns event rows; the Session Manager reads and transitions
//! statuses through the Store's update API, never bypassing it."

mod errors;
mod repository;
mod schema;

pub use errors::EventStoreError;
pub use repository::{EventPatch, EventStore};
