//! Per-chain database manager and transaction-cleaner scheduler.
//!
//! Reference: spec.md §4.2, §4.8.
//!
//! Ownership rule from spec.md §3: "The Per-Chain DB Manager exclusively
//! owns open database handles and is the only component permitted to close
//! them." This crate has no knowledge of the `Event` schema — `uv-event-store`
//! builds its table on top of the connection a [`ChainHandle`] hands out, and
//! the cleaner's retention sweep is injected by the caller so this crate
//! never depends on `uv-event-store` (which would create a dependency
//! cycle, since the event store depends on the connection type here).

mod cleaner;
mod errors;
mod manager;
mod poller;

pub use cleaner::{PerChainCleaner, SweepFn, WalTruncateFn};
pub use errors::ChainDbError;
pub use manager::{chain_db_path, ChainDbManager, ChainHandle, DatabaseStats};
pub use poller::{spawn_cleanup_poller, CleanupSchedule, DEFAULT_POLL_INTERVAL};
