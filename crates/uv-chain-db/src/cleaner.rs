//! Per-chain transaction cleaner scheduler.
//!
//! Reference: spec.md §4.2, §4.8 — "for each chain with an open DB, a
//! goroutine-equivalent task runs at a chain-specific interval, invokes
//! DeleteOldConfirmedTransactions, and on non-zero deletion count issues a
//! WAL truncate."

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use shared_types::ChainId;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::IntervalStream;

/// Retention sweep callback: deletes old `COMPLETED` rows and returns the
/// count deleted. Kept generic so this crate never depends on the event
/// schema — the caller (node wiring) closes over an `EventStore`.
pub type SweepFn = Arc<dyn Fn() -> usize + Send + Sync>;

/// WAL truncate callback, invoked only when a sweep deletes at least one row.
pub type WalTruncateFn = Arc<dyn Fn() + Send + Sync>;

/// One chain's registered cleaner: the interval it runs at plus its task.
struct Registered {
    interval: Duration,
    handle: JoinHandle<()>,
}

/// Starts, stops, and restarts per-chain cleaner tasks.
///
/// Reference: spec.md §4.2 — "Configuration updates restart the per-chain
/// cleaner with the new cadence without restarting others."
#[derive(Default)]
pub struct PerChainCleaner {
    tasks: Mutex<HashMap<ChainId, Registered>>,
}

impl PerChainCleaner {
    /// Create an empty cleaner registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start (or restart, if already running) the cleaner for `chain_id`.
    pub fn start(&self, chain_id: ChainId, interval: Duration, sweep: SweepFn, wal_truncate: WalTruncateFn) {
        self.stop(&chain_id);
        let chain_for_log = chain_id.clone();
        let handle = tokio::spawn(async move {
            let mut ticks = IntervalStream::new(tokio::time::interval(interval));
            use tokio_stream::StreamExt;
            while ticks.next().await.is_some() {
                let deleted = sweep();
                if deleted > 0 {
                    tracing::info!(chain = %chain_for_log, deleted, "transaction cleaner deleted rows");
                    wal_truncate();
                } else {
                    tracing::debug!(chain = %chain_for_log, "transaction cleaner pass: nothing to delete");
                }
            }
        });
        self.tasks.lock().insert(chain_id, Registered { interval, handle });
    }

    /// Stop the cleaner for `chain_id`, if running.
    pub fn stop(&self, chain_id: &ChainId) {
        if let Some(registered) = self.tasks.lock().remove(chain_id) {
            registered.handle.abort();
        }
    }

    /// Whether a cleaner is currently registered for `chain_id`.
    pub fn is_running(&self, chain_id: &ChainId) -> bool {
        self.tasks.lock().contains_key(chain_id)
    }

    /// The interval currently in effect for `chain_id`, if running.
    pub fn current_interval(&self, chain_id: &ChainId) -> Option<Duration> {
        self.tasks.lock().get(chain_id).map(|r| r.interval)
    }

    /// Stop every registered cleaner (node shutdown).
    pub fn stop_all(&self) {
        for (_, registered) in self.tasks.lock().drain() {
            registered.handle.abort();
        }
    }
}
