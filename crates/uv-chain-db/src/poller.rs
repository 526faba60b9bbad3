//! Detects newly opened chain databases and starts their cleaner.
//!
//! Reference: spec.md §4.2 — "a separate poller detects newly opened chain
//! DBs once per minute and starts their cleaner."

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use shared_types::ChainId;
use tokio::task::JoinHandle;

use crate::cleaner::{PerChainCleaner, SweepFn, WalTruncateFn};
use crate::manager::ChainDbManager;

/// Default interval between poller scans.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(60);

/// Per-chain cleanup cadence: a global default, overridable per chain.
///
/// Reference: spec.md §6.6 — `ChainConfigs: map<chainID,
/// {CleanupIntervalSeconds?, RetentionPeriodSeconds?}>`.
#[derive(Clone, Default)]
pub struct CleanupSchedule {
    /// Interval applied to any chain without an explicit override.
    pub default_interval: Duration,
    /// Per-chain interval overrides.
    pub overrides: HashMap<ChainId, Duration>,
}

impl CleanupSchedule {
    /// The interval in effect for `chain_id`.
    pub fn interval_for(&self, chain_id: &ChainId) -> Duration {
        self.overrides.get(chain_id).copied().unwrap_or(self.default_interval)
    }
}

/// Spawns the poller task. `make_sweep` builds the two callbacks a cleaner
/// needs for a given chain (the caller closes over its own `EventStore`).
pub fn spawn_cleanup_poller(
    manager: Arc<ChainDbManager>,
    cleaner: Arc<PerChainCleaner>,
    schedule: CleanupSchedule,
    make_sweep: impl Fn(&ChainId) -> (SweepFn, WalTruncateFn) + Send + Sync + 'static,
    poll_interval: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(poll_interval);
        loop {
            ticker.tick().await;
            for (chain_id, _handle) in manager.get_all_databases() {
                if cleaner.is_running(&chain_id) {
                    continue;
                }
                let (sweep, wal_truncate) = make_sweep(&chain_id);
                let interval = schedule.interval_for(&chain_id);
                tracing::info!(chain = %chain_id, ?interval, "starting transaction cleaner for newly opened chain");
                cleaner.start(chain_id, interval, sweep, wal_truncate);
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schedule_falls_back_to_default_interval() {
        let schedule = CleanupSchedule { default_interval: Duration::from_secs(300), overrides: HashMap::new() };
        assert_eq!(schedule.interval_for(&ChainId::new("eip155:1")), Duration::from_secs(300));
    }

    #[test]
    fn schedule_honors_per_chain_override() {
        let mut overrides = HashMap::new();
        overrides.insert(ChainId::new("eip155:1"), Duration::from_secs(60));
        let schedule = CleanupSchedule { default_interval: Duration::from_secs(300), overrides };
        assert_eq!(schedule.interval_for(&ChainId::new("eip155:1")), Duration::from_secs(60));
        assert_eq!(schedule.interval_for(&ChainId::new("solana:mainnet")), Duration::from_secs(300));
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn poller_starts_a_cleaner_for_a_newly_opened_chain() {
        let manager = Arc::new(ChainDbManager::in_memory());
        let cleaner = Arc::new(PerChainCleaner::new());
        manager.get_chain_db(&ChainId::new("eip155:1")).unwrap();

        let schedule = CleanupSchedule { default_interval: Duration::from_secs(30), overrides: HashMap::new() };
        let _poller = spawn_cleanup_poller(
            Arc::clone(&manager),
            Arc::clone(&cleaner),
            schedule,
            |_chain_id| (Arc::new(|| 0usize) as SweepFn, Arc::new(|| {}) as WalTruncateFn),
            Duration::from_millis(10),
        );

        tokio::time::advance(Duration::from_millis(25)).await;
        tokio::task::yield_now().await;
        assert!(cleaner.is_running(&ChainId::new("eip155:1")));
        cleaner.stop_all();
    }
}
