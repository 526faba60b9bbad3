//! Periodic sweeper tick.
//!
//! Reference: spec.md §4.7 — "Every 30s (configurable), fetches
//! currentBlock from the host ledger, then asks the Event Store for all
//! CONFIRMED ∧ Expiry < currentBlock events."

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_stream::wrappers::IntervalStream;

use crate::sweeper::ExpirySweeper;
use uv_host_ledger_client::HostLedgerClient;

/// Default interval between sweeper passes.
pub const DEFAULT_CHECK_INTERVAL: Duration = Duration::from_secs(30);

/// Spawn a task that calls [`ExpirySweeper::sweep`] once per `interval`,
/// sourcing `currentBlock` from `host_ledger` at each tick and `now` for the
/// current Unix-second timestamp.
pub fn spawn_sweeper_loop(
    sweeper: Arc<ExpirySweeper>,
    host_ledger: Arc<dyn HostLedgerClient>,
    interval: Duration,
    now: impl Fn() -> i64 + Send + 'static,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticks = IntervalStream::new(tokio::time::interval(interval));
        use tokio_stream::StreamExt;
        while ticks.next().await.is_some() {
            let current_block = match host_ledger.get_latest_block_num().await {
                Ok(block) => block,
                Err(err) => {
                    tracing::error!(error = %err, "expiry sweeper could not fetch current block; skipping tick");
                    continue;
                }
            };
            match sweeper.sweep(current_block, now()).await {
                Ok(summary) => tracing::debug!(
                    reverted = summary.reverted,
                    vote_failed = summary.vote_failed,
                    errored = summary.errored,
                    current_block,
                    "expiry sweeper tick"
                ),
                Err(err) => tracing::error!(error = %err, "expiry sweeper tick failed"),
            }
        }
    })
}
