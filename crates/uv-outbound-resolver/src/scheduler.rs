//! Periodic resolver tick.
//!
//! Reference: spec.md §4.6 — "Batches up to 100 BROADCASTED sign events
//! per tick (checkInterval, default 15s)."

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_stream::wrappers::IntervalStream;

use crate::resolver::OutboundResolver;

/// Default interval between resolver passes.
pub const DEFAULT_CHECK_INTERVAL: Duration = Duration::from_secs(15);

/// Spawn a task that calls [`OutboundResolver::resolve_batch`] once per
/// `interval`, using `now` to source the current Unix-second timestamp at
/// each tick.
pub fn spawn_resolver_loop(
    resolver: Arc<OutboundResolver>,
    interval: Duration,
    now: impl Fn() -> i64 + Send + 'static,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticks = IntervalStream::new(tokio::time::interval(interval));
        use tokio_stream::StreamExt;
        while ticks.next().await.is_some() {
            match resolver.resolve_batch(now()).await {
                Ok(summary) => tracing::debug!(
                    completed = summary.completed,
                    reverted = summary.reverted,
                    pending = summary.pending,
                    skipped = summary.skipped,
                    errored = summary.errored,
                    "outbound resolver tick"
                ),
                Err(err) => tracing::error!(error = %err, "outbound resolver tick failed"),
            }
        }
    })
}
