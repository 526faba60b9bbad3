//! Batched reversion of expired `CONFIRMED` events.
//!
//! Reference: spec.md §4.7.

use std::sync::Arc;

use shared_types::{Event, EventStatus, EventType, OutboundCreatedEvent};
use uv_event_store::{EventPatch, EventStore};
use uv_host_ledger_client::{HostLedgerClient, Observation};

use crate::errors::SweeperError;

/// Rows swept per tick.
///
/// Reference: spec.md §4.7 — "in batches of 100."
pub const DEFAULT_BATCH_SIZE: usize = 100;

/// Reason recorded on the refund vote for a `SIGN` event that expired
/// before a TSS session could even start.
///
/// Reference: spec.md §4.7.
pub const EXPIRY_ERROR_MSG: &str = "event expired before TSS could start";

/// One event's outcome in a sweep pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Marked `REVERTED` (key event, or sign event whose refund vote
    /// succeeded).
    Reverted,
    /// A sign event's refund vote failed; left `CONFIRMED` for the next
    /// tick.
    VoteFailed,
}

/// Tally of a [`ExpirySweeper::sweep`] pass, for logging and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepSummary {
    /// Rows marked `REVERTED`.
    pub reverted: usize,
    /// Rows left `CONFIRMED` after a failed refund vote.
    pub vote_failed: usize,
    /// Rows whose sweep attempt itself errored (logged, retried next
    /// tick).
    pub errored: usize,
}

/// Reverts `CONFIRMED` events whose `ExpiryBlockHeight` has passed,
/// refunding `SIGN` events via a failure vote before marking them
/// `REVERTED`.
pub struct ExpirySweeper {
    event_store: Arc<EventStore>,
    host_ledger: Arc<dyn HostLedgerClient>,
    batch_size: usize,
}

impl ExpirySweeper {
    /// Construct a sweeper with the default batch size.
    pub fn new(event_store: Arc<EventStore>, host_ledger: Arc<dyn HostLedgerClient>) -> Self {
        Self { event_store, host_ledger, batch_size: DEFAULT_BATCH_SIZE }
    }

    /// Override the per-tick batch size (spec.md default 100).
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Sweep up to `batch_size` expired `CONFIRMED` events.
    pub async fn sweep(&self, current_block: u64, now: i64) -> Result<SweepSummary, SweeperError> {
        let events = self.event_store.get_expired_confirmed_events(current_block, self.batch_size)?;
        let mut summary = SweepSummary::default();
        for event in events {
            match self.sweep_one(&event, now).await {
                Ok(Outcome::Reverted) => summary.reverted += 1,
                Ok(Outcome::VoteFailed) => summary.vote_failed += 1,
                Err(err) => {
                    tracing::warn!(event_id = %event.id, error = %err, "failed to sweep expired event; retrying next tick");
                    summary.errored += 1;
                }
            }
        }
        Ok(summary)
    }

    async fn sweep_one(&self, event: &Event, now: i64) -> Result<Outcome, SweeperError> {
        if event.event_type != EventType::Sign {
            // Reference: spec.md §4.7 — "For key events: mark REVERTED
            // directly — no outbound exists to vote on."
            self.event_store.update_status(&event.id, EventStatus::Reverted, None, now)?;
            return Ok(Outcome::Reverted);
        }

        let outbound = OutboundCreatedEvent::from_event_data(&event.event_data)
            .map_err(|err| SweeperError::MalformedEventData(event.id.clone(), err))?;
        let observation = Observation::protocol_drop(EXPIRY_ERROR_MSG);

        match self
            .host_ledger
            .vote_outbound(&outbound.tx_id, &outbound.universal_tx_id, &observation)
            .await
        {
            Ok(vote_tx_hash) => {
                self.event_store.update(
                    &event.id,
                    EventPatch {
                        status: Some(EventStatus::Reverted),
                        vote_tx_hash: Some(vote_tx_hash),
                        last_error: observation.error_msg.clone(),
                        ..Default::default()
                    },
                    now,
                )?;
                Ok(Outcome::Reverted)
            }
            Err(err) => {
                // Idempotent retry: leave the row CONFIRMED so the next
                // tick attempts the same vote again.
                tracing::warn!(event_id = %event.id, error = %err, "expiry refund vote rejected; retrying next tick");
                Ok(Outcome::VoteFailed)
            }
        }
    }
}
