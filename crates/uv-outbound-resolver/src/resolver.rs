//! Batched resolution of `BROADCASTED` sign events.
//!
//! Reference: spec.md §4.6.

use std::sync::Arc;

use shared_types::{parse_caip_tx_hash, ChainFamily, Event, EventStatus, OutboundCreatedEvent};
use uv_event_store::{EventPatch, EventStore};
use uv_host_ledger_client::{HostLedgerClient, Observation};
use uv_signing_verifier::{BroadcastStatus, BuilderRegistry};

use crate::errors::ResolverError;
use crate::tracker::{NotFoundTracker, DEFAULT_MAX_NOT_FOUND_RETRIES};

/// Rows resolved per tick.
///
/// Reference: spec.md §4.6 — "Batches up to 100 BROADCASTED sign events
/// per tick."
pub const DEFAULT_BATCH_SIZE: usize = 100;

/// One event's outcome in a resolve pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Marked `COMPLETED`.
    Completed,
    /// Marked `REVERTED` after a failure vote.
    Reverted,
    /// Not yet confirmed, or below standard confirmation depth; retry
    /// next tick.
    Pending,
    /// No builder configured for this chain; skipped this tick.
    Skipped,
}

/// Tally of a [`OutboundResolver::resolve_batch`] pass, for logging and
/// tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolveSummary {
    /// Rows marked `COMPLETED`.
    pub completed: usize,
    /// Rows marked `REVERTED`.
    pub reverted: usize,
    /// Rows left `BROADCASTED` for the next tick.
    pub pending: usize,
    /// Rows skipped (no builder configured).
    pub skipped: usize,
    /// Rows whose resolution attempt itself errored (logged, retried
    /// next tick).
    pub errored: usize,
}

/// Polls destination-chain receipts for `BROADCASTED` sign events and
/// classifies each as completed, reverted, or still pending.
pub struct OutboundResolver {
    event_store: Arc<EventStore>,
    host_ledger: Arc<dyn HostLedgerClient>,
    builders: Arc<dyn BuilderRegistry>,
    not_found: NotFoundTracker,
    batch_size: usize,
    max_not_found_retries: u32,
}

impl OutboundResolver {
    /// Construct a resolver with the default batch size and not-found
    /// retry budget.
    pub fn new(
        event_store: Arc<EventStore>,
        host_ledger: Arc<dyn HostLedgerClient>,
        builders: Arc<dyn BuilderRegistry>,
    ) -> Self {
        Self {
            event_store,
            host_ledger,
            builders,
            not_found: NotFoundTracker::new(),
            batch_size: DEFAULT_BATCH_SIZE,
            max_not_found_retries: DEFAULT_MAX_NOT_FOUND_RETRIES,
        }
    }

    /// Override the per-tick batch size (spec.md default 100).
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Override the consecutive-not-found threshold (spec.md default 10).
    pub fn with_max_not_found_retries(mut self, max: u32) -> Self {
        self.max_not_found_retries = max;
        self
    }

    /// Resolve up to `batch_size` `BROADCASTED` sign events.
    pub async fn resolve_batch(&self, now: i64) -> Result<ResolveSummary, ResolverError> {
        let events = self.event_store.get_broadcasted_sign_events(self.batch_size)?;
        let mut summary = ResolveSummary::default();
        for event in events {
            match self.resolve_one(&event, now).await {
                Ok(Outcome::Completed) => summary.completed += 1,
                Ok(Outcome::Reverted) => summary.reverted += 1,
                Ok(Outcome::Pending) => summary.pending += 1,
                Ok(Outcome::Skipped) => summary.skipped += 1,
                Err(err) => {
                    tracing::warn!(event_id = %event.id, error = %err, "failed to resolve broadcasted event; retrying next tick");
                    summary.errored += 1;
                }
            }
        }
        Ok(summary)
    }

    async fn resolve_one(&self, event: &Event, now: i64) -> Result<Outcome, ResolverError> {
        let caip_hash = event
            .broadcasted_tx_hash
            .as_deref()
            .ok_or_else(|| ResolverError::MissingBroadcastHash(event.id.clone()))?;
        let (chain_id, raw_hash) = parse_caip_tx_hash(caip_hash)
            .map_err(|err| ResolverError::MalformedHash(event.id.clone(), err.to_string()))?;

        if chain_id.family() == ChainFamily::Svm {
            // Reference: spec.md §4.6 "SVM path" — a Solana-style chain
            // always mutates its nonce whether the tx succeeded or
            // reverted; semantic failure is observed via the
            // destination-chain inbound watcher's voting path instead.
            self.event_store.update_status(&event.id, EventStatus::Completed, None, now)?;
            self.not_found.clear(&event.id);
            return Ok(Outcome::Completed);
        }

        let Some(builder) = self.builders.get(&chain_id) else {
            tracing::warn!(event_id = %event.id, %chain_id, "no transaction builder configured; skipping this tick");
            return Ok(Outcome::Skipped);
        };

        match builder
            .verify_broadcasted_tx(raw_hash)
            .await
            .map_err(|err| ResolverError::Builder(event.id.clone(), err))?
        {
            BroadcastStatus::NotFound => {
                let count = self.not_found.note_not_found(&event.id, self.max_not_found_retries);
                if count < self.max_not_found_retries {
                    return Ok(Outcome::Pending);
                }
                let observation = Observation::protocol_drop("broadcast never observed on destination chain");
                self.vote_failure_and_revert(event, observation, now).await
            }
            BroadcastStatus::Pending { .. } => Ok(Outcome::Pending),
            BroadcastStatus::Confirmed { block_height, success, .. } => {
                self.not_found.clear(&event.id);
                if success {
                    self.event_store.update_status(&event.id, EventStatus::Completed, None, now)?;
                    Ok(Outcome::Completed)
                } else {
                    let observation = Observation::failure_with_tx(
                        raw_hash,
                        block_height,
                        "destination-chain execution reverted",
                    )
                    .expect("non-empty raw_hash and non-zero block_height");
                    self.vote_failure_and_revert(event, observation, now).await
                }
            }
        }
    }

    async fn vote_failure_and_revert(
        &self,
        event: &Event,
        observation: Observation,
        now: i64,
    ) -> Result<Outcome, ResolverError> {
        let outbound = OutboundCreatedEvent::from_event_data(&event.event_data)
            .map_err(|err| ResolverError::MalformedEventData(event.id.clone(), err))?;

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
                self.not_found.clear(&event.id);
                Ok(Outcome::Reverted)
            }
            Err(err) => {
                // Idempotent retry: the event stays BROADCASTED and the
                // not-found counter stays saturated, so the next tick
                // attempts the same vote again.
                tracing::warn!(event_id = %event.id, error = %err, "failure vote rejected; retrying next tick");
                Ok(Outcome::Pending)
            }
        }
    }
}
