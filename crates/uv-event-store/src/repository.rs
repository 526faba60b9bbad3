//! The `EventStore` itself: a thin domain type over a single-writer sqlite
//! connection, exposing the mandatory operations of spec.md §4.1.

use std::sync::{Arc, Mutex};

use rusqlite::{params, Connection};
use shared_types::{Event, EventId, EventStatus};

use crate::errors::EventStoreError;
use crate::schema::{self, status_to_str};

/// Partial update to an [`Event`] row.
///
/// Reference: spec.md §4.1 — `Update(id, fieldPatch)`: "partial merge; any
/// update that moves Status to a terminal value must also bump updated-at."
#[derive(Debug, Clone, Default)]
pub struct EventPatch {
    /// New status, if changing.
    pub status: Option<EventStatus>,
    /// New block height, if changing.
    pub block_height: Option<u64>,
    /// New expiry block height, if changing.
    pub expiry_block_height: Option<u64>,
    /// New event data payload, if changing.
    pub event_data: Option<Vec<u8>>,
    /// New broadcasted tx hash, if changing.
    pub broadcasted_tx_hash: Option<String>,
    /// New vote tx hash, if changing.
    pub vote_tx_hash: Option<String>,
    /// New last-error message, if changing.
    pub last_error: Option<String>,
}

/// Durable per-chain store for the [`Event`] state machine.
///
/// Wraps a single-writer WAL connection (obtained from `uv-chain-db`'s
/// per-chain handle) behind the operations spec.md §4.1 names. All methods
/// are synchronous (`rusqlite` is blocking); async callers should invoke
/// these through `tokio::task::spawn_blocking`.
pub struct EventStore {
    conn: Arc<Mutex<Connection>>,
}

impl EventStore {
    /// Wrap an existing connection, creating the `events` table if absent.
    pub fn new(conn: Arc<Mutex<Connection>>) -> Result<Self, EventStoreError> {
        {
            let guard = conn.lock().expect("event store connection poisoned");
            schema::ensure_schema(&guard)?;
        }
        Ok(Self { conn })
    }

    fn with_conn<T>(
        &self,
        f: impl FnOnce(&Connection) -> Result<T, EventStoreError>,
    ) -> Result<T, EventStoreError> {
        let guard = self.conn.lock().expect("event store connection poisoned");
        f(&guard)
    }

    /// Insert a new event row.
    ///
    /// **[ADDED]** Not named as a standalone operation in spec.md §4.1, but
    /// required for any caller (inbound watcher, tests) to populate the
    /// table the other seven operations act on.
    pub fn insert_event(&self, event: &Event) -> Result<(), EventStoreError> {
        if !event.respects_height_invariant() {
            return Err(EventStoreError::HeightInvariantViolated(
                event.id.clone(),
                event.block_height,
                event.expiry_block_height,
            ));
        }
        self.with_conn(|conn| schema::insert_event(conn, event))
    }

    /// `GetEvent(id) -> Event | NotFound`.
    pub fn get_event(&self, id: &str) -> Result<Event, EventStoreError> {
        self.with_conn(|conn| schema::get_event(conn, id))
    }

    /// `Update(id, fieldPatch)` — partial merge.
    pub fn update(&self, id: &str, patch: EventPatch, now: i64) -> Result<(), EventStoreError> {
        self.with_conn(|conn| {
            let current = schema::get_event(conn, id)?;
            let next_status = patch.status.unwrap_or(current.status);
            if patch.status.is_some() && !current.status.can_transition_to(next_status) {
                return Err(EventStoreError::IllegalTransition(
                    id.to_string(),
                    current.status,
                    next_status,
                ));
            }
            let next_block_height = patch.block_height.unwrap_or(current.block_height);
            let next_expiry = patch
                .expiry_block_height
                .unwrap_or(current.expiry_block_height);
            if next_block_height > next_expiry {
                return Err(EventStoreError::HeightInvariantViolated(
                    id.to_string(),
                    next_block_height,
                    next_expiry,
                ));
            }

            conn.execute(
                "UPDATE events SET
                    status = ?1, block_height = ?2, expiry_block_height = ?3,
                    event_data = ?4, broadcasted_tx_hash = ?5, vote_tx_hash = ?6,
                    last_error = ?7, updated_at = ?8
                 WHERE id = ?9",
                params![
                    status_to_str(next_status),
                    next_block_height as i64,
                    next_expiry as i64,
                    patch.event_data.unwrap_or(current.event_data),
                    patch.broadcasted_tx_hash.or(current.broadcasted_tx_hash),
                    patch.vote_tx_hash.or(current.vote_tx_hash),
                    patch.last_error.or(current.last_error),
                    now,
                    id,
                ],
            )?;
            Ok(())
        })
    }

    /// `UpdateStatus(id, status, errorMsg)` — disallowed when the row is
    /// already terminal.
    pub fn update_status(
        &self,
        id: &str,
        status: EventStatus,
        error_msg: Option<String>,
        now: i64,
    ) -> Result<(), EventStoreError> {
        self.with_conn(|conn| {
            let current = schema::get_event(conn, id)?;
            if current.status.is_terminal() {
                return Err(EventStoreError::AlreadyTerminal(id.to_string(), current.status));
            }
            if !current.status.can_transition_to(status) {
                return Err(EventStoreError::IllegalTransition(
                    id.to_string(),
                    current.status,
                    status,
                ));
            }
            conn.execute(
                "UPDATE events SET status = ?1, last_error = ?2, updated_at = ?3 WHERE id = ?4",
                params![status_to_str(status), error_msg, now, id],
            )?;
            Ok(())
        })
    }

    /// `UpdateStatusAndBlockHeight(id, status, newBlockHeight)` — atomically
    /// sets both fields so no reader observes a mismatch.
    pub fn update_status_and_block_height(
        &self,
        id: &str,
        status: EventStatus,
        new_block_height: u64,
        now: i64,
    ) -> Result<(), EventStoreError> {
        self.with_conn(|conn| {
            let current = schema::get_event(conn, id)?;
            if !current.status.can_transition_to(status) && current.status != status {
                return Err(EventStoreError::IllegalTransition(
                    id.to_string(),
                    current.status,
                    status,
                ));
            }
            if new_block_height > current.expiry_block_height {
                return Err(EventStoreError::HeightInvariantViolated(
                    id.to_string(),
                    new_block_height,
                    current.expiry_block_height,
                ));
            }
            conn.execute(
                "UPDATE events SET status = ?1, block_height = ?2, updated_at = ?3 WHERE id = ?4",
                params![status_to_str(status), new_block_height as i64, now, id],
            )?;
            Ok(())
        })
    }

    /// `UpdateBroadcastedTxHash(id, caipHash)`.
    pub fn update_broadcasted_tx_hash(
        &self,
        id: &str,
        caip_hash: &str,
        now: i64,
    ) -> Result<(), EventStoreError> {
        self.with_conn(|conn| {
            // Confirm the row exists; the hash is stored even across a
            // subsequent failed broadcast, per spec.md §4.6 idempotency.
            schema::get_event(conn, id)?;
            conn.execute(
                "UPDATE events SET broadcasted_tx_hash = ?1, updated_at = ?2 WHERE id = ?3",
                params![caip_hash, now, id],
            )?;
            Ok(())
        })
    }

    /// `GetExpiredConfirmedEvents(currentBlock, batch)` — FIFO by
    /// `ExpiryBlockHeight`.
    pub fn get_expired_confirmed_events(
        &self,
        current_block: u64,
        batch: usize,
    ) -> Result<Vec<Event>, EventStoreError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT * FROM events WHERE status = 'CONFIRMED' AND expiry_block_height < ?1
                 ORDER BY expiry_block_height ASC LIMIT ?2",
            )?;
            let rows = stmt
                .query_map(params![current_block as i64, batch as i64], schema::row_to_event)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// `GetBroadcastedSignEvents(batch)`.
    pub fn get_broadcasted_sign_events(&self, batch: usize) -> Result<Vec<Event>, EventStoreError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT * FROM events WHERE status = 'BROADCASTED' AND event_type = 'SIGN'
                 LIMIT ?1",
            )?;
            let rows = stmt
                .query_map(params![batch as i64], schema::row_to_event)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// `DeleteOldConfirmedTransactions(retention)` — removes `COMPLETED`
    /// rows older than `now - retention`; all other statuses are exempt.
    pub fn delete_old_confirmed_transactions(
        &self,
        retention_seconds: i64,
        now: i64,
    ) -> Result<usize, EventStoreError> {
        self.with_conn(|conn| {
            let cutoff = now - retention_seconds;
            let deleted = conn.execute(
                "DELETE FROM events WHERE status = 'COMPLETED' AND updated_at < ?1",
                params![cutoff],
            )?;
            Ok(deleted)
        })
    }
}

/// Convenience alias matching spec.md's `EventID` naming.
pub type EventIdRef<'a> = &'a EventId;

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::{ChainId, ConfirmationType, EventType};

    fn store() -> EventStore {
        let conn = Connection::open_in_memory().unwrap();
        EventStore::new(Arc::new(Mutex::new(conn))).unwrap()
    }

    fn sample(id: &str, status: EventStatus, event_type: EventType) -> Event {
        Event {
            id: id.to_string(),
            block_height: 10,
            expiry_block_height: 100,
            event_type,
            confirmation_type: ConfirmationType::Standard,
            status,
            event_data: b"{}".to_vec(),
            broadcasted_tx_hash: None,
            vote_tx_hash: None,
            last_error: None,
            created_at: 0,
            updated_at: 0,
        }
    }

    #[test]
    fn get_event_round_trips() {
        let store = store();
        let ev = sample("e1", EventStatus::Pending, EventType::Sign);
        store.insert_event(&ev).unwrap();
        let fetched = store.get_event("e1").unwrap();
        assert_eq!(fetched.id, "e1");
        assert_eq!(fetched.status, EventStatus::Pending);
    }

    #[test]
    fn get_event_missing_is_not_found() {
        let store = store();
        assert!(matches!(store.get_event("missing"), Err(EventStoreError::NotFound(_))));
    }

    #[test]
    fn update_status_rejects_terminal_rows() {
        let store = store();
        let mut ev = sample("e1", EventStatus::Broadcasted, EventType::Sign);
        ev.status = EventStatus::Completed;
        store.insert_event(&ev).unwrap();
        let result = store.update_status(&ev.id, EventStatus::Reverted, None, 1);
        assert!(matches!(result, Err(EventStoreError::AlreadyTerminal(_, _))));
    }

    #[test]
    fn update_status_and_block_height_is_atomic() {
        let store = store();
        let ev = sample("e1", EventStatus::Pending, EventType::Sign);
        store.insert_event(&ev).unwrap();
        store
            .update_status_and_block_height(&ev.id, EventStatus::Pending, 50, 5)
            .unwrap();
        let fetched = store.get_event("e1").unwrap();
        assert_eq!(fetched.block_height, 50);
        assert_eq!(fetched.status, EventStatus::Pending);
    }

    #[test]
    fn update_broadcasted_tx_hash_survives_a_later_failed_broadcast() {
        let store = store();
        let mut ev = sample("e1", EventStatus::InProgress, EventType::Sign);
        ev.status = EventStatus::Broadcasted;
        store.insert_event(&ev).unwrap();
        store
            .update_broadcasted_tx_hash(&ev.id, "eip155:1:0xabc", 2)
            .unwrap();
        let fetched = store.get_event("e1").unwrap();
        assert_eq!(fetched.broadcasted_tx_hash.as_deref(), Some("eip155:1:0xabc"));
    }

    #[test]
    fn get_expired_confirmed_events_filters_and_orders() {
        let store = store();
        let mut e1 = sample("e1", EventStatus::Confirmed, EventType::Sign);
        e1.expiry_block_height = 50;
        let mut e2 = sample("e2", EventStatus::Confirmed, EventType::Sign);
        e2.expiry_block_height = 30;
        let e3 = sample("e3", EventStatus::Pending, EventType::Sign);
        store.insert_event(&e1).unwrap();
        store.insert_event(&e2).unwrap();
        store.insert_event(&e3).unwrap();

        let expired = store.get_expired_confirmed_events(100, 10).unwrap();
        assert_eq!(expired.len(), 2);
        assert_eq!(expired[0].id, "e2");
        assert_eq!(expired[1].id, "e1");
    }

    #[test]
    fn get_broadcasted_sign_events_excludes_other_types_and_statuses() {
        let store = store();
        let mut sign_broadcasted = sample("e1", EventStatus::Broadcasted, EventType::Sign);
        sign_broadcasted.event_data =
            serde_json::to_vec(&ChainId::new("eip155:1")).unwrap();
        let key_broadcasted = sample("e2", EventStatus::InProgress, EventType::Keygen);
        store.insert_event(&sign_broadcasted).unwrap();
        store.insert_event(&key_broadcasted).unwrap();

        let rows = store.get_broadcasted_sign_events(10).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, "e1");
    }

    #[test]
    fn delete_old_confirmed_transactions_only_touches_completed_rows() {
        let store = store();
        let mut completed_old = sample("e1", EventStatus::Broadcasted, EventType::Sign);
        completed_old.status = EventStatus::Completed;
        completed_old.updated_at = 0;
        let mut completed_recent = sample("e2", EventStatus::Broadcasted, EventType::Sign);
        completed_recent.status = EventStatus::Completed;
        completed_recent.updated_at = 1000;
        let reverted = sample("e3", EventStatus::Confirmed, EventType::Sign);
        let mut reverted = reverted;
        reverted.status = EventStatus::Reverted;
        reverted.updated_at = 0;

        store.insert_event(&completed_old).unwrap();
        store.insert_event(&completed_recent).unwrap();
        store.insert_event(&reverted).unwrap();

        let deleted = store.delete_old_confirmed_transactions(100, 1000).unwrap();
        assert_eq!(deleted, 1);
        assert!(store.get_event("e1").is_err());
        assert!(store.get_event("e2").is_ok());
        assert!(store.get_event("e3").is_ok());
    }

    #[test]
    fn delete_old_confirmed_transactions_zero_retention_deletes_all_completed() {
        let store = store();
        let mut ev = sample("e1", EventStatus::Broadcasted, EventType::Sign);
        ev.status = EventStatus::Completed;
        ev.updated_at = 999;
        store.insert_event(&ev).unwrap();

        let deleted = store.delete_old_confirmed_transactions(0, 1000).unwrap();
        assert_eq!(deleted, 1);
    }

    #[test]
    fn insert_rejects_height_invariant_violation() {
        let store = store();
        let mut ev = sample("e1", EventStatus::Pending, EventType::Sign);
        ev.block_height = 200;
        ev.expiry_block_height = 100;
        assert!(matches!(
            store.insert_event(&ev),
            Err(EventStoreError::HeightInvariantViolated(_, _, _))
        ));
    }
}
