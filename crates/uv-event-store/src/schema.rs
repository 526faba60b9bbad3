//! The `events` table DDL and row (de)serialization.
//!
//! Reference: spec.md §6.2 — "Columns as in §3. Deleting from this table
//! requires no foreign-key cascade because no other table references
//! Events."

use rusqlite::{params, Connection, OptionalExtension, Row};
use shared_types::{ConfirmationType, Event, EventStatus, EventType};

use crate::errors::EventStoreError;

pub(crate) const CREATE_TABLE_SQL: &str = "
CREATE TABLE IF NOT EXISTS events (
    id                   TEXT PRIMARY KEY,
    block_height         INTEGER NOT NULL,
    expiry_block_height  INTEGER NOT NULL,
    event_type           TEXT NOT NULL,
    confirmation_type    TEXT NOT NULL,
    status               TEXT NOT NULL,
    event_data           BLOB NOT NULL,
    broadcasted_tx_hash  TEXT,
    vote_tx_hash         TEXT,
    last_error           TEXT,
    created_at           INTEGER NOT NULL,
    updated_at           INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_events_status_expiry ON events (status, expiry_block_height);
CREATE INDEX IF NOT EXISTS idx_events_status_type ON events (status, event_type);
";

pub(crate) fn ensure_schema(conn: &Connection) -> Result<(), EventStoreError> {
    conn.execute_batch(CREATE_TABLE_SQL)?;
    Ok(())
}

fn event_type_to_str(t: EventType) -> &'static str {
    match t {
        EventType::Keygen => "KEYGEN",
        EventType::Keyrefresh => "KEYREFRESH",
        EventType::QuorumChange => "QUORUM_CHANGE",
        EventType::Sign => "SIGN",
    }
}

fn event_type_from_str(s: &str) -> rusqlite::Result<EventType> {
    match s {
        "KEYGEN" => Ok(EventType::Keygen),
        "KEYREFRESH" => Ok(EventType::Keyrefresh),
        "QUORUM_CHANGE" => Ok(EventType::QuorumChange),
        "SIGN" => Ok(EventType::Sign),
        other => Err(rusqlite::Error::InvalidColumnType(
            3,
            format!("unknown event_type {other:?}"),
            rusqlite::types::Type::Text,
        )),
    }
}

fn confirmation_type_to_str(t: ConfirmationType) -> &'static str {
    match t {
        ConfirmationType::Fast => "FAST",
        ConfirmationType::Standard => "STANDARD",
    }
}

fn confirmation_type_from_str(s: &str) -> rusqlite::Result<ConfirmationType> {
    match s {
        "FAST" => Ok(ConfirmationType::Fast),
        "STANDARD" => Ok(ConfirmationType::Standard),
        other => Err(rusqlite::Error::InvalidColumnType(
            4,
            format!("unknown confirmation_type {other:?}"),
            rusqlite::types::Type::Text,
        )),
    }
}

pub(crate) fn status_to_str(s: EventStatus) -> &'static str {
    match s {
        EventStatus::Pending => "PENDING",
        EventStatus::Confirmed => "CONFIRMED",
        EventStatus::InProgress => "IN_PROGRESS",
        EventStatus::Completed => "COMPLETED",
        EventStatus::Broadcasted => "BROADCASTED",
        EventStatus::Reverted => "REVERTED",
        EventStatus::Success => "SUCCESS",
    }
}

fn status_from_str(s: &str) -> rusqlite::Result<EventStatus> {
    match s {
        "PENDING" => Ok(EventStatus::Pending),
        "CONFIRMED" => Ok(EventStatus::Confirmed),
        "IN_PROGRESS" => Ok(EventStatus::InProgress),
        "COMPLETED" => Ok(EventStatus::Completed),
        "BROADCASTED" => Ok(EventStatus::Broadcasted),
        "REVERTED" => Ok(EventStatus::Reverted),
        "SUCCESS" => Ok(EventStatus::Success),
        other => Err(rusqlite::Error::InvalidColumnType(
            5,
            format!("unknown status {other:?}"),
            rusqlite::types::Type::Text,
        )),
    }
}

pub(crate) fn row_to_event(row: &Row<'_>) -> rusqlite::Result<Event> {
    Ok(Event {
        id: row.get(0)?,
        block_height: row.get::<_, i64>(1)? as u64,
        expiry_block_height: row.get::<_, i64>(2)? as u64,
        event_type: event_type_from_str(&row.get::<_, String>(3)?)?,
        confirmation_type: confirmation_type_from_str(&row.get::<_, String>(4)?)?,
        status: status_from_str(&row.get::<_, String>(5)?)?,
        event_data: row.get(6)?,
        broadcasted_tx_hash: row.get(7)?,
        vote_tx_hash: row.get(8)?,
        last_error: row.get(9)?,
        created_at: row.get(10)?,
        updated_at: row.get(11)?,
    })
}

pub(crate) fn insert_event(conn: &Connection, event: &Event) -> Result<(), EventStoreError> {
    conn.execute(
        "INSERT INTO events (
            id, block_height, expiry_block_height, event_type, confirmation_type,
            status, event_data, broadcasted_tx_hash, vote_tx_hash, last_error,
            created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        params![
            event.id,
            event.block_height as i64,
            event.expiry_block_height as i64,
            event_type_to_str(event.event_type),
            confirmation_type_to_str(event.confirmation_type),
            status_to_str(event.status),
            event.event_data,
            event.broadcasted_tx_hash,
            event.vote_tx_hash,
            event.last_error,
            event.created_at,
            event.updated_at,
        ],
    )?;
    Ok(())
}

pub(crate) fn get_event(conn: &Connection, id: &str) -> Result<Event, EventStoreError> {
    conn.query_row("SELECT * FROM events WHERE id = ?1", params![id], row_to_event)
        .optional()?
        .ok_or_else(|| EventStoreError::NotFound(id.to_string()))
}
