//! The active-session registry.
//!
//! Reference: spec.md §4.3 — "The session registry map is protected by a
//! RW mutex; readers are the hot path."

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use shared_types::EventId;

use crate::state::SessionHandle;

/// `Arc<RwLock<HashMap<EventId, SessionHandle>>>`, as named directly by
/// spec.md §4.3's ADDED registry note.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<EventId, Arc<SessionHandle>>>,
}

impl SessionRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a session for `event_id`, unless one is already present.
    ///
    /// Returns `false` without replacing anything when a session already
    /// exists — the caller (setup flow) treats this as "silently ignore
    /// the duplicate setup" per spec.md §4.3 step 4.
    pub fn insert_if_absent(&self, event_id: EventId, handle: SessionHandle) -> bool {
        let mut sessions = self.sessions.write();
        if sessions.contains_key(&event_id) {
            return false;
        }
        sessions.insert(event_id, Arc::new(handle));
        true
    }

    /// Fetch the session for `event_id`, if any.
    pub fn get(&self, event_id: &str) -> Option<Arc<SessionHandle>> {
        self.sessions.read().get(event_id).cloned()
    }

    /// Remove and return the session for `event_id` (session close or
    /// expiry).
    pub fn remove(&self, event_id: &str) -> Option<Arc<SessionHandle>> {
        self.sessions.write().remove(event_id)
    }

    /// `true` if a session is registered for `event_id`.
    pub fn contains(&self, event_id: &str) -> bool {
        self.sessions.read().contains_key(event_id)
    }

    /// Event IDs of every session whose `expiry_time` is strictly before
    /// `now` (Unix seconds).
    pub fn expired_before(&self, now: i64) -> Vec<EventId> {
        self.sessions
            .read()
            .iter()
            .filter(|(_, handle)| handle.meta.expiry_time < now)
            .map(|(id, _)| id.clone())
            .collect()
    }

    /// Number of currently registered sessions.
    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    /// `true` if no sessions are registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
