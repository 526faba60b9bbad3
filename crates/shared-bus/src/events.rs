//! # Validator Events
//!
//! Defines the events that flow across the shared bus between validator
//! subsystems (session manager, coordinator, event store, outbound resolver,
//! expiry sweeper, peer transport). Subsystems publish to announce state
//! changes; other subsystems subscribe to react, instead of calling each
//! other directly.

use serde::{Deserialize, Serialize};
use shared_types::{EventId, EventStatus, EventType, PeerId};

/// All events that can be published to the event bus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ValidatorEvent {
    /// A TSS session was started for an event.
    SessionStarted {
        /// Session identifier.
        session_id: String,
        /// Event the session is processing.
        event_id: EventId,
        /// Protocol this session runs (keygen, sign, ...).
        event_type: EventType,
    },

    /// A TSS session finished successfully.
    SessionCompleted {
        /// Session identifier.
        session_id: String,
        /// Event the session processed.
        event_id: EventId,
    },

    /// A TSS session failed.
    SessionFailed {
        /// Session identifier.
        session_id: String,
        /// Event the session was processing.
        event_id: EventId,
        /// Failure reason.
        reason: String,
    },

    /// A coordinator was elected for an event.
    CoordinatorElected {
        /// Event the coordinator was elected for.
        event_id: EventId,
        /// Elected coordinator.
        coordinator: PeerId,
    },

    /// An event row transitioned between statuses.
    EventStatusChanged {
        /// Event whose status changed.
        event_id: EventId,
        /// Status before the transition.
        from: EventStatus,
        /// Status after the transition.
        to: EventStatus,
    },

    /// An outbound transaction was observed confirmed on the destination chain.
    OutboundResolved {
        /// Internal transaction identifier.
        tx_id: String,
        /// Originating event.
        event_id: EventId,
        /// CAIP-style transaction hash on the destination chain.
        tx_hash: String,
    },

    /// An outbound transaction was reverted or dropped.
    OutboundReverted {
        /// Internal transaction identifier.
        tx_id: String,
        /// Originating event.
        event_id: EventId,
        /// Reason recorded for the revert.
        reason: String,
    },

    /// A message was received from a peer over the transport layer.
    PeerMessageReceived {
        /// Sending peer.
        peer_id: PeerId,
        /// Session the message belongs to.
        session_id: String,
        /// Raw message payload.
        payload: Vec<u8>,
    },

    /// Critical error requiring operator attention.
    CriticalError {
        /// The component that encountered the error.
        component: String,
        /// Error description.
        error: String,
    },
}

impl ValidatorEvent {
    /// Get the topic for this event (for filtering).
    #[must_use]
    pub fn topic(&self) -> EventTopic {
        match self {
            Self::SessionStarted { .. }
            | Self::SessionCompleted { .. }
            | Self::SessionFailed { .. } => EventTopic::SessionLifecycle,
            Self::CoordinatorElected { .. } => EventTopic::Coordinator,
            Self::EventStatusChanged { .. } => EventTopic::EventStore,
            Self::OutboundResolved { .. } | Self::OutboundReverted { .. } => EventTopic::Resolver,
            Self::PeerMessageReceived { .. } => EventTopic::PeerTransport,
            Self::CriticalError { .. } => EventTopic::DeadLetterQueue,
        }
    }

    /// Get the name of the component that originated this event.
    #[must_use]
    pub fn component(&self) -> &str {
        match self {
            Self::SessionStarted { .. }
            | Self::SessionCompleted { .. }
            | Self::SessionFailed { .. } => "session-manager",
            Self::CoordinatorElected { .. } => "coordinator",
            Self::EventStatusChanged { .. } => "event-store",
            Self::OutboundResolved { .. } | Self::OutboundReverted { .. } => "outbound-resolver",
            Self::PeerMessageReceived { .. } => "peer-transport",
            Self::CriticalError { component, .. } => component,
        }
    }
}

/// Event topics for subscription filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventTopic {
    /// TSS session lifecycle events.
    SessionLifecycle,
    /// Coordinator election events.
    Coordinator,
    /// Event store status-transition events.
    EventStore,
    /// Outbound resolver events.
    Resolver,
    /// Peer transport events.
    PeerTransport,
    /// Dead Letter Queue for critical errors.
    DeadLetterQueue,
    /// All events (no filtering).
    All,
}

/// Filter for subscribing to specific events.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    /// Topics to include. Empty means all topics.
    pub topics: Vec<EventTopic>,
}

impl EventFilter {
    /// Create a filter that accepts all events.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Create a filter for specific topics.
    #[must_use]
    pub fn topics(topics: Vec<EventTopic>) -> Self {
        Self { topics }
    }

    /// Check if an event matches this filter.
    #[must_use]
    pub fn matches(&self, event: &ValidatorEvent) -> bool {
        self.topics.is_empty()
            || self.topics.contains(&EventTopic::All)
            || self.topics.contains(&event.topic())
    }
}
