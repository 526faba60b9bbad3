//! # Shared Bus - Event Bus for Inter-Subsystem Communication
//!
//! An in-process publish/subscribe bus that lets the validator subsystems
//! (session manager, coordinator, event store, outbound resolver, expiry
//! sweeper, peer transport) announce state changes without calling each
//! other directly. A subsystem publishes a `ValidatorEvent`; any number of
//! other subsystems subscribe with an `EventFilter` to react to it.
//!
//! ```text
//! ┌────────────────┐                      ┌──────────────────┐
//! │ Session Manager │    publish()         │ Event Store       │
//! │                 │ ──────┐              │                   │
//! └────────────────┘       │              └──────────────────┘
//!                          ▼                      ↑
//!                    ┌──────────────┐              │
//!                    │  Event Bus   │ ─────────────┘
//!                    └──────────────┘   subscribe()
//! ```
//!
//! ## Security
//!
//! - **Time-Bounded Nonce Cache:** replay prevention for inbound peer
//!   messages before they are handed to the session manager.
//! - **Dead Letter Queue:** critical errors are published on their own
//!   topic so a supervisor can subscribe without coupling to every
//!   subsystem's error type.

// Nursery lints that are too strict
#![allow(clippy::missing_const_for_fn)]
// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod events;
pub mod nonce_cache;
pub mod publisher;
pub mod subscriber;

// Re-export main types
pub use events::{EventFilter, EventTopic, ValidatorEvent};
pub use nonce_cache::TimeBoundedNonceCache;
pub use publisher::{EventPublisher, InMemoryEventBus};
pub use subscriber::{EventStream, EventSubscriber, Subscription, SubscriptionError};

/// Current protocol version for event bus messages.
pub const PROTOCOL_VERSION: u16 = 1;

/// Maximum events to buffer per subscriber before backpressure.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1000;

/// Dead Letter Queue topic for failed messages.
pub const DLQ_TOPIC: &str = "dlq.critical";
