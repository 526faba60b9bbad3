//! TSS session lifecycle: setup/step/begin message handling, session
//! completion, and the expiry sweep.
//!
//! Reference: spec.md §4.3.

mod dkls;
mod errors;
mod manager;
mod ports;
mod registry;
mod state;

pub use dkls::{DklsSession, DklsSessionFactory, OutgoingMessage, SessionResult, StepOutcome};
pub use errors::SessionError;
pub use manager::{SessionManager, SessionManagerConfig, DEFAULT_BLOCK_DELAY, DEFAULT_CHECK_INTERVAL, DEFAULT_SESSION_TTL};
pub use ports::{KeyshareStore, OutboundBroadcaster, SignSetupVerifier};
pub use registry::SessionRegistry;
pub use state::{CachedSigningRequest, SessionHandle, SessionMeta};
