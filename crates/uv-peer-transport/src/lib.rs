//! Peer wire message envelope and the outbound send port.
//!
//! Reference: spec.md §4.9, §6.1.

mod message;
mod transport;

pub use message::{MessageType, UnsignedOutboundTxReq, WireMessage};
pub use transport::{PeerTransport, TransportError};
