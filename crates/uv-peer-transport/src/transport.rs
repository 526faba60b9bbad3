//! The outbound peer-send port.
//!
//! Reference: spec.md §4.9 — "A send(ctx, peerID, bytes) -> err capability.
//! The core neither defines nor constrains the wire encoding beyond
//! authenticated, best-effort, at-least-once delivery."

use async_trait::async_trait;
use bytes::Bytes;
use shared_types::PeerId;
use thiserror::Error;

/// Errors a [`PeerTransport`] adapter may report.
///
/// Reference: spec.md §7 — "Transient external: ... peer send failure ->
/// retry on next tick."
#[derive(Debug, Error)]
pub enum TransportError {
    /// The peer is not currently reachable (transient; retry).
    #[error("peer {0} unreachable")]
    Unreachable(PeerId),
    /// The underlying connection reported an I/O or protocol error.
    #[error("transport error sending to {peer}: {message}")]
    Send {
        /// Destination peer.
        peer: PeerId,
        /// Adapter-reported error message.
        message: String,
    },
}

/// Authenticated, best-effort, at-least-once point-to-point delivery.
///
/// The receiving end MUST be able to determine the sender's stable
/// peer-ID (spec.md §4.9); that guarantee lives in the concrete adapter,
/// which is out of scope here (§1 excludes wire encoding/transport
/// encryption) — this trait only names the capability boundary.
#[async_trait]
pub trait PeerTransport: Send + Sync {
    /// Send `bytes` to `peer_id`. Callers tolerate duplicate delivery and
    /// do not require ordering across different sessions.
    async fn send(&self, peer_id: &PeerId, bytes: Bytes) -> Result<(), TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct RecordingTransport {
        sent: Mutex<Vec<(PeerId, Bytes)>>,
    }

    #[async_trait]
    impl PeerTransport for RecordingTransport {
        async fn send(&self, peer_id: &PeerId, bytes: Bytes) -> Result<(), TransportError> {
            self.sent.lock().unwrap().push((peer_id.clone(), bytes));
            Ok(())
        }
    }

    #[tokio::test]
    async fn send_records_the_delivery() {
        let transport = RecordingTransport { sent: Mutex::new(vec![]) };
        let peer = PeerId("peer-1".to_string());
        transport.send(&peer, Bytes::from_static(b"hello")).await.unwrap();
        let sent = transport.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, peer);
    }
}
