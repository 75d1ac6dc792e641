//! The transport a handshake runs over.
//!
//! The protocol assumes only that messages arrive reliably and in order.
//! It assumes nothing about confidentiality or integrity: an attacker may
//! read, drop or replace any message, and the roles are built to notice or
//! to make the substitution useless.

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::HandshakeError;

/// A reliable, ordered, unauthenticated message pipe.
#[async_trait]
pub trait Channel: Send {
    async fn send(&mut self, message: Vec<u8>) -> Result<(), HandshakeError>;

    async fn receive(&mut self) -> Result<Vec<u8>, HandshakeError>;
}

/// One end of an in-process duplex link.
///
/// Backed by unbounded tokio channels. Each message is delivered exactly
/// once, in order. Dropping one end makes the other fail with
/// [`HandshakeError::ChannelClosed`].
#[derive(Debug)]
pub struct MemoryChannel {
    outbound: mpsc::UnboundedSender<Vec<u8>>,
    inbound: mpsc::UnboundedReceiver<Vec<u8>>,
}

impl MemoryChannel {
    /// Two connected ends.
    pub fn pair() -> (Self, Self) {
        let (a_tx, a_rx) = mpsc::unbounded_channel();
        let (b_tx, b_rx) = mpsc::unbounded_channel();
        (
            Self {
                outbound: a_tx,
                inbound: b_rx,
            },
            Self {
                outbound: b_tx,
                inbound: a_rx,
            },
        )
    }
}

#[async_trait]
impl Channel for MemoryChannel {
    async fn send(&mut self, message: Vec<u8>) -> Result<(), HandshakeError> {
        self.outbound
            .send(message)
            .map_err(|_| HandshakeError::ChannelClosed)
    }

    async fn receive(&mut self) -> Result<Vec<u8>, HandshakeError> {
        self.inbound.recv().await.ok_or(HandshakeError::ChannelClosed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_messages_arrive_in_order() {
        let (mut a, mut b) = MemoryChannel::pair();
        a.send(vec![1]).await.unwrap();
        a.send(vec![2]).await.unwrap();
        b.send(vec![9]).await.unwrap();

        assert_eq!(b.receive().await.unwrap(), vec![1]);
        assert_eq!(b.receive().await.unwrap(), vec![2]);
        assert_eq!(a.receive().await.unwrap(), vec![9]);
    }

    #[tokio::test]
    async fn test_dropped_peer_closes_channel() {
        let (mut a, b) = MemoryChannel::pair();
        drop(b);
        assert!(matches!(
            a.send(vec![1]).await,
            Err(HandshakeError::ChannelClosed)
        ));
        assert!(matches!(
            a.receive().await,
            Err(HandshakeError::ChannelClosed)
        ));
    }
}
