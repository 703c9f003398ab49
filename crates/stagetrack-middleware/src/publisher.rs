//! Outbound position publishing.
//!
//! The tracker hands each emitted [`NormalizedPosition`] to a [`Publisher`].
//! [`UdpPublisher`] encodes it with [`encode_position`] and fires it at the
//! configured target as a single datagram.  Nothing is acknowledged or
//! retried; the next scan's datagram supersedes a lost one.

use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};

use async_trait::async_trait;
use stagetrack_types::{NormalizedPosition, TrackError};
use tokio::net::UdpSocket;
use tracing::{info, trace};

use crate::wire::encode_position;

/// Sink for emitted positions.
#[async_trait]
pub trait Publisher: Send + Sync {
    /// Deliver one position report.
    ///
    /// # Errors
    ///
    /// Returns [`TrackError::Publish`] if the report could not be handed to
    /// the transport.
    async fn publish(&self, position: NormalizedPosition) -> Result<(), TrackError>;
}

/// Sends one text datagram per position to a fixed UDP target.
#[derive(Debug)]
pub struct UdpPublisher {
    socket: UdpSocket,
    target: SocketAddr,
}

impl UdpPublisher {
    /// Bind an ephemeral local socket suitable for reaching `target`.
    ///
    /// # Errors
    ///
    /// Returns [`TrackError::Publish`] if the local socket cannot be bound.
    pub async fn bind(target: SocketAddr) -> Result<Self, TrackError> {
        let local: SocketAddr = match target {
            SocketAddr::V4(_) => (Ipv4Addr::UNSPECIFIED, 0).into(),
            SocketAddr::V6(_) => (Ipv6Addr::UNSPECIFIED, 0).into(),
        };
        let socket = UdpSocket::bind(local)
            .await
            .map_err(|e| TrackError::Publish(format!("failed to bind UDP socket: {e}")))?;
        info!(target_addr = %target, "UDP publisher ready");
        Ok(Self { socket, target })
    }

    /// Resolve `host:port` (first address wins) and [`bind`][Self::bind].
    ///
    /// # Errors
    ///
    /// Returns [`TrackError::InvalidConfig`] if the host does not resolve,
    /// or [`TrackError::Publish`] if binding fails.
    pub async fn resolve(host: &str, port: u16) -> Result<Self, TrackError> {
        let target = tokio::net::lookup_host((host, port))
            .await
            .map_err(|e| TrackError::InvalidConfig(format!("cannot resolve {host}:{port}: {e}")))?
            .next()
            .ok_or_else(|| TrackError::InvalidConfig(format!("{host}:{port} has no addresses")))?;
        Self::bind(target).await
    }

    pub fn target(&self) -> SocketAddr {
        self.target
    }
}

#[async_trait]
impl Publisher for UdpPublisher {
    async fn publish(&self, position: NormalizedPosition) -> Result<(), TrackError> {
        let message = encode_position(&position);
        self.socket
            .send_to(message.as_bytes(), self.target)
            .await
            .map_err(|e| TrackError::Publish(format!("send to {} failed: {e}", self.target)))?;
        trace!(target: "stagetrack::wire", %message, "datagram sent");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::decode_position;
    use std::time::Duration;

    async fn receiver() -> (UdpSocket, SocketAddr) {
        let sock = UdpSocket::bind((Ipv4Addr::LOCALHOST, 0)).await.expect("bind receiver");
        let addr = sock.local_addr().expect("local addr");
        (sock, addr)
    }

    async fn recv_text(sock: &UdpSocket) -> String {
        let mut buf = [0u8; 64];
        let (n, _) = tokio::time::timeout(Duration::from_secs(2), sock.recv_from(&mut buf))
            .await
            .expect("datagram within timeout")
            .expect("recv");
        String::from_utf8(buf[..n].to_vec()).expect("utf-8")
    }

    #[tokio::test]
    async fn publishes_one_datagram_per_position() {
        let (rx, addr) = receiver().await;
        let publisher = UdpPublisher::bind(addr).await.expect("bind publisher");
        assert_eq!(publisher.target(), addr);

        publisher.publish(NormalizedPosition::new(0.5312, 0.7845)).await.unwrap();
        publisher.publish(NormalizedPosition::new(0.0, 1.0)).await.unwrap();

        assert_eq!(recv_text(&rx).await, "0.531200 0.784500");
        assert_eq!(recv_text(&rx).await, "0.000000 1.000000");
    }

    #[tokio::test]
    async fn received_datagram_decodes_to_published_position() {
        let (rx, addr) = receiver().await;
        let publisher = UdpPublisher::resolve("127.0.0.1", addr.port()).await.expect("resolve");

        let sent = NormalizedPosition::new(0.666667, 0.583333);
        publisher.publish(sent).await.unwrap();

        let got = decode_position(recv_text(&rx).await.as_bytes()).unwrap();
        assert!((got.x - sent.x).abs() < 1e-9);
        assert!((got.y - sent.y).abs() < 1e-9);
    }
}
