//! UDP broadcast link.
//!
//! Stands in for the radio on hosts that share a LAN segment. Every frame
//! is one datagram sent to the configured broadcast address; every node
//! binds the same port. A node also hears its own broadcasts, which the
//! flood layer drops as duplicates.
//!
//! The receive buffer is also the send limit: a frame longer than
//! `max_datagram` is refused before it reaches the socket, since a peer
//! with the same setting would read it cut short. Nodes on one segment
//! must agree on `max_datagram`.

use std::io::ErrorKind;
use std::net::SocketAddr;

use tokio::net::UdpSocket;

use crate::{Result, Transport, TransportError};

/// Default UDP port for the mesh link.
pub const DEFAULT_PORT: u16 = 47100;

/// Largest payload of a single IPv4 UDP datagram.
pub const MAX_UDP_PAYLOAD: usize = 65_507;

/// Default frame limit, in bytes, for sending and receiving.
pub const DEFAULT_MAX_DATAGRAM: usize = MAX_UDP_PAYLOAD;

/// Configuration for a [`UdpTransport`].
#[derive(Clone, Debug)]
pub struct UdpConfig {
    /// Local address to bind to.
    pub bind_addr: SocketAddr,
    /// Destination for every outgoing frame.
    pub broadcast_addr: SocketAddr,
    /// Largest datagram sent or received. Capped at [`MAX_UDP_PAYLOAD`].
    pub max_datagram: usize,
}

impl Default for UdpConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)),
            broadcast_addr: SocketAddr::from(([255, 255, 255, 255], DEFAULT_PORT)),
            max_datagram: DEFAULT_MAX_DATAGRAM,
        }
    }
}

/// A broadcast-enabled UDP socket.
///
/// Must be created inside a Tokio runtime; the non-blocking `try_*` socket
/// calls rely on the runtime's I/O driver for readiness.
pub struct UdpTransport {
    socket: UdpSocket,
    broadcast_addr: SocketAddr,
    local_addr: SocketAddr,
    max_datagram: usize,
}

impl UdpTransport {
    /// Bind the socket and enable broadcast.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::NotReady`] if the socket cannot be bound
    /// or configured.
    pub async fn bind(config: UdpConfig) -> Result<Self> {
        let socket = UdpSocket::bind(config.bind_addr)
            .await
            .map_err(|e| TransportError::NotReady(format!("bind {}: {e}", config.bind_addr)))?;
        socket
            .set_broadcast(true)
            .map_err(|e| TransportError::NotReady(format!("enable broadcast: {e}")))?;
        let local_addr = socket
            .local_addr()
            .map_err(|e| TransportError::NotReady(e.to_string()))?;
        // Prime write readiness so the first try_send_to does not see an
        // empty readiness set.
        socket
            .writable()
            .await
            .map_err(|e| TransportError::NotReady(e.to_string()))?;

        tracing::info!(%local_addr, broadcast = %config.broadcast_addr, "UDP link started");

        Ok(Self {
            socket,
            broadcast_addr: config.broadcast_addr,
            local_addr,
            max_datagram: config.max_datagram.clamp(1, MAX_UDP_PAYLOAD),
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }
}

impl Transport for UdpTransport {
    fn send(&self, frame: &[u8]) -> Result<()> {
        if frame.len() > self.max_datagram {
            return Err(TransportError::FrameTooLarge {
                len: frame.len(),
                max: self.max_datagram,
            });
        }
        let sent = self
            .socket
            .try_send_to(frame, self.broadcast_addr)
            .map_err(|e| TransportError::Io(e.to_string()))?;
        if sent != frame.len() {
            return Err(TransportError::Io(format!(
                "short send: {sent} of {} bytes",
                frame.len()
            )));
        }
        tracing::trace!(len = frame.len(), to = %self.broadcast_addr, "UDP frame sent");
        Ok(())
    }

    fn receive(&self) -> Result<Option<Vec<u8>>> {
        let mut buf = vec![0u8; self.max_datagram];
        match self.socket.try_recv_from(&mut buf) {
            Ok((len, from)) => {
                buf.truncate(len);
                tracing::trace!(len, %from, "UDP frame received");
                Ok(Some(buf))
            }
            Err(e) if e.kind() == ErrorKind::WouldBlock => Ok(None),
            Err(e) => Err(TransportError::Io(e.to_string())),
        }
    }

    fn max_frame(&self) -> usize {
        self.max_datagram
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    async fn recv_with_retry(t: &UdpTransport) -> Option<Vec<u8>> {
        for _ in 0..200 {
            if let Some(frame) = t.receive().expect("receive") {
                return Some(frame);
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        None
    }

    #[tokio::test]
    async fn test_unicast_delivery_on_localhost() {
        let receiver = UdpTransport::bind(UdpConfig {
            bind_addr: "127.0.0.1:0".parse().expect("addr"),
            broadcast_addr: "127.0.0.1:9".parse().expect("addr"),
            max_datagram: DEFAULT_MAX_DATAGRAM,
        })
        .await
        .expect("bind receiver");

        let sender = UdpTransport::bind(UdpConfig {
            bind_addr: "127.0.0.1:0".parse().expect("addr"),
            broadcast_addr: receiver.local_addr(),
            max_datagram: DEFAULT_MAX_DATAGRAM,
        })
        .await
        .expect("bind sender");

        sender.send(b"{\"id\":\"x\"}").expect("send");
        let frame = recv_with_retry(&receiver).await;
        assert_eq!(frame, Some(b"{\"id\":\"x\"}".to_vec()));
    }

    #[tokio::test]
    async fn test_receive_empty_is_none() {
        let t = UdpTransport::bind(UdpConfig {
            bind_addr: "127.0.0.1:0".parse().expect("addr"),
            ..Default::default()
        })
        .await
        .expect("bind");
        assert_eq!(t.receive().expect("receive"), None);
    }

    #[test]
    fn test_default_config() {
        let config = UdpConfig::default();
        assert_eq!(config.bind_addr.port(), DEFAULT_PORT);
        assert_eq!(config.broadcast_addr.port(), DEFAULT_PORT);
        assert_eq!(config.max_datagram, MAX_UDP_PAYLOAD);
    }

    #[tokio::test]
    async fn test_frame_limit_shared_by_send_and_receive() {
        let receiver = UdpTransport::bind(UdpConfig {
            bind_addr: "127.0.0.1:0".parse().expect("addr"),
            broadcast_addr: "127.0.0.1:9".parse().expect("addr"),
            max_datagram: 1024,
        })
        .await
        .expect("bind receiver");
        let sender = UdpTransport::bind(UdpConfig {
            bind_addr: "127.0.0.1:0".parse().expect("addr"),
            broadcast_addr: receiver.local_addr(),
            max_datagram: 1024,
        })
        .await
        .expect("bind sender");
        assert_eq!(sender.max_frame(), 1024);

        assert!(matches!(
            sender.send(&[b'x'; 1025]),
            Err(TransportError::FrameTooLarge { len: 1025, max: 1024 })
        ));

        let full = vec![b'y'; 1024];
        sender.send(&full).expect("send");
        assert_eq!(recv_with_retry(&receiver).await, Some(full));
    }

    #[tokio::test]
    async fn test_limit_capped_at_udp_payload() {
        let t = UdpTransport::bind(UdpConfig {
            bind_addr: "127.0.0.1:0".parse().expect("addr"),
            max_datagram: 1 << 20,
            ..Default::default()
        })
        .await
        .expect("bind");
        assert_eq!(t.max_frame(), MAX_UDP_PAYLOAD);
    }
}
