//! # meshmap-transport
//!
//! Raw frame transport for the meshmap flood protocol.
//!
//! - **Transport seam**: the [`Transport`] trait, a broadcast medium with a
//!   fire-and-forget `send` and a non-blocking `receive`
//! - **Wire codec** for the flood envelope via [`wire`]
//! - **UDP broadcast** link standing in for the radio via [`udp`]
//! - **In-process loopback medium** for tests and single-host setups via
//!   [`loopback`]
//!
//! ## Architecture
//!
//! ```text
//! Forwarder
//!     |
//!     v
//! Envelope (meshmap-types)  -- id, origin, timestamp, type, payload, ttl
//!     |
//!     v
//! wire.rs                   -- UTF-8 JSON frame, size-bounded
//!     |
//!     v
//! Transport                 -- UdpTransport | LoopbackTransport
//! ```
//!
//! There is no addressing: every frame handed to `send` goes to whatever
//! the medium reaches.

pub mod loopback;
pub mod udp;
pub mod wire;

pub use loopback::{LoopbackMedium, LoopbackTransport};
pub use udp::{UdpConfig, UdpTransport};

use std::sync::Arc;

/// Error types for transport operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The link is not (or no longer) initialised.
    #[error("transport not ready: {0}")]
    NotReady(String),

    /// Socket-level failure.
    #[error("I/O error: {0}")]
    Io(String),

    /// Envelope could not be encoded.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Frame is not a valid envelope.
    #[error("deserialization error: {0}")]
    Deserialization(String),

    /// Frame exceeds the codec limit or the link's [`Transport::max_frame`].
    #[error("frame too large: {len} bytes, max {max}")]
    FrameTooLarge { len: usize, max: usize },
}

/// Result type alias for transport operations.
pub type Result<T> = std::result::Result<T, TransportError>;

/// A broadcast link.
///
/// `send` hands a frame to every node in range; failures are returned to
/// the caller and never retried here. `receive` never blocks: it returns
/// `Ok(None)` when no frame is waiting.
pub trait Transport: Send + Sync {
    fn send(&self, frame: &[u8]) -> Result<()>;

    fn receive(&self) -> Result<Option<Vec<u8>>>;

    /// Largest frame every receiver on this link reads whole.
    fn max_frame(&self) -> usize {
        wire::MAX_FRAME_SIZE
    }
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn send(&self, frame: &[u8]) -> Result<()> {
        (**self).send(frame)
    }

    fn receive(&self) -> Result<Option<Vec<u8>>> {
        (**self).receive()
    }

    fn max_frame(&self) -> usize {
        (**self).max_frame()
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn send(&self, frame: &[u8]) -> Result<()> {
        (**self).send(frame)
    }

    fn receive(&self) -> Result<Option<Vec<u8>>> {
        (**self).receive()
    }

    fn max_frame(&self) -> usize {
        (**self).max_frame()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TransportError::NotReady("radio down".to_string());
        assert_eq!(err.to_string(), "transport not ready: radio down");

        let err = TransportError::FrameTooLarge { len: 10, max: 5 };
        assert_eq!(err.to_string(), "frame too large: 10 bytes, max 5");
    }

    #[test]
    fn test_arc_dispatch() {
        let medium = LoopbackMedium::new();
        let a: Arc<dyn Transport> = Arc::new(medium.attach());
        let b = medium.attach();

        a.send(b"frame").expect("send");
        assert_eq!(b.receive().expect("receive"), Some(b"frame".to_vec()));
        assert_eq!(a.max_frame(), wire::MAX_FRAME_SIZE);
    }
}
