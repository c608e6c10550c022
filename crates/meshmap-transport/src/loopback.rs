//! In-process broadcast medium.
//!
//! A [`LoopbackMedium`] models a shared radio channel inside one process:
//! every frame sent by an attached [`LoopbackTransport`] is queued for
//! every other attached endpoint, never for the sender. Endpoints only hold
//! a weak handle to the medium; once the medium is dropped every endpoint
//! reports [`TransportError::NotReady`].

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Weak};

use tokio::sync::mpsc::{self, error::TryRecvError, UnboundedReceiver, UnboundedSender};

use crate::{Result, Transport, TransportError};

struct MediumInner {
    endpoints: Mutex<Vec<(usize, UnboundedSender<Vec<u8>>)>>,
    next_endpoint: AtomicUsize,
    frames_sent: AtomicU64,
}

/// Owner of a shared in-process broadcast channel.
pub struct LoopbackMedium {
    inner: Arc<MediumInner>,
}

impl LoopbackMedium {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(MediumInner {
                endpoints: Mutex::new(Vec::new()),
                next_endpoint: AtomicUsize::new(0),
                frames_sent: AtomicU64::new(0),
            }),
        }
    }

    /// Attach a new endpoint to the medium.
    pub fn attach(&self) -> LoopbackTransport {
        let id = self.inner.next_endpoint.fetch_add(1, Ordering::SeqCst);
        let (tx, rx) = mpsc::unbounded_channel();
        if let Ok(mut endpoints) = self.inner.endpoints.lock() {
            endpoints.push((id, tx));
        }
        tracing::debug!(endpoint = id, "Loopback endpoint attached");
        LoopbackTransport {
            id,
            medium: Arc::downgrade(&self.inner),
            inbox: Mutex::new(rx),
        }
    }

    /// Total frames sent on the medium by all endpoints.
    pub fn frames_sent(&self) -> u64 {
        self.inner.frames_sent.load(Ordering::SeqCst)
    }
}

impl Default for LoopbackMedium {
    fn default() -> Self {
        Self::new()
    }
}

/// One node's attachment to a [`LoopbackMedium`].
pub struct LoopbackTransport {
    id: usize,
    medium: Weak<MediumInner>,
    inbox: Mutex<UnboundedReceiver<Vec<u8>>>,
}

impl LoopbackTransport {
    fn medium(&self) -> Result<Arc<MediumInner>> {
        self.medium
            .upgrade()
            .ok_or_else(|| TransportError::NotReady("loopback medium closed".to_string()))
    }
}

impl Transport for LoopbackTransport {
    fn send(&self, frame: &[u8]) -> Result<()> {
        let medium = self.medium()?;
        let endpoints = medium
            .endpoints
            .lock()
            .map_err(|_| TransportError::Io("loopback medium lock poisoned".to_string()))?;

        for (id, tx) in endpoints.iter() {
            if *id != self.id {
                // A closed inbox means that endpoint was dropped.
                let _ = tx.send(frame.to_vec());
            }
        }
        medium.frames_sent.fetch_add(1, Ordering::SeqCst);
        tracing::trace!(endpoint = self.id, len = frame.len(), "Loopback frame sent");
        Ok(())
    }

    fn receive(&self) -> Result<Option<Vec<u8>>> {
        self.medium()?;
        let mut inbox = self
            .inbox
            .lock()
            .map_err(|_| TransportError::Io("loopback inbox lock poisoned".to_string()))?;

        match inbox.try_recv() {
            Ok(frame) => Ok(Some(frame)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => {
                Err(TransportError::NotReady("loopback medium closed".to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_broadcast_excludes_sender() {
        let medium = LoopbackMedium::new();
        let a = medium.attach();
        let b = medium.attach();
        let c = medium.attach();

        a.send(b"hello").expect("send");

        assert_eq!(a.receive().expect("a"), None);
        assert_eq!(b.receive().expect("b"), Some(b"hello".to_vec()));
        assert_eq!(c.receive().expect("c"), Some(b"hello".to_vec()));
        assert_eq!(b.receive().expect("b again"), None);
        assert_eq!(medium.frames_sent(), 1);
    }

    #[test]
    fn test_frames_arrive_in_order() {
        let medium = LoopbackMedium::new();
        let a = medium.attach();
        let b = medium.attach();

        a.send(b"one").expect("send");
        a.send(b"two").expect("send");

        assert_eq!(b.receive().expect("first"), Some(b"one".to_vec()));
        assert_eq!(b.receive().expect("second"), Some(b"two".to_vec()));
    }

    #[test]
    fn test_closed_medium_not_ready() {
        let medium = LoopbackMedium::new();
        let a = medium.attach();
        drop(medium);

        assert!(matches!(a.send(b"x"), Err(TransportError::NotReady(_))));
        assert!(matches!(a.receive(), Err(TransportError::NotReady(_))));
    }

    #[test]
    fn test_dropped_endpoint_does_not_break_send() {
        let medium = LoopbackMedium::new();
        let a = medium.attach();
        let b = medium.attach();
        drop(b);

        a.send(b"still fine").expect("send");
    }
}
