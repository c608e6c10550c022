//! Broadcast and receive paths of the flood protocol.

use std::sync::Arc;

use meshmap_db::Ledger;
use meshmap_transport::{wire, Transport};
use meshmap_types::{
    generate_message_id, unix_now, Annotation, Envelope, MessageId, MessageKind, Obstacle,
    Payload, PeerId, DEFAULT_MAX_TTL,
};
use tracing::{debug, error, info, warn};

use crate::hop::{next_hop, Hop};
use crate::Result;

/// Forwarder settings.
#[derive(Clone, Debug)]
pub struct FloodConfig {
    /// Stamped as `origin` on locally created messages.
    pub peer_id: PeerId,
    /// Hop budget for locally created messages.
    pub max_ttl: u32,
}

impl FloodConfig {
    pub fn new(peer_id: impl Into<PeerId>) -> Self {
        Self {
            peer_id: peer_id.into(),
            max_ttl: DEFAULT_MAX_TTL,
        }
    }

    pub fn with_max_ttl(mut self, max_ttl: u32) -> Self {
        self.max_ttl = max_ttl;
        self
    }
}

/// How an inbound message was applied locally.
#[derive(Clone, Debug, PartialEq)]
pub enum Applied {
    /// Stored as an annotation.
    Annotation,
    /// Stored as an obstacle.
    Obstacle,
    /// Known type, but `lat`/`lon` missing or malformed. Nothing stored.
    Incomplete(MessageKind),
    /// Unrecognised `type`. Nothing stored.
    UnknownType(String),
    /// Known type, but the ledger refused the write. Still relayed.
    StoreFailed(String),
}

/// A new inbound message that was applied (and possibly relayed).
#[derive(Clone, Debug, PartialEq)]
pub struct Delivery {
    pub id: MessageId,
    pub origin: PeerId,
    pub applied: Applied,
    pub hop: Hop,
    /// Whether the relay send succeeded. Always `false` for terminal hops.
    pub forwarded: bool,
}

/// Result of handling one inbound frame.
#[derive(Clone, Debug, PartialEq)]
pub enum ReceiveOutcome {
    /// The transport had nothing waiting.
    Idle,
    /// Frame could not be decoded.
    Malformed,
    /// Envelope has no id.
    MissingId,
    /// Id already in the ledger.
    Duplicate(MessageId),
    /// New message, applied locally.
    Processed(Delivery),
}

impl ReceiveOutcome {
    pub fn is_idle(&self) -> bool {
        matches!(self, ReceiveOutcome::Idle)
    }
}

/// Flood forwarder bound to one ledger and one transport.
pub struct Forwarder<T> {
    ledger: Arc<Ledger>,
    transport: T,
    config: FloodConfig,
}

impl<T: Transport> Forwarder<T> {
    pub fn new(ledger: Arc<Ledger>, transport: T, config: FloodConfig) -> Self {
        info!(
            peer_id = %config.peer_id,
            max_ttl = config.max_ttl,
            "Flood forwarder initialized"
        );
        Self {
            ledger,
            transport,
            config,
        }
    }

    pub fn ledger(&self) -> &Arc<Ledger> {
        &self.ledger
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn config(&self) -> &FloodConfig {
        &self.config
    }

    /// Originate a message from this node.
    ///
    /// The envelope is encoded first, against the link's frame limit, so an
    /// oversized payload is refused before the ledger changes. The new id is
    /// then marked seen, so a copy that floods back here is dropped, and the
    /// entity is stored locally. Last, the envelope is sent with the full
    /// hop budget. A failed send is logged and otherwise ignored.
    ///
    /// # Errors
    ///
    /// [`TransportError::FrameTooLarge`](meshmap_transport::TransportError)
    /// when the encoded envelope exceeds [`Transport::max_frame`], and
    /// ledger failures.
    pub fn broadcast(&self, payload: Payload) -> Result<MessageId> {
        let id = generate_message_id();
        let timestamp = unix_now();
        let envelope = Envelope::new(
            id.clone(),
            self.config.peer_id.clone(),
            timestamp,
            &payload,
            self.config.max_ttl,
        );
        let frame = wire::encode_within(&envelope, self.transport.max_frame())?;

        self.ledger.check_and_mark(&id, timestamp)?;
        self.store(&id, &self.config.peer_id, timestamp, &payload)?;

        info!(
            msg_id = %id,
            kind = %payload.kind(),
            ttl = envelope.ttl,
            len = frame.len(),
            "Broadcasting message"
        );
        if let Err(e) = self.transport.send(&frame) {
            warn!(msg_id = %id, error = %e, "Broadcast send failed");
        }

        Ok(id)
    }

    /// Poll the transport once and handle whatever arrived.
    ///
    /// # Errors
    ///
    /// Transport receive failures and ledger failures. Callers in a loop
    /// should log and carry on.
    pub fn poll_once(&self) -> Result<ReceiveOutcome> {
        match self.transport.receive()? {
            Some(frame) => self.receive(&frame),
            None => Ok(ReceiveOutcome::Idle),
        }
    }

    /// Handle one inbound frame.
    ///
    /// Drops malformed frames, frames without an id and already-seen ids.
    /// Anything else is marked seen, applied by type, and relayed if its
    /// ttl allows, whatever its type. Once the id is marked, a failed peer
    /// or entity write is logged and the relay still happens.
    ///
    /// # Errors
    ///
    /// Only a failure of the seen-id check itself.
    pub fn receive(&self, frame: &[u8]) -> Result<ReceiveOutcome> {
        let envelope = match wire::decode(frame) {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!(len = frame.len(), error = %e, "Dropping undecodable frame");
                return Ok(ReceiveOutcome::Malformed);
            }
        };

        let Some(id) = envelope.message_id().map(str::to_owned) else {
            warn!(origin = %envelope.origin, "Dropping message without id");
            return Ok(ReceiveOutcome::MissingId);
        };

        if !self.ledger.check_and_mark(&id, envelope.timestamp)? {
            debug!(msg_id = %id, "Already processed, dropping");
            return Ok(ReceiveOutcome::Duplicate(id));
        }

        debug!(msg_id = %id, origin = %envelope.origin, ttl = envelope.ttl, "Received message");

        if !envelope.origin.is_empty() {
            if let Err(e) = self.ledger.upsert_peer(&envelope.origin, unix_now()) {
                warn!(msg_id = %id, origin = %envelope.origin, error = %e, "Peer update failed");
            }
        }

        let applied = self.apply(&id, &envelope).unwrap_or_else(|e| {
            error!(msg_id = %id, error = %e, "Store failed, relaying anyway");
            Applied::StoreFailed(e.to_string())
        });
        let hop = next_hop(envelope.ttl);
        let forwarded = match hop {
            Hop::Forward(ttl) => self.relay(&id, &envelope, ttl),
            Hop::Terminal => {
                debug!(msg_id = %id, "Hop budget exhausted, not relaying");
                false
            }
        };

        Ok(ReceiveOutcome::Processed(Delivery {
            id,
            origin: envelope.origin,
            applied,
            hop,
            forwarded,
        }))
    }

    fn apply(&self, id: &str, envelope: &Envelope) -> Result<Applied> {
        let Some(kind) = envelope.kind() else {
            warn!(msg_id = %id, msg_type = %envelope.msg_type, "Unknown message type");
            return Ok(Applied::UnknownType(envelope.msg_type.clone()));
        };

        let Some(payload) = envelope.typed_payload() else {
            warn!(msg_id = %id, %kind, "Payload missing lat/lon, not stored");
            return Ok(Applied::Incomplete(kind));
        };

        self.store(id, &envelope.origin, envelope.timestamp, &payload)?;
        info!(msg_id = %id, origin = %envelope.origin, %kind, "Applied message");

        Ok(match kind {
            MessageKind::Annotation => Applied::Annotation,
            MessageKind::Obstacle => Applied::Obstacle,
        })
    }

    fn store(&self, id: &str, origin: &str, timestamp: u64, payload: &Payload) -> Result<()> {
        match payload {
            Payload::Annotation(p) => {
                let annotation =
                    Annotation::from_payload(id.to_string(), origin.to_string(), timestamp, p);
                self.ledger.insert_annotation(&annotation)?;
            }
            Payload::Obstacle(p) => {
                let obstacle =
                    Obstacle::from_payload(id.to_string(), origin.to_string(), timestamp, p);
                self.ledger.insert_obstacle(&obstacle)?;
            }
        }
        Ok(())
    }

    fn relay(&self, id: &str, envelope: &Envelope, ttl: u32) -> bool {
        let mut relayed = envelope.clone();
        relayed.ttl = ttl;

        let sent = wire::encode_within(&relayed, self.transport.max_frame())
            .and_then(|frame| self.transport.send(&frame));
        match sent {
            Ok(()) => {
                info!(msg_id = %id, ttl, "Forwarded message");
                true
            }
            Err(e) => {
                warn!(msg_id = %id, error = %e, "Forward send failed");
                false
            }
        }
    }
}
