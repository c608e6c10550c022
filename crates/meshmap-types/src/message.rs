//! Flood envelope and payload structures.
//!
//! ## Wire format
//!
//! ```text
//! {
//!     "id":        string,   // random unique message id
//!     "origin":    string,   // originating peer id
//!     "timestamp": integer,  // Unix seconds at origin
//!     "type":      "annotation" | "obstacle",
//!     "payload":   object,   // type-specific
//!     "ttl":       integer   // remaining hop budget
//! }
//! ```
//!
//! The envelope keeps `type` as a raw string and `payload` as an untyped
//! JSON value so a node can relay messages whose type it does not know
//! without rewriting them.

use serde::{Deserialize, Serialize};

use crate::{MessageId, PeerId, DEFAULT_OBSTACLE_RADIUS};

/// Message types understood by this node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    Annotation,
    Obstacle,
}

impl MessageKind {
    /// The string used for this kind in the envelope `type` field.
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageKind::Annotation => "annotation",
            MessageKind::Obstacle => "obstacle",
        }
    }

    /// Parse a wire `type` string. Returns `None` for unknown types.
    pub fn from_wire(s: &str) -> Option<Self> {
        match s {
            "annotation" => Some(MessageKind::Annotation),
            "obstacle" => Some(MessageKind::Obstacle),
            _ => None,
        }
    }
}

impl std::fmt::Display for MessageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Flood envelope as carried on the wire.
///
/// Every field is optional on decode. A missing `id` is reported by the
/// forwarder as a distinct drop reason rather than a decode failure.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<MessageId>,
    #[serde(default)]
    pub origin: PeerId,
    #[serde(default)]
    pub timestamp: u64,
    #[serde(rename = "type", default)]
    pub msg_type: String,
    #[serde(default)]
    pub payload: serde_json::Value,
    #[serde(default)]
    pub ttl: u32,
}

impl Envelope {
    /// Build an envelope for a locally originated payload.
    pub fn new(
        id: MessageId,
        origin: PeerId,
        timestamp: u64,
        payload: &Payload,
        ttl: u32,
    ) -> Self {
        Self {
            id: Some(id),
            origin,
            timestamp,
            msg_type: payload.kind().as_str().to_string(),
            payload: payload.to_value(),
            ttl,
        }
    }

    /// The id, if present and non-empty.
    pub fn message_id(&self) -> Option<&str> {
        self.id.as_deref().filter(|id| !id.is_empty())
    }

    /// The recognised message kind, if any.
    pub fn kind(&self) -> Option<MessageKind> {
        MessageKind::from_wire(&self.msg_type)
    }

    /// Decode the payload according to the envelope type.
    ///
    /// Returns `None` when the type is unknown or when the payload lacks a
    /// required field (`lat`, `lon`) or carries one with the wrong type.
    pub fn typed_payload(&self) -> Option<Payload> {
        match self.kind()? {
            MessageKind::Annotation => {
                AnnotationPayload::deserialize(&self.payload).ok().map(Payload::Annotation)
            }
            MessageKind::Obstacle => {
                ObstaclePayload::deserialize(&self.payload).ok().map(Payload::Obstacle)
            }
        }
    }
}

/// Annotation payload: `{lat, lon, data?}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnnotationPayload {
    pub lat: f64,
    pub lon: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
}

/// Obstacle payload: `{lat, lon, radius?, data?}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ObstaclePayload {
    pub lat: f64,
    pub lon: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub radius: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
}

impl ObstaclePayload {
    /// Radius in grid units, defaulting to [`DEFAULT_OBSTACLE_RADIUS`].
    pub fn radius_or_default(&self) -> f64 {
        self.radius.unwrap_or(DEFAULT_OBSTACLE_RADIUS)
    }
}

/// A decoded, type-checked payload.
#[derive(Clone, Debug, PartialEq)]
pub enum Payload {
    Annotation(AnnotationPayload),
    Obstacle(ObstaclePayload),
}

impl Payload {
    pub fn kind(&self) -> MessageKind {
        match self {
            Payload::Annotation(_) => MessageKind::Annotation,
            Payload::Obstacle(_) => MessageKind::Obstacle,
        }
    }

    /// Serialize the payload body to a JSON value for the envelope.
    pub fn to_value(&self) -> serde_json::Value {
        let value = match self {
            Payload::Annotation(a) => serde_json::to_value(a),
            Payload::Obstacle(o) => serde_json::to_value(o),
        };
        // Both payload structs contain only numbers and strings.
        value.unwrap_or(serde_json::Value::Null)
    }
}
