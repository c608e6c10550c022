//! Persisted geographic entities.

use serde::{Deserialize, Serialize};

use crate::message::{AnnotationPayload, ObstaclePayload};
use crate::{MessageId, PeerId};

/// A geographic point. Serialized as a `[lat, lon]` pair.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

impl From<[f64; 2]> for GeoPoint {
    fn from([lat, lon]: [f64; 2]) -> Self {
        Self { lat, lon }
    }
}

impl From<GeoPoint> for [f64; 2] {
    fn from(p: GeoPoint) -> Self {
        [p.lat, p.lon]
    }
}

/// A map annotation. `id` is the id of the message that introduced it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    pub id: MessageId,
    pub peer_id: PeerId,
    pub timestamp: u64,
    pub lat: f64,
    pub lon: f64,
    #[serde(default)]
    pub data: String,
}

impl Annotation {
    /// Build the persisted row for an annotation carried by a message.
    pub fn from_payload(
        id: MessageId,
        peer_id: PeerId,
        timestamp: u64,
        payload: &AnnotationPayload,
    ) -> Self {
        Self {
            id,
            peer_id,
            timestamp,
            lat: payload.lat,
            lon: payload.lon,
            data: payload.data.clone().unwrap_or_default(),
        }
    }
}

/// An obstacle report: a disk of `radius` grid cells around `(lat, lon)`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    pub id: MessageId,
    pub peer_id: PeerId,
    pub timestamp: u64,
    pub lat: f64,
    pub lon: f64,
    pub radius: f64,
    #[serde(default)]
    pub data: String,
}

impl Obstacle {
    /// Build the persisted row for an obstacle carried by a message.
    pub fn from_payload(
        id: MessageId,
        peer_id: PeerId,
        timestamp: u64,
        payload: &ObstaclePayload,
    ) -> Self {
        Self {
            id,
            peer_id,
            timestamp,
            lat: payload.lat,
            lon: payload.lon,
            radius: payload.radius_or_default(),
            data: payload.data.clone().unwrap_or_default(),
        }
    }

    pub fn center(&self) -> GeoPoint {
        GeoPoint::new(self.lat, self.lon)
    }
}

/// A peer this node has heard from.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Peer {
    pub peer_id: PeerId,
    pub last_seen: u64,
}
