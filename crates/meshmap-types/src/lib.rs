//! # meshmap-types
//!
//! Shared domain types used across the meshmap workspace: the flood
//! envelope that travels over the radio link, the payloads it carries,
//! and the geographic entities persisted by the ledger.

pub mod entity;
pub mod message;

pub use entity::{Annotation, GeoPoint, Obstacle, Peer};
pub use message::{AnnotationPayload, Envelope, MessageKind, ObstaclePayload, Payload};

/// Globally unique message identifier (lowercase hex).
pub type MessageId = String;

/// Peer identifier, as configured on each node.
pub type PeerId = String;

/// Radius applied to an obstacle report that does not carry one.
pub const DEFAULT_OBSTACLE_RADIUS: f64 = 1.0;

/// Default hop budget stamped on locally originated messages.
pub const DEFAULT_MAX_TTL: u32 = 5;

/// Length in bytes of a random message id before hex encoding.
pub const MESSAGE_ID_LEN: usize = 16;

/// Generate a fresh random message id.
///
/// 128 random bits, hex encoded. Collisions are not checked for.
pub fn generate_message_id() -> MessageId {
    let mut bytes = [0u8; MESSAGE_ID_LEN];
    rand::RngCore::fill_bytes(&mut rand::thread_rng(), &mut bytes);
    hex::encode(bytes)
}

/// Generate a random peer id for nodes that were not given one.
pub fn generate_peer_id() -> PeerId {
    let mut bytes = [0u8; 8];
    rand::RngCore::fill_bytes(&mut rand::thread_rng(), &mut bytes);
    format!("node-{}", hex::encode(bytes))
}

/// Current Unix timestamp in seconds.
pub fn unix_now() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_id_format() {
        let id = generate_message_id();
        assert_eq!(id.len(), MESSAGE_ID_LEN * 2);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_message_ids_unique() {
        let a = generate_message_id();
        let b = generate_message_id();
        assert_ne!(a, b);
    }

    #[test]
    fn test_peer_id_prefix() {
        assert!(generate_peer_id().starts_with("node-"));
    }
}
