//! Wire codec for the flood envelope.
//!
//! One envelope per frame, encoded as UTF-8 JSON. Frames larger than
//! [`MAX_FRAME_SIZE`] are refused in both directions. Links that carry
//! less per frame encode with [`encode_within`] and their own limit.

use meshmap_types::Envelope;

use crate::{Result, TransportError};

/// Maximum frame size in bytes.
pub const MAX_FRAME_SIZE: usize = 65536;

/// Encode an envelope to a frame.
pub fn encode(envelope: &Envelope) -> Result<Vec<u8>> {
    encode_within(envelope, MAX_FRAME_SIZE)
}

/// Encode an envelope, refusing frames longer than `max` bytes (or
/// [`MAX_FRAME_SIZE`], whichever is smaller).
pub fn encode_within(envelope: &Envelope, max: usize) -> Result<Vec<u8>> {
    let frame =
        serde_json::to_vec(envelope).map_err(|e| TransportError::Serialization(e.to_string()))?;
    check_size(frame.len(), max.min(MAX_FRAME_SIZE))?;
    Ok(frame)
}

/// Decode a frame into an envelope.
///
/// # Errors
///
/// Returns [`TransportError::FrameTooLarge`] for oversized frames and
/// [`TransportError::Deserialization`] for anything that is not a UTF-8
/// JSON object matching the envelope shape.
pub fn decode(frame: &[u8]) -> Result<Envelope> {
    check_size(frame.len(), MAX_FRAME_SIZE)?;
    let text =
        std::str::from_utf8(frame).map_err(|e| TransportError::Deserialization(e.to_string()))?;
    let value: serde_json::Value =
        serde_json::from_str(text).map_err(|e| TransportError::Deserialization(e.to_string()))?;
    if !value.is_object() {
        return Err(TransportError::Deserialization(
            "envelope is not a JSON object".to_string(),
        ));
    }
    serde_json::from_value(value).map_err(|e| TransportError::Deserialization(e.to_string()))
}

fn check_size(len: usize, max: usize) -> Result<()> {
    if len > max {
        return Err(TransportError::FrameTooLarge { len, max });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use meshmap_types::{ObstaclePayload, Payload};

    fn sample() -> Envelope {
        let payload = Payload::Obstacle(ObstaclePayload {
            lat: 35.0,
            lon: 33.0,
            radius: Some(3.0),
            data: None,
        });
        Envelope::new("id-1".into(), "node-a".into(), 1_700_000_000, &payload, 4)
    }

    #[test]
    fn test_roundtrip() {
        let env = sample();
        let frame = encode(&env).expect("encode");
        assert!(std::str::from_utf8(&frame).is_ok());
        assert_eq!(decode(&frame).expect("decode"), env);
    }

    #[test]
    fn test_garbage_rejected() {
        assert!(matches!(
            decode(b"\xff\xfe not json"),
            Err(TransportError::Deserialization(_))
        ));
        assert!(matches!(
            decode(b"{\"id\": "),
            Err(TransportError::Deserialization(_))
        ));
        assert!(matches!(
            decode(b"[1, 2, 3]"),
            Err(TransportError::Deserialization(_))
        ));
    }

    #[test]
    fn test_wrong_field_type_rejected() {
        let frame = br#"{"id": "x", "ttl": -1}"#;
        assert!(decode(frame).is_err());
    }

    #[test]
    fn test_oversized_frame_rejected() {
        let frame = vec![b' '; MAX_FRAME_SIZE + 1];
        assert!(matches!(
            decode(&frame),
            Err(TransportError::FrameTooLarge { .. })
        ));

        let mut env = sample();
        env.payload = serde_json::json!({ "data": "x".repeat(MAX_FRAME_SIZE) });
        assert!(matches!(
            encode(&env),
            Err(TransportError::FrameTooLarge { .. })
        ));
    }

    #[test]
    fn test_link_limit_applies_on_encode() {
        let mut env = sample();
        env.payload = serde_json::json!({ "data": "x".repeat(600) });
        let len = encode(&env).expect("encode").len();

        assert!(encode_within(&env, len).is_ok());
        assert!(matches!(
            encode_within(&env, len - 1),
            Err(TransportError::FrameTooLarge { max, .. }) if max == len - 1
        ));
        assert!(matches!(
            encode_within(&env, usize::MAX),
            Ok(frame) if frame.len() == len
        ));
    }
}
