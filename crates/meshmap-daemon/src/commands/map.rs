//! Map data command handlers: annotations, obstacles, peers.

use std::sync::Arc;

use meshmap_flood::FloodError;
use meshmap_transport::TransportError;
use meshmap_types::{AnnotationPayload, MessageId, ObstaclePayload, Payload};
use serde_json::Value;
use tracing::info;

use super::{optional_str, require_f64};
use crate::rpc::RpcError;
use crate::DaemonState;

type Result = std::result::Result<Value, RpcError>;

/// Flood `payload`. A message too large for the radio link is the caller's
/// fault and leaves the ledger untouched.
fn flood(state: &DaemonState, payload: Payload) -> std::result::Result<MessageId, RpcError> {
    state.forwarder.broadcast(payload).map_err(|e| match e {
        FloodError::Transport(TransportError::FrameTooLarge { len, max }) => {
            RpcError::invalid_params(&format!(
                "message too large for the radio link: {len} bytes, max {max}"
            ))
        }
        other => RpcError::internal_error(&format!("broadcast failed: {other}")),
    })
}

/// Create an annotation here and flood it to the mesh.
pub async fn add_annotation(state: &Arc<DaemonState>, params: &Value) -> Result {
    let payload = AnnotationPayload {
        lat: require_f64(params, "lat")?,
        lon: require_f64(params, "lon")?,
        data: optional_str(params, "data")?,
    };

    let id = flood(state, Payload::Annotation(payload))?;
    info!(msg_id = %id, "Annotation added");

    Ok(serde_json::json!({ "id": id }))
}

/// Report an obstacle here and flood it to the mesh.
///
/// Unlike inbound messages, `radius` is required.
pub async fn add_obstacle(state: &Arc<DaemonState>, params: &Value) -> Result {
    let lat = require_f64(params, "lat")?;
    let lon = require_f64(params, "lon")?;
    let radius = require_f64(params, "radius")?;
    if radius < 0.0 {
        return Err(RpcError::invalid_params("radius must not be negative"));
    }
    let payload = ObstaclePayload {
        lat,
        lon,
        radius: Some(radius),
        data: optional_str(params, "data")?,
    };

    let id = flood(state, Payload::Obstacle(payload))?;
    info!(msg_id = %id, radius, "Obstacle added");

    Ok(serde_json::json!({ "id": id }))
}

/// All stored annotations, oldest first.
pub async fn get_annotations(state: &Arc<DaemonState>) -> Result {
    let annotations = state
        .ledger
        .list_annotations()
        .map_err(|e| RpcError::internal_error(&format!("db error: {e}")))?;
    serde_json::to_value(annotations).map_err(|e| RpcError::internal_error(&e.to_string()))
}

/// All stored obstacles, oldest first.
pub async fn get_obstacles(state: &Arc<DaemonState>) -> Result {
    let obstacles = state
        .ledger
        .list_obstacles()
        .map_err(|e| RpcError::internal_error(&format!("db error: {e}")))?;
    serde_json::to_value(obstacles).map_err(|e| RpcError::internal_error(&e.to_string()))
}

/// Peers heard from, with last-seen times.
pub async fn get_peers(state: &Arc<DaemonState>) -> Result {
    let peers = state
        .ledger
        .list_peers()
        .map_err(|e| RpcError::internal_error(&format!("db error: {e}")))?;
    serde_json::to_value(peers).map_err(|e| RpcError::internal_error(&e.to_string()))
}
