//! Diagnostics command handlers.

use std::sync::Arc;

use serde_json::Value;
use tracing::info;

use crate::config::RadioKind;
use crate::rpc::RpcError;
use crate::DaemonState;

type Result = std::result::Result<Value, RpcError>;

/// Node identity, settings in effect, and ledger row counts.
pub async fn get_node_status(state: &Arc<DaemonState>) -> Result {
    let counts = state
        .ledger
        .counts()
        .map_err(|e| RpcError::internal_error(&format!("db error: {e}")))?;
    let grid = state.pathfinder.config();
    let radio = match state.config.radio.kind {
        RadioKind::Udp => "udp",
        RadioKind::Loopback => "loopback",
    };

    Ok(serde_json::json!({
        "version": env!("CARGO_PKG_VERSION"),
        "peer_id": state.peer_id(),
        "max_ttl": state.forwarder.config().max_ttl,
        "radio": radio,
        "grid": {
            "width": grid.width,
            "height": grid.height,
            "default_cost": grid.default_cost,
        },
        "ledger": {
            "seen": counts.seen,
            "annotations": counts.annotations,
            "obstacles": counts.obstacles,
            "peers": counts.peers,
        },
    }))
}

/// Ask the daemon to stop.
pub async fn shutdown(state: &Arc<DaemonState>) -> Result {
    info!("Shutdown requested over RPC");
    let _ = state.shutdown_tx.send(());
    Ok(serde_json::json!({"stopping": true}))
}
