//! JSON-RPC server over Unix socket.
//!
//! Listens on a Unix domain socket, accepts connections, and dispatches
//! newline-delimited JSON-RPC 2.0 calls to the command handlers.

use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{UnixListener, UnixStream};
use tracing::{debug, error, info, warn};

use crate::commands;
use crate::DaemonState;

/// Error codes used by this daemon. All are JSON-RPC 2.0 reserved codes.
pub mod codes {
    pub const PARSE_ERROR: i32 = -32700;
    pub const INVALID_REQUEST: i32 = -32600;
    pub const METHOD_NOT_FOUND: i32 = -32601;
    pub const INVALID_PARAMS: i32 = -32602;
    pub const INTERNAL_ERROR: i32 = -32603;
}

/// JSON-RPC request.
#[derive(Debug, Deserialize)]
pub struct RpcRequest {
    /// Must be "2.0".
    pub jsonrpc: String,
    /// Echoed back unchanged. Absent for notifications, which still get a
    /// response here.
    #[serde(default)]
    pub id: Value,
    pub method: String,
    #[serde(default)]
    pub params: Value,
}

/// JSON-RPC response. Exactly one of `result` and `error` is set.
#[derive(Debug, Serialize)]
pub struct RpcResponse {
    pub jsonrpc: &'static str,
    pub id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

/// JSON-RPC error object.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RpcError {
    pub code: i32,
    /// Upper-case error name.
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl RpcResponse {
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn error(id: Value, error: RpcError) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: None,
            error: Some(error),
        }
    }
}

impl RpcError {
    fn new(code: i32, message: &str, data: Option<Value>) -> Self {
        Self {
            code,
            message: message.to_string(),
            data,
        }
    }

    pub fn parse_error() -> Self {
        Self::new(codes::PARSE_ERROR, "PARSE_ERROR", None)
    }

    pub fn invalid_request() -> Self {
        Self::new(codes::INVALID_REQUEST, "INVALID_REQUEST", None)
    }

    pub fn method_not_found(method: &str) -> Self {
        Self::new(
            codes::METHOD_NOT_FOUND,
            "METHOD_NOT_FOUND",
            Some(json!({ "method": method })),
        )
    }

    /// Missing or ill-typed parameters. The handler made no changes.
    pub fn invalid_params(detail: &str) -> Self {
        Self::new(
            codes::INVALID_PARAMS,
            "INVALID_PARAMS",
            Some(json!({ "detail": detail })),
        )
    }

    pub fn internal_error(detail: &str) -> Self {
        Self::new(
            codes::INTERNAL_ERROR,
            "INTERNAL_ERROR",
            Some(json!({ "detail": detail })),
        )
    }
}

/// Accepts socket clients and answers their requests.
pub struct RpcServer {
    state: Arc<DaemonState>,
    socket_path: PathBuf,
}

impl RpcServer {
    pub fn new(state: Arc<DaemonState>, socket_path: PathBuf) -> Self {
        Self { state, socket_path }
    }

    /// Bind the socket and serve clients until the task is dropped.
    ///
    /// A leftover socket file from an unclean exit is replaced.
    pub async fn run(&self) -> anyhow::Result<()> {
        if self.socket_path.exists() {
            std::fs::remove_file(&self.socket_path)?;
        }
        let listener = UnixListener::bind(&self.socket_path)?;
        info!(path = %self.socket_path.display(), "RPC socket ready");

        loop {
            let stream = match listener.accept().await {
                Ok((stream, _)) => stream,
                Err(e) => {
                    error!(error = %e, "RPC accept failed");
                    continue;
                }
            };
            let state = Arc::clone(&self.state);
            tokio::spawn(async move {
                if let Err(e) = serve_client(state, stream).await {
                    warn!(error = %e, "RPC client dropped");
                }
            });
        }
    }
}

/// One response line per request line, in order, until the client hangs up.
async fn serve_client(state: Arc<DaemonState>, stream: UnixStream) -> anyhow::Result<()> {
    let (read_half, mut write_half) = stream.into_split();
    let mut requests = BufReader::new(read_half).lines();

    while let Some(line) = requests.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let response = handle_line(&state, &line).await;
        let mut out = serde_json::to_vec(&response)?;
        out.push(b'\n');
        write_half.write_all(&out).await?;
    }
    Ok(())
}

/// Decode one request line and dispatch it.
pub(crate) async fn handle_line(state: &Arc<DaemonState>, line: &str) -> RpcResponse {
    match serde_json::from_str::<RpcRequest>(line) {
        Ok(request) if request.jsonrpc != "2.0" => {
            RpcResponse::error(request.id, RpcError::invalid_request())
        }
        Ok(request) => dispatch_request(state.clone(), request).await,
        Err(_) => RpcResponse::error(Value::Null, RpcError::parse_error()),
    }
}

/// Dispatch a JSON-RPC request to the appropriate command handler.
async fn dispatch_request(state: Arc<DaemonState>, request: RpcRequest) -> RpcResponse {
    let RpcRequest { id, method, params, .. } = request;
    debug!(%method, "RPC call");

    let result = match method.as_str() {
        // Map data
        "add_annotation" => commands::map::add_annotation(&state, &params).await,
        "add_obstacle" => commands::map::add_obstacle(&state, &params).await,
        "get_annotations" => commands::map::get_annotations(&state).await,
        "get_obstacles" => commands::map::get_obstacles(&state).await,
        "get_peers" => commands::map::get_peers(&state).await,

        // Routing
        "get_path" => commands::routing::get_path(&state, &params).await,

        // Diagnostics
        "get_node_status" => commands::diagnostics::get_node_status(&state).await,
        "shutdown" => commands::diagnostics::shutdown(&state).await,

        _ => Err(RpcError::method_not_found(&method)),
    };

    match result {
        Ok(value) => RpcResponse::success(id, value),
        Err(err) => RpcResponse::error(id, err),
    }
}
