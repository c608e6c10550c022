//! IPC command handlers.
//!
//! Each submodule implements the commands for one IPC category.

pub mod diagnostics;
pub mod map;
pub mod routing;

use serde_json::Value;

use crate::rpc::RpcError;

/// Required finite number parameter.
pub(crate) fn require_f64(params: &Value, key: &str) -> Result<f64, RpcError> {
    let value = params
        .get(key)
        .ok_or_else(|| RpcError::invalid_params(&format!("{key} required")))?;
    value
        .as_f64()
        .filter(|v| v.is_finite())
        .ok_or_else(|| RpcError::invalid_params(&format!("{key} must be a number")))
}

/// Optional string parameter. Absent and `null` are both `None`.
pub(crate) fn optional_str(params: &Value, key: &str) -> Result<Option<String>, RpcError> {
    match params.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(RpcError::invalid_params(&format!("{key} must be a string"))),
    }
}
