//! Route planning command handlers.

use std::sync::Arc;

use meshmap_types::GeoPoint;
use serde_json::Value;

use crate::rpc::RpcError;
use crate::DaemonState;

type Result = std::result::Result<Value, RpcError>;

fn require_point(params: &Value, key: &str) -> std::result::Result<GeoPoint, RpcError> {
    let value = params
        .get(key)
        .ok_or_else(|| RpcError::invalid_params(&format!("{key} required")))?;
    serde_json::from_value::<GeoPoint>(value.clone())
        .map_err(|_| RpcError::invalid_params(&format!("{key} must be [lat, lon]")))
}

/// Route from `start` to `goal` around every known obstacle.
///
/// `path` lists cell centres as `[lat, lon]` and is empty (with a null
/// `cost`) when the goal cannot be reached. `cost` is length-weighted: each
/// step adds the entered cell's cost times 1 for an orthogonal move or
/// sqrt(2) for a diagonal one, so it is not a plain sum of cell costs.
pub async fn get_path(state: &Arc<DaemonState>, params: &Value) -> Result {
    let start = require_point(params, "start")?;
    let goal = require_point(params, "goal")?;

    let pathfinder = state.pathfinder.clone();
    let route = tokio::task::spawn_blocking(move || pathfinder.find_path(start, goal))
        .await
        .map_err(|e| RpcError::internal_error(&format!("path task failed: {e}")))?
        .map_err(|e| RpcError::internal_error(&format!("path query failed: {e}")))?;

    Ok(serde_json::json!({
        "path": route.points,
        "cost": route.cost,
    }))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::commands::map::add_obstacle;
    use crate::test_state;

    #[tokio::test]
    async fn test_open_path() {
        let (state, _observer) = test_state();
        let result = get_path(&state, &json!({"start": [10.0, 10.0], "goal": [12.0, 10.0]}))
            .await
            .expect("path");
        assert_eq!(
            result["path"],
            json!([[10.5, 10.5], [11.5, 10.5], [12.5, 10.5]])
        );
        assert_eq!(result["cost"], 2.0);
    }

    #[tokio::test]
    async fn test_obstacle_on_goal_gives_empty_path() {
        let (state, _observer) = test_state();
        add_obstacle(&state, &json!({"lat": 50.0, "lon": 50.0, "radius": 2}))
            .await
            .expect("add");
        let result = get_path(&state, &json!({"start": [10.0, 10.0], "goal": [51.0, 50.0]}))
            .await
            .expect("path");
        assert_eq!(result["path"], json!([]));
        assert_eq!(result["cost"], Value::Null);
    }

    #[tokio::test]
    async fn test_bad_points_rejected() {
        let (state, _observer) = test_state();
        for params in [
            json!({"goal": [1.0, 1.0]}),
            json!({"start": [1.0], "goal": [1.0, 1.0]}),
            json!({"start": {"lat": 1.0, "lon": 1.0}, "goal": [1.0, 1.0]}),
            json!({"start": [1.0, 1.0], "goal": "home"}),
        ] {
            let err = get_path(&state, &params).await.expect_err("invalid");
            assert_eq!(err.code, -32602, "{params}");
        }
    }

    #[tokio::test]
    async fn test_diagonal_steps_cost_sqrt_two() {
        let (state, _observer) = test_state();
        let result = get_path(&state, &json!({"start": [10.0, 10.0], "goal": [12.0, 12.0]}))
            .await
            .expect("path");
        assert_eq!(
            result["path"],
            json!([[10.5, 10.5], [11.5, 11.5], [12.5, 12.5]])
        );
        let cost = result["cost"].as_f64().expect("cost");
        assert!((cost - 2.0 * std::f64::consts::SQRT_2).abs() < 1e-9);
    }
}
