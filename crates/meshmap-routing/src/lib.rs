//! # meshmap-routing
//!
//! Obstacle-aware route planning on a fixed-size cost grid.
//!
//! Every query rebuilds the grid from the ledger's current obstacle set and
//! runs a fresh A* search; nothing is carried over between queries.
//!
//! ```text
//! Ledger::list_obstacles()
//!     |
//!     v
//! CostGrid::rebuild      -- default cost, infinite inside every obstacle disk
//!     |
//!     v
//! search::find           -- A*, 8-connected, Euclidean heuristic
//!     |
//!     v
//! GridProjection::to_geo -- cell centres back to [lat, lon]
//! ```
//!
//! Rebuilding costs O(obstacles x cells covered) per query and the search
//! is O(cells log cells), so the grid is meant to stay small (the default
//! is 100 x 100).

pub mod grid;
pub mod pathfinder;
pub mod projection;
pub mod search;

pub use grid::{CostGrid, GridCell};
pub use pathfinder::{Pathfinder, Route, RoutingConfig, MAX_GRID_CELLS};
pub use projection::GridProjection;
pub use search::GridPath;

use meshmap_db::LedgerError;

/// Routing error types.
#[derive(Debug, thiserror::Error)]
pub enum RoutingError {
    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("invalid grid: {0}")]
    InvalidGrid(String),
}

pub type Result<T> = std::result::Result<T, RoutingError>;
