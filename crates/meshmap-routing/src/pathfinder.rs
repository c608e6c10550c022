//! Ledger-backed route planning.

use std::sync::Arc;

use meshmap_db::Ledger;
use meshmap_types::GeoPoint;
use tracing::{debug, info};

use crate::grid::{CostGrid, GridCell};
use crate::projection::GridProjection;
use crate::search;
use crate::{Result, RoutingError};

/// Largest grid accepted, in cells. Each query allocates several
/// per-cell arrays, so this bounds per-query memory to tens of megabytes.
pub const MAX_GRID_CELLS: usize = 4_194_304;

/// Grid dimensions and base cell cost.
#[derive(Clone, Debug, PartialEq)]
pub struct RoutingConfig {
    pub width: usize,
    pub height: usize,
    pub default_cost: f64,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            width: 100,
            height: 100,
            default_cost: 1.0,
        }
    }
}

impl RoutingConfig {
    /// # Errors
    ///
    /// [`RoutingError::InvalidGrid`] for an empty grid, a grid of more than
    /// [`MAX_GRID_CELLS`] cells, or a default cost that is not a positive
    /// finite number.
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(RoutingError::InvalidGrid(format!(
                "grid must be at least 1x1, got {}x{}",
                self.width, self.height
            )));
        }
        let cells = self.width.checked_mul(self.height);
        if !matches!(cells, Some(n) if n <= MAX_GRID_CELLS) {
            return Err(RoutingError::InvalidGrid(format!(
                "grid {}x{} exceeds {MAX_GRID_CELLS} cells",
                self.width, self.height
            )));
        }
        if !self.default_cost.is_finite() || self.default_cost <= 0.0 {
            return Err(RoutingError::InvalidGrid(format!(
                "default cost must be finite and positive, got {}",
                self.default_cost
            )));
        }
        Ok(())
    }
}

/// Result of a path query.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Route {
    /// Grid cells from start to goal. Empty when unreachable.
    pub cells: Vec<GridCell>,
    /// Cell centres of `cells`.
    pub points: Vec<GeoPoint>,
    /// Total traversal cost, `None` when unreachable. Each step adds the
    /// entered cell's cost times the step length, so a diagonal step on a
    /// default-cost grid adds `sqrt(2) * default_cost`.
    pub cost: Option<f64>,
}

impl Route {
    pub fn unreachable() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// Plans routes that avoid every obstacle currently in the ledger.
pub struct Pathfinder {
    ledger: Arc<Ledger>,
    config: RoutingConfig,
    projection: GridProjection,
}

impl Pathfinder {
    /// # Errors
    ///
    /// Fails if `config` does not validate.
    pub fn new(ledger: Arc<Ledger>, config: RoutingConfig) -> Result<Self> {
        config.validate()?;
        let projection = GridProjection::new(config.width, config.height);
        Ok(Self {
            ledger,
            config,
            projection,
        })
    }

    pub fn config(&self) -> &RoutingConfig {
        &self.config
    }

    pub fn projection(&self) -> &GridProjection {
        &self.projection
    }

    /// Build a fresh cost grid from the ledger's current obstacles.
    pub fn build_grid(&self) -> Result<CostGrid> {
        let obstacles = self.ledger.list_obstacles()?;
        let mut grid = CostGrid::new(self.config.width, self.config.height, self.config.default_cost);
        grid.rebuild(&obstacles, &self.projection);
        Ok(grid)
    }

    /// Find a route from `start` to `goal`.
    ///
    /// An unreachable goal is an empty [`Route`], not an error. Only ledger
    /// failures are errors.
    pub fn find_path(&self, start: GeoPoint, goal: GeoPoint) -> Result<Route> {
        let grid = self.build_grid()?;
        let start_cell = self.projection.to_cell(start);
        let goal_cell = self.projection.to_cell(goal);

        let Some(path) = search::find(&grid, start_cell, goal_cell) else {
            info!(
                start = ?start_cell,
                goal = ?goal_cell,
                "No path found"
            );
            return Ok(Route::unreachable());
        };

        info!(
            len = path.cells.len(),
            cost = path.cost,
            expanded = path.expanded,
            "Path found"
        );
        let points = path
            .cells
            .iter()
            .map(|cell| self.projection.to_geo(*cell))
            .collect();
        debug!(start = ?start_cell, goal = ?goal_cell, "Route projected back to coordinates");

        Ok(Route {
            cells: path.cells,
            points,
            cost: Some(path.cost),
        })
    }
}

#[cfg(test)]
mod tests {
    use meshmap_types::Obstacle;

    use super::*;

    /// One degree of latitude per column, one degree of longitude per row.
    fn degree_grid() -> RoutingConfig {
        RoutingConfig {
            width: 180,
            height: 360,
            default_cost: 1.0,
        }
    }

    fn obstacle(id: &str, lat: f64, lon: f64, radius: f64) -> Obstacle {
        Obstacle {
            id: id.into(),
            peer_id: "node-a".into(),
            timestamp: 1,
            lat,
            lon,
            radius,
            data: String::new(),
        }
    }

    fn pathfinder() -> (Arc<Ledger>, Pathfinder) {
        let ledger = Arc::new(Ledger::open_memory().expect("ledger"));
        let pf = Pathfinder::new(ledger.clone(), degree_grid()).expect("pathfinder");
        (ledger, pf)
    }

    #[test]
    fn test_config_validation() {
        assert!(RoutingConfig::default().validate().is_ok());
        for bad in [
            RoutingConfig { width: 0, ..Default::default() },
            RoutingConfig { height: 0, ..Default::default() },
            RoutingConfig { default_cost: 0.0, ..Default::default() },
            RoutingConfig { default_cost: f64::INFINITY, ..Default::default() },
            RoutingConfig { default_cost: f64::NAN, ..Default::default() },
        ] {
            assert!(matches!(bad.validate(), Err(RoutingError::InvalidGrid(_))));
        }
        let ledger = Arc::new(Ledger::open_memory().expect("ledger"));
        assert!(Pathfinder::new(ledger, RoutingConfig { width: 0, ..Default::default() }).is_err());
    }

    #[test]
    fn test_oversized_grid_rejected() {
        let at_limit = RoutingConfig {
            width: 2048,
            height: MAX_GRID_CELLS / 2048,
            default_cost: 1.0,
        };
        assert!(at_limit.validate().is_ok());

        for (width, height) in [(100_000, 100_000), (2049, 2048), (usize::MAX, 2)] {
            let config = RoutingConfig {
                width,
                height,
                default_cost: 1.0,
            };
            assert!(
                matches!(config.validate(), Err(RoutingError::InvalidGrid(_))),
                "{width}x{height}"
            );
        }
    }

    #[test]
    fn test_open_map_route() {
        let (_ledger, pf) = pathfinder();
        let route = pf
            .find_path(GeoPoint::new(10.2, 10.7), GeoPoint::new(20.5, 10.5))
            .expect("find");
        assert_eq!(route.cells.first(), Some(&GridCell::new(10, 10)));
        assert_eq!(route.cells.last(), Some(&GridCell::new(20, 10)));
        assert_eq!(route.cells.len(), 11);
        assert_eq!(route.points.len(), route.cells.len());
        assert_eq!(route.points[0], GeoPoint::new(10.5, 10.5));
        assert_eq!(route.cost, Some(10.0));
    }

    #[test]
    fn test_route_avoids_obstacle() {
        let (ledger, pf) = pathfinder();
        ledger
            .insert_obstacle(&obstacle("o1", 15.0, 10.0, 2.0))
            .expect("insert");

        let route = pf
            .find_path(GeoPoint::new(10.0, 10.0), GeoPoint::new(20.0, 10.0))
            .expect("find");
        assert!(!route.is_empty());

        let grid = pf.build_grid().expect("grid");
        for cell in &route.cells {
            assert!(!grid.is_blocked(*cell), "route enters {cell:?}");
        }
        assert!(route.cost.expect("cost") > 10.0);
    }

    #[test]
    fn test_enclosed_goal_is_empty() {
        let (ledger, pf) = pathfinder();
        ledger
            .insert_obstacle(&obstacle("o1", 50.0, 50.0, 1.0))
            .expect("insert");

        let route = pf
            .find_path(GeoPoint::new(10.0, 10.0), GeoPoint::new(50.0, 50.0))
            .expect("find");
        assert!(route.is_empty());
        assert!(route.points.is_empty());
        assert_eq!(route.cost, None);
    }

    #[test]
    fn test_surrounded_start_then_gap_opens() {
        let ledger = Arc::new(Ledger::open_memory().expect("ledger"));
        let pf = Pathfinder::new(
            ledger.clone(),
            RoutingConfig {
                width: 18,
                height: 36,
                default_cost: 1.0,
            },
        )
        .expect("pathfinder");
        // 10 degrees per cell on this grid. A radius 17 disk centred at
        // cell (8, 18) covers the whole 18-wide band between start and goal.
        ledger
            .insert_obstacle(&obstacle("wall", 85.0, 185.0, 17.0))
            .expect("insert");
        let start = GeoPoint::new(5.0, 5.0);
        let goal = GeoPoint::new(175.0, 355.0);
        assert!(pf.find_path(start, goal).expect("find").is_empty());

        // A fresh ledger with a smaller obstacle leaves room around it.
        let ledger = Arc::new(Ledger::open_memory().expect("ledger"));
        let pf = Pathfinder::new(ledger.clone(), pf.config().clone()).expect("pathfinder");
        ledger
            .insert_obstacle(&obstacle("rock", 85.0, 185.0, 5.0))
            .expect("insert");
        let route = pf.find_path(start, goal).expect("find");
        assert!(!route.is_empty());
        let grid = pf.build_grid().expect("grid");
        assert!(route.cells.iter().all(|c| !grid.is_blocked(*c)));
    }

    #[test]
    fn test_recompute_sees_new_obstacles() {
        let (ledger, pf) = pathfinder();
        let start = GeoPoint::new(10.0, 10.0);
        let goal = GeoPoint::new(30.0, 10.0);
        let before = pf.find_path(start, goal).expect("find");
        assert_eq!(before.cost, Some(20.0));

        ledger
            .insert_obstacle(&obstacle("o1", 20.0, 10.0, 3.0))
            .expect("insert");
        let after = pf.find_path(start, goal).expect("find");
        assert!(after.cost.expect("cost") > 20.0);

        let again = pf.find_path(start, goal).expect("find");
        assert_eq!(after.cost, again.cost);
    }
}
