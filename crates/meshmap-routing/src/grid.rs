//! Traversal cost grid.

use meshmap_types::Obstacle;

use crate::projection::GridProjection;

/// Integer cell coordinate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GridCell {
    pub x: i32,
    pub y: i32,
}

impl GridCell {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance in cell units.
    pub fn distance(&self, other: &GridCell) -> f64 {
        let dx = (self.x - other.x) as f64;
        let dy = (self.y - other.y) as f64;
        dx.hypot(dy)
    }

    /// The 8 surrounding cells, orthogonal first.
    pub fn neighbors_8(&self) -> [GridCell; 8] {
        let (x, y) = (self.x, self.y);
        [
            GridCell::new(x + 1, y),
            GridCell::new(x - 1, y),
            GridCell::new(x, y + 1),
            GridCell::new(x, y - 1),
            GridCell::new(x + 1, y + 1),
            GridCell::new(x + 1, y - 1),
            GridCell::new(x - 1, y + 1),
            GridCell::new(x - 1, y - 1),
        ]
    }
}

/// Per-cell traversal cost over a `width x height` grid.
///
/// Cells start at the default cost; cells inside an obstacle become
/// infinite and are never entered by the search.
#[derive(Clone, Debug)]
pub struct CostGrid {
    width: usize,
    height: usize,
    default_cost: f64,
    costs: Vec<f64>,
}

impl CostGrid {
    pub fn new(width: usize, height: usize, default_cost: f64) -> Self {
        Self {
            width,
            height,
            default_cost,
            costs: vec![default_cost; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn default_cost(&self) -> f64 {
        self.default_cost
    }

    pub fn contains(&self, cell: GridCell) -> bool {
        cell.x >= 0 && cell.y >= 0 && (cell.x as usize) < self.width && (cell.y as usize) < self.height
    }

    pub(crate) fn index(&self, cell: GridCell) -> Option<usize> {
        self.contains(cell)
            .then(|| cell.y as usize * self.width + cell.x as usize)
    }

    pub(crate) fn cell_at(&self, index: usize) -> GridCell {
        GridCell::new((index % self.width) as i32, (index / self.width) as i32)
    }

    pub(crate) fn len(&self) -> usize {
        self.costs.len()
    }

    /// Cost of entering `cell`. Cells outside the grid are infinite.
    pub fn cost(&self, cell: GridCell) -> f64 {
        self.index(cell)
            .map(|i| self.costs[i])
            .unwrap_or(f64::INFINITY)
    }

    pub fn is_blocked(&self, cell: GridCell) -> bool {
        self.cost(cell).is_infinite()
    }

    /// Number of infinite-cost cells.
    pub fn blocked_count(&self) -> usize {
        self.costs.iter().filter(|c| c.is_infinite()).count()
    }

    /// Set every cell back to the default cost.
    pub fn reset(&mut self) {
        self.costs.fill(self.default_cost);
    }

    /// Mark every cell within Euclidean distance `radius` of `center` as
    /// infinite. Negative or NaN radii mark nothing.
    pub fn block_disk(&mut self, center: GridCell, radius: f64) {
        if radius.is_nan() || radius < 0.0 {
            return;
        }
        let reach = radius.floor().min(i32::MAX as f64) as i64;
        let x_lo = (center.x as i64 - reach).max(0);
        let x_hi = (center.x as i64 + reach).min(self.width as i64 - 1);
        let y_lo = (center.y as i64 - reach).max(0);
        let y_hi = (center.y as i64 + reach).min(self.height as i64 - 1);

        for y in y_lo..=y_hi {
            for x in x_lo..=x_hi {
                let cell = GridCell::new(x as i32, y as i32);
                if center.distance(&cell) <= radius {
                    if let Some(i) = self.index(cell) {
                        self.costs[i] = f64::INFINITY;
                    }
                }
            }
        }
    }

    /// Reset, then block the disk of every obstacle.
    pub fn rebuild(&mut self, obstacles: &[Obstacle], projection: &GridProjection) {
        self.reset();
        for obstacle in obstacles {
            let center = projection.to_cell(obstacle.center());
            self.block_disk(center, obstacle.radius);
        }
        tracing::debug!(
            obstacles = obstacles.len(),
            blocked = self.blocked_count(),
            "Cost grid rebuilt"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obstacle(lat: f64, lon: f64, radius: f64) -> Obstacle {
        Obstacle {
            id: format!("o-{lat}-{lon}"),
            peer_id: "p".into(),
            timestamp: 0,
            lat,
            lon,
            radius,
            data: String::new(),
        }
    }

    #[test]
    fn test_default_costs() {
        let grid = CostGrid::new(4, 3, 2.5);
        assert_eq!(grid.cost(GridCell::new(0, 0)), 2.5);
        assert_eq!(grid.cost(GridCell::new(3, 2)), 2.5);
        assert!(grid.is_blocked(GridCell::new(4, 0)));
        assert!(grid.is_blocked(GridCell::new(0, -1)));
        assert_eq!(grid.blocked_count(), 0);
    }

    #[test]
    fn test_block_disk_radius_one() {
        let mut grid = CostGrid::new(5, 5, 1.0);
        grid.block_disk(GridCell::new(2, 2), 1.0);

        // Centre plus the 4 orthogonal neighbours; diagonals are at sqrt(2).
        assert_eq!(grid.blocked_count(), 5);
        assert!(grid.is_blocked(GridCell::new(2, 2)));
        assert!(grid.is_blocked(GridCell::new(1, 2)));
        assert!(!grid.is_blocked(GridCell::new(1, 1)));
    }

    #[test]
    fn test_block_disk_edge_and_degenerate_radii() {
        let mut grid = CostGrid::new(5, 5, 1.0);
        grid.block_disk(GridCell::new(0, 0), 1.5);
        assert_eq!(grid.blocked_count(), 4);

        let mut grid = CostGrid::new(5, 5, 1.0);
        grid.block_disk(GridCell::new(2, 2), 0.0);
        assert_eq!(grid.blocked_count(), 1);

        let mut grid = CostGrid::new(5, 5, 1.0);
        grid.block_disk(GridCell::new(2, 2), -1.0);
        grid.block_disk(GridCell::new(2, 2), f64::NAN);
        assert_eq!(grid.blocked_count(), 0);

        let mut grid = CostGrid::new(5, 5, 1.0);
        grid.block_disk(GridCell::new(2, 2), f64::INFINITY);
        assert_eq!(grid.blocked_count(), 25);
    }

    #[test]
    fn test_rebuild_resets_previous_obstacles() {
        let projection = GridProjection::new(180, 360);
        let mut grid = CostGrid::new(180, 360, 1.0);

        grid.rebuild(&[obstacle(10.0, 10.0, 2.0)], &projection);
        assert!(grid.is_blocked(GridCell::new(10, 10)));

        grid.rebuild(&[obstacle(50.0, 50.0, 0.0)], &projection);
        assert!(!grid.is_blocked(GridCell::new(10, 10)));
        assert!(grid.is_blocked(GridCell::new(50, 50)));
        assert_eq!(grid.blocked_count(), 1);
    }

    #[test]
    fn test_index_roundtrip() {
        let grid = CostGrid::new(7, 4, 1.0);
        for i in 0..grid.len() {
            assert_eq!(grid.index(grid.cell_at(i)), Some(i));
        }
    }
}
