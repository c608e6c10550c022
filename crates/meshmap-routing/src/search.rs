//! A* search over a [`CostGrid`].
//!
//! - 8-connected moves
//! - Moving into a cell costs that cell's cost times the step length
//!   (1 orthogonal, sqrt(2) diagonal)
//! - Heuristic: Euclidean distance to the goal times the grid's default
//!   cost. Every finite cell costs the default, so the heuristic never
//!   overestimates and the first time the goal is popped its cost is
//!   optimal.
//! - Infinite-cost cells are never pushed onto the frontier.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use tracing::{debug, trace};

use crate::grid::{CostGrid, GridCell};

/// A path found by [`find`].
#[derive(Clone, Debug, PartialEq)]
pub struct GridPath {
    /// Cells from start to goal, both included.
    pub cells: Vec<GridCell>,
    /// Sum of step costs along `cells`: each entered cell's cost times the
    /// step length (1 or sqrt(2)).
    pub cost: f64,
    /// Nodes popped from the frontier.
    pub expanded: usize,
}

/// Frontier entry.
#[derive(Clone, Copy, Debug)]
struct Node {
    cell: GridCell,
    index: usize,
    g_cost: f64,
    f_cost: f64,
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Node {}

impl Ord for Node {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering for min-heap behavior. Ties on f prefer the
        // deeper node, then the lower cell, so equal-cost runs pop in a
        // fixed order.
        other
            .f_cost
            .total_cmp(&self.f_cost)
            .then_with(|| self.g_cost.total_cmp(&other.g_cost))
            .then_with(|| other.cell.cmp(&self.cell))
    }
}

impl PartialOrd for Node {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Find a least-cost path from `start` to `goal`.
///
/// Returns `None` when either endpoint is outside the grid or blocked, or
/// when the frontier empties without reaching the goal.
pub fn find(grid: &CostGrid, start: GridCell, goal: GridCell) -> Option<GridPath> {
    trace!(?start, ?goal, "A* search");

    let (Some(start_index), Some(goal_index)) = (grid.index(start), grid.index(goal)) else {
        debug!(?start, ?goal, "Endpoint outside grid");
        return None;
    };
    if grid.is_blocked(start) {
        debug!(?start, "Start cell blocked");
        return None;
    }
    if grid.is_blocked(goal) {
        debug!(?goal, "Goal cell blocked");
        return None;
    }

    let h_scale = grid.default_cost();
    let heuristic = |cell: GridCell| cell.distance(&goal) * h_scale;

    let mut open_set = BinaryHeap::new();
    let mut closed = vec![false; grid.len()];
    let mut came_from: Vec<Option<usize>> = vec![None; grid.len()];
    let mut g_scores = vec![f64::INFINITY; grid.len()];

    g_scores[start_index] = 0.0;
    open_set.push(Node {
        cell: start,
        index: start_index,
        g_cost: 0.0,
        f_cost: heuristic(start),
    });

    let mut expanded = 0usize;

    while let Some(current) = open_set.pop() {
        if closed[current.index] {
            continue;
        }
        closed[current.index] = true;
        expanded += 1;

        if current.index == goal_index {
            let cells = reconstruct(grid, &came_from, goal_index);
            debug!(
                len = cells.len(),
                cost = current.g_cost,
                expanded,
                "A* reached goal"
            );
            return Some(GridPath {
                cells,
                cost: current.g_cost,
                expanded,
            });
        }

        for (i, neighbor) in current.cell.neighbors_8().into_iter().enumerate() {
            let Some(n_index) = grid.index(neighbor) else {
                continue;
            };
            if closed[n_index] {
                continue;
            }

            let cell_cost = grid.cost(neighbor);
            if cell_cost.is_infinite() {
                continue;
            }

            let step = if i >= 4 { std::f64::consts::SQRT_2 } else { 1.0 };
            let tentative_g = current.g_cost + cell_cost * step;

            if tentative_g < g_scores[n_index] {
                g_scores[n_index] = tentative_g;
                came_from[n_index] = Some(current.index);
                open_set.push(Node {
                    cell: neighbor,
                    index: n_index,
                    g_cost: tentative_g,
                    f_cost: tentative_g + heuristic(neighbor),
                });
            }
        }
    }

    debug!(expanded, "A* frontier exhausted");
    None
}

fn reconstruct(grid: &CostGrid, came_from: &[Option<usize>], goal_index: usize) -> Vec<GridCell> {
    let mut cells = vec![grid.cell_at(goal_index)];
    let mut current = goal_index;
    while let Some(prev) = came_from[current] {
        cells.push(grid.cell_at(prev));
        current = prev;
    }
    cells.reverse();
    cells
}
