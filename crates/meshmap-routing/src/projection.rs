//! Geographic point <-> grid cell mapping.
//!
//! Latitude over `[0, 180]` maps linearly onto `x` in `[0, width)`,
//! longitude over `[0, 360]` onto `y` in `[0, height)`. Out-of-range
//! inputs are clamped to the border cells.
//!
//! The reverse mapping returns the centre of a cell, so
//! `to_cell(to_geo(c)) == c` for every cell in the grid. This is a plain
//! linear scaling, not a map projection.

use meshmap_types::GeoPoint;

use crate::grid::GridCell;

const LAT_SPAN: f64 = 180.0;
const LON_SPAN: f64 = 360.0;

/// Linear mapping between geographic points and cells of a `width x height` grid.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridProjection {
    width: usize,
    height: usize,
}

impl GridProjection {
    /// `width` and `height` must be at least 1.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Cell containing `point`, clamped into the grid.
    pub fn to_cell(&self, point: GeoPoint) -> GridCell {
        GridCell::new(
            scale_to_index(point.lat, LAT_SPAN, self.width),
            scale_to_index(point.lon, LON_SPAN, self.height),
        )
    }

    /// Centre of `cell`.
    pub fn to_geo(&self, cell: GridCell) -> GeoPoint {
        GeoPoint::new(
            (cell.x as f64 + 0.5) * LAT_SPAN / self.width as f64,
            (cell.y as f64 + 0.5) * LON_SPAN / self.height as f64,
        )
    }
}

fn scale_to_index(value: f64, span: f64, cells: usize) -> i32 {
    let scaled = (value * cells as f64 / span).floor();
    // NaN and negatives land on 0, overshoot on the last cell.
    let max = (cells - 1) as f64;
    scaled.clamp(0.0, max) as i32
}
