//! Corner interpolation for well plates
//!
//! Given the four measured corner wells of a plate and its grid size, compute
//! the center of every well by bilinear interpolation. Each interior point is
//! a blend of all four corners, so the grid follows plate rotation, skew and
//! tilt (Z is interpolated like X and Y).
//!
//! Output order is row-major: row 0 (the `A` row) first, and within a row
//! column 0 first. This is the same order [`crate::labels::generate_labels`]
//! produces.

use crate::errors::WellPathError;
use crate::types::{Corner, GridSize, PlateCorners, Point3, WellPosition};

/// Linear interpolation that returns `a` at `t == 0` and `b` at `t == 1`
/// exactly, and `a` for any `t` when `a == b`.
fn lerp(a: f64, b: f64, t: f64) -> f64 {
    if t >= 1.0 {
        b
    } else {
        a + t * (b - a)
    }
}

fn lerp_point(a: &Point3, b: &Point3, t: f64) -> Point3 {
    Point3 {
        x: lerp(a.x, b.x, t),
        y: lerp(a.y, b.y, t),
        z: lerp(a.z, b.z, t),
    }
}

/// Fraction of the way from the first to the last of `count` cells.
///
/// A single cell sits at 0.0, which makes a one-row or one-column grid use
/// only the upper/left edge of the plate.
fn fraction(index: usize, count: usize) -> f64 {
    if count > 1 {
        index as f64 / (count - 1) as f64
    } else {
        0.0
    }
}

/// Interpolate a single well at `(row, col)`.
pub fn position_at(grid: GridSize, corners: &PlateCorners, row: usize, col: usize) -> WellPosition {
    let u = fraction(col, grid.width());
    let v = fraction(row, grid.depth());

    let top = lerp_point(&corners.upper_left, &corners.upper_right, u);
    let bottom = lerp_point(&corners.lower_left, &corners.lower_right, u);
    lerp_point(&top, &bottom, v)
}

/// Interpolate every well of `grid`, row-major.
pub fn interpolate(grid: GridSize, corners: &PlateCorners) -> Vec<WellPosition> {
    let mut positions = Vec::with_capacity(grid.well_count());
    for row in 0..grid.depth() {
        for col in 0..grid.width() {
            positions.push(position_at(grid, corners, row, col));
        }
    }

    log::debug!(
        "Interpolated {} wells for a {} grid (UL {}, LR {})",
        positions.len(),
        grid,
        corners.upper_left,
        corners.lower_right
    );
    positions
}

/// Generate the well grid for a `width` × `depth` plate.
///
/// `width` counts wells along a row (the long side of a landscape plate),
/// `depth` counts rows. Both must be at least 1.
pub fn generate_grid(
    width: usize,
    depth: usize,
    upper_left: Corner,
    lower_left: Corner,
    upper_right: Corner,
    lower_right: Corner,
) -> Result<Vec<WellPosition>, WellPathError> {
    let grid = GridSize::new(width, depth)?;
    let corners = PlateCorners::new(upper_left, lower_left, upper_right, lower_right);
    Ok(interpolate(grid, &corners))
}
