//! Core value types shared across the crate
//!
//! Everything here is plain data: machine coordinates, plate corners,
//! grid dimensions and the traversal pattern used by the sequencer.

use crate::errors::WellPathError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A point in machine coordinates (millimeters).
///
/// Serialized as a `[x, y, z]` array, matching the calibration file format.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "[f64; 3]", into = "[f64; 3]")]
pub struct Point3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// A measured plate corner.
pub type Corner = Point3;

/// The interpolated center of one well.
pub type WellPosition = Point3;

impl Point3 {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    /// Euclidean distance in the XY plane, ignoring Z.
    pub fn planar_distance(&self, other: &Point3) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

impl From<[f64; 3]> for Point3 {
    fn from(v: [f64; 3]) -> Self {
        Self::new(v[0], v[1], v[2])
    }
}

impl From<Point3> for [f64; 3] {
    fn from(p: Point3) -> Self {
        [p.x, p.y, p.z]
    }
}

impl From<(f64, f64, f64)> for Point3 {
    fn from((x, y, z): (f64, f64, f64)) -> Self {
        Self::new(x, y, z)
    }
}

impl fmt::Display for Point3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "X:{:.2} Y:{:.2} Z:{:.2}", self.x, self.y, self.z)
    }
}

impl FromStr for Point3 {
    type Err = WellPathError;

    /// Parses `"x,y,z"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        if parts.len() != 3 {
            return Err(WellPathError::validation(
                "point",
                format!("expected `x,y,z`, got `{}`", s),
            ));
        }
        let mut values = [0.0f64; 3];
        for (slot, (axis, part)) in values.iter_mut().zip(["x", "y", "z"].iter().zip(parts)) {
            *slot = part.parse().map_err(|_| {
                WellPathError::validation(*axis, format!("`{}` is not a number", part))
            })?;
        }
        Ok(values.into())
    }
}

/// The four measured corner wells of a plate.
///
/// "Upper" is the row labeled `A`; "left" is column `1`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlateCorners {
    pub upper_left: Corner,
    pub lower_left: Corner,
    pub upper_right: Corner,
    pub lower_right: Corner,
}

impl PlateCorners {
    pub fn new(
        upper_left: Corner,
        lower_left: Corner,
        upper_right: Corner,
        lower_right: Corner,
    ) -> Self {
        Self {
            upper_left,
            lower_left,
            upper_right,
            lower_right,
        }
    }

    /// Corners in `(name, point)` form, in file order.
    pub fn named(&self) -> [(&'static str, Corner); 4] {
        [
            ("upper_left", self.upper_left),
            ("lower_left", self.lower_left),
            ("upper_right", self.upper_right),
            ("lower_right", self.lower_right),
        ]
    }

    /// True if any two corners share both X and Y.
    ///
    /// The interpolator accepts degenerate plates; this is for callers
    /// that want to warn before saving one.
    pub fn is_degenerate(&self) -> bool {
        let named = self.named();
        for (i, (_, a)) in named.iter().enumerate() {
            for (_, b) in named.iter().skip(i + 1) {
                if a.x == b.x && a.y == b.y {
                    return true;
                }
            }
        }
        false
    }

    /// Rejects NaN or infinite coordinates, naming the corner.
    pub fn validate(&self) -> Result<(), WellPathError> {
        for (name, corner) in self.named() {
            if !corner.is_finite() {
                return Err(WellPathError::validation(
                    name,
                    format!("corner coordinates must be finite, got {:?}", corner),
                ));
            }
        }
        Ok(())
    }
}

/// Grid dimensions: `width` wells per row, `depth` wells per column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridSize {
    width: usize,
    depth: usize,
}

impl GridSize {
    pub fn new(width: usize, depth: usize) -> Result<Self, WellPathError> {
        if width == 0 {
            return Err(WellPathError::validation(
                "width",
                "grid width must be at least 1",
            ));
        }
        if depth == 0 {
            return Err(WellPathError::validation(
                "depth",
                "grid depth must be at least 1",
            ));
        }
        width.checked_mul(depth).ok_or_else(|| {
            WellPathError::validation("width", format!("{}x{} grid is too large", width, depth))
        })?;
        Ok(Self { width, depth })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn well_count(&self) -> usize {
        self.width * self.depth
    }

    /// Row-major index of `(row, col)`, or `None` outside the grid.
    pub fn index_of(&self, index: GridIndex) -> Option<usize> {
        (index.row < self.depth && index.col < self.width)
            .then(|| index.row * self.width + index.col)
    }

    /// Grid cell at row-major position `i`.
    pub fn index_at(&self, i: usize) -> GridIndex {
        GridIndex {
            row: i / self.width,
            col: i % self.width,
        }
    }
}

impl fmt::Display for GridSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.depth)
    }
}

/// Zero-based grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridIndex {
    pub row: usize,
    pub col: usize,
}

impl GridIndex {
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

/// Order in which selected wells are visited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Pattern {
    /// Every row left to right, rows top to bottom.
    #[default]
    Raster,
    /// Even rows left to right, odd rows right to left.
    Snake,
}

impl Pattern {
    pub fn as_str(&self) -> &'static str {
        match self {
            Pattern::Raster => "raster",
            Pattern::Snake => "snake",
        }
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Pattern {
    type Err = WellPathError;

    /// Accepts `raster`/`snake` and the arrow-decorated forms older
    /// profiles stored (`"snake →↙"`, `"raster →↓"`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let word = s.split_whitespace().next().unwrap_or("");
        match word.to_ascii_lowercase().as_str() {
            "raster" => Ok(Pattern::Raster),
            "snake" => Ok(Pattern::Snake),
            _ => Err(WellPathError::validation(
                "pattern",
                format!("unknown pattern `{}` (expected `snake` or `raster`)", s),
            )),
        }
    }
}

impl TryFrom<String> for Pattern {
    type Error = WellPathError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Pattern> for String {
    fn from(p: Pattern) -> Self {
        p.as_str().to_string()
    }
}
