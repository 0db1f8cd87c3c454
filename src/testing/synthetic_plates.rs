//! Synthetic plates laid out on the stage
//!
//! Standard SBS microplate formats placed at a chosen origin, optionally
//! rotated in XY and tilted in Z. Every well of a synthetic plate has a known
//! exact position, so interpolated grids can be checked against it without a
//! stage or a camera.

use crate::calibration::CalibrationRecord;
use crate::errors::WellPathError;
use crate::types::{GridSize, PlateCorners, Point3};

/// ANSI/SLAS footprint plate formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SbsFormat {
    Wells6,
    Wells12,
    Wells24,
    Wells48,
    Wells96,
    Wells384,
    Wells1536,
}

impl SbsFormat {
    pub const ALL: [SbsFormat; 7] = [
        SbsFormat::Wells6,
        SbsFormat::Wells12,
        SbsFormat::Wells24,
        SbsFormat::Wells48,
        SbsFormat::Wells96,
        SbsFormat::Wells384,
        SbsFormat::Wells1536,
    ];

    /// `(width, depth)`: wells per row, number of rows.
    pub fn dimensions(&self) -> (usize, usize) {
        match self {
            SbsFormat::Wells6 => (3, 2),
            SbsFormat::Wells12 => (4, 3),
            SbsFormat::Wells24 => (6, 4),
            SbsFormat::Wells48 => (8, 6),
            SbsFormat::Wells96 => (12, 8),
            SbsFormat::Wells384 => (24, 16),
            SbsFormat::Wells1536 => (48, 32),
        }
    }

    /// Center-to-center well spacing in millimeters.
    pub fn pitch_mm(&self) -> f64 {
        match self {
            SbsFormat::Wells6 => 39.12,
            SbsFormat::Wells12 => 26.01,
            SbsFormat::Wells24 => 19.30,
            SbsFormat::Wells48 => 13.08,
            SbsFormat::Wells96 => 9.0,
            SbsFormat::Wells384 => 4.5,
            SbsFormat::Wells1536 => 2.25,
        }
    }

    pub fn grid(&self) -> GridSize {
        let (width, depth) = self.dimensions();
        GridSize::new(width, depth).expect("SBS formats have non-zero dimensions")
    }

    pub fn well_count(&self) -> usize {
        let (width, depth) = self.dimensions();
        width * depth
    }
}

/// A plate placed on the stage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SyntheticPlate {
    pub format: SbsFormat,
    /// Position of well A1.
    pub origin: Point3,
    /// Rotation of the row direction from +X, in degrees.
    pub rotation_deg: f64,
    /// Z change per millimeter along X and along Y.
    pub tilt: (f64, f64),
}

impl SyntheticPlate {
    /// A square, level plate with A1 at `origin`.
    pub fn new(format: SbsFormat, origin: Point3) -> Self {
        Self {
            format,
            origin,
            rotation_deg: 0.0,
            tilt: (0.0, 0.0),
        }
    }

    pub fn rotated(mut self, degrees: f64) -> Self {
        self.rotation_deg = degrees;
        self
    }

    pub fn tilted(mut self, dz_per_mm_x: f64, dz_per_mm_y: f64) -> Self {
        self.tilt = (dz_per_mm_x, dz_per_mm_y);
        self
    }

    /// Exact center of the well at `(row, col)`.
    pub fn well_position(&self, row: usize, col: usize) -> Point3 {
        let pitch = self.format.pitch_mm();
        let (sin, cos) = self.rotation_deg.to_radians().sin_cos();
        let along_row = col as f64 * pitch;
        let along_col = row as f64 * pitch;
        let dx = along_row * cos - along_col * sin;
        let dy = along_row * sin + along_col * cos;
        Point3::new(
            self.origin.x + dx,
            self.origin.y + dy,
            self.origin.z + self.tilt.0 * dx + self.tilt.1 * dy,
        )
    }

    /// The four corner wells an operator would measure.
    pub fn corners(&self) -> PlateCorners {
        let (width, depth) = self.format.dimensions();
        PlateCorners::new(
            self.well_position(0, 0),
            self.well_position(depth - 1, 0),
            self.well_position(0, width - 1),
            self.well_position(depth - 1, width - 1),
        )
    }

    /// Exact centers of every well, row-major.
    pub fn expected_positions(&self) -> Vec<Point3> {
        let (width, depth) = self.format.dimensions();
        (0..depth)
            .flat_map(|row| (0..width).map(move |col| (row, col)))
            .map(|(row, col)| self.well_position(row, col))
            .collect()
    }

    pub fn calibration(&self, name: &str) -> Result<CalibrationRecord, WellPathError> {
        CalibrationRecord::new(name, self.corners(), self.format.grid())
    }
}

/// A level 96-well plate with A1 inside the default stage limits.
pub fn standard_96_well() -> SyntheticPlate {
    SyntheticPlate::new(SbsFormat::Wells96, Point3::new(20.0, 85.0, 120.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_counts() {
        let counts: Vec<usize> = SbsFormat::ALL.iter().map(|f| f.well_count()).collect();
        assert_eq!(counts, vec![6, 12, 24, 48, 96, 384, 1536]);
    }

    #[test]
    fn test_level_plate_corners() {
        let plate = SyntheticPlate::new(SbsFormat::Wells96, Point3::new(10.0, 20.0, 5.0));
        let corners = plate.corners();
        assert_eq!(corners.upper_left, Point3::new(10.0, 20.0, 5.0));
        assert_eq!(corners.upper_right, Point3::new(109.0, 20.0, 5.0));
        assert_eq!(corners.lower_left, Point3::new(10.0, 83.0, 5.0));
    }

    #[test]
    fn test_standard_plate_fits_default_limits() {
        let policy = crate::stage::LimitPolicy::default();
        for p in standard_96_well().expected_positions() {
            assert!(policy.check_point(p).is_ok(), "{} out of limits", p);
        }
    }
}
