//! wellpath: well-plate geometry and visitation planning for plate imaging rigs
//!
//! A 3D-printer-style XYZ stage carries a camera over a multi-well plate. The
//! operator jogs to the four corner wells; this crate turns those four
//! points into the center of every well, names each well (`A1`, `H12`, ...),
//! and orders a chosen subset of wells into a visiting sequence.
//!
//! # Features
//! - Bilinear corner interpolation that follows plate rotation, skew and tilt
//! - Row-letter/column-number labels with an exact inverse parser
//! - Raster and snake visitation orders with soft handling of unknown wells
//! - JSON calibration records and experiment profiles
//! - Action-phase timing, output naming and points CSV export
//! - A hardware-free stage seam with travel limits and a simulated stage
//!
//! # Usage
//! ```rust
//! use wellpath::{generate_grid, generate_labels, sequence, CalibrationRecord};
//! use wellpath::{GridSize, Pattern, PlateCorners, Point3};
//!
//! let corners = PlateCorners::new(
//!     Point3::new(0.0, 0.0, 0.0),   // upper left  (A1)
//!     Point3::new(0.0, 10.0, 0.0),  // lower left  (B1)
//!     Point3::new(10.0, 0.0, 0.0),  // upper right (A2)
//!     Point3::new(10.0, 10.0, 1.0), // lower right (B2)
//! );
//! let grid = generate_grid(
//!     2, 2,
//!     corners.upper_left, corners.lower_left, corners.upper_right, corners.lower_right,
//! ).unwrap();
//! assert_eq!(grid[3], Point3::new(10.0, 10.0, 1.0));
//! assert_eq!(generate_labels(2, 2).unwrap(), ["A1", "A2", "B1", "B2"]);
//!
//! let calibration =
//!     CalibrationRecord::new("demo", corners, GridSize::new(2, 2).unwrap()).unwrap();
//! let run = sequence(&calibration, calibration.labels(), Pattern::Snake);
//! assert_eq!(run.labels(), ["A1", "A2", "B2", "B1"]);
//! ```
pub mod calibration;
pub mod config;
pub mod errors;
pub mod experiment;
pub mod interpolate;
pub mod labels;
pub mod naming;
pub mod selection;
pub mod sequence;
pub mod stage;
pub mod types;

// Testing utilities - synthetic plates for offline testing
pub mod testing;

// Re-exports for convenience
pub use calibration::{list_calibrations, CalibrationRecord, Well};
pub use config::WellPathConfig;
pub use errors::WellPathError;
pub use experiment::{
    format_hms, ActionPhase, CaptureMode, ExperimentPlan, ExperimentProfile, PhaseAction,
};
pub use interpolate::generate_grid;
pub use labels::{generate_labels, label_for, parse_label};
pub use naming::{write_points_csv, OutputNaming};
pub use selection::{SelectionState, WellSelection};
pub use sequence::{sequence, VisitStep, WellSequence};
pub use stage::{
    traverse, AxisRange, AxisTarget, LimitPolicy, LimitedStage, PositioningStage,
    SimulatedStage, StageError,
};
pub use types::{Corner, GridIndex, GridSize, Pattern, PlateCorners, Point3, WellPosition};

/// Initialize logging for wellpath
pub fn init_logging() {
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "wellpath=info");
    }
    let _ = env_logger::try_init();
}

/// Initialize logging at `level` unless `RUST_LOG` is set.
pub fn init_logging_with_level(level: log::LevelFilter) {
    let _ = env_logger::Builder::new()
        .filter_module("wellpath", level)
        .parse_env("RUST_LOG")
        .try_init();
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// Get crate information
pub fn get_info() -> CrateInfo {
    CrateInfo {
        name: NAME.to_string(),
        version: VERSION.to_string(),
        description: DESCRIPTION.to_string(),
    }
}

/// Crate information structure
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CrateInfo {
    pub name: String,
    pub version: String,
    pub description: String,
}

#[cfg(test)]
mod lib_tests {
    use super::*;

    #[test]
    fn test_crate_info() {
        let info = get_info();
        assert_eq!(info.name, "wellpath");
        assert!(!info.version.is_empty());
        assert!(!info.description.is_empty());
    }

    #[test]
    fn test_init_logging_is_idempotent() {
        init_logging();
        init_logging_with_level(log::LevelFilter::Debug);
    }

    #[test]
    fn test_core_types_are_thread_safe() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<CalibrationRecord>();
        assert_send_sync::<WellSequence>();
        assert_send_sync::<ExperimentProfile>();
        assert_send_sync::<WellPathError>();
    }
}
