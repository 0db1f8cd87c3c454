//! Testing utilities for wellpath
//!
//! Provides synthetic well plates with exactly known well centers,
//! enabling offline testing without a stage or camera.

pub mod synthetic_plates;

pub use synthetic_plates::{standard_96_well, SbsFormat, SyntheticPlate};
