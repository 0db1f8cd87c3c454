//! Calibration records
//!
//! A calibration bundles the four measured corners of a plate, its grid size,
//! the interpolated position of every well and the parallel list of labels.
//! Records are written as pretty JSON named `YYYYMMDD_HHMMSS_<name>.json`.
//!
//! Records are only constructed through validation: either freshly generated
//! from corners ([`CalibrationRecord::new`]) or checked on load, so a record
//! in memory always satisfies
//! `positions.len() == labels.len() == width * depth` with every label
//! parseable, unique and inside the grid.

use crate::errors::WellPathError;
use crate::interpolate::interpolate;
use crate::labels::{labels_for_grid, parse_label_strict};
use crate::types::{GridIndex, GridSize, PlateCorners, Point3, WellPosition};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

const FILENAME_TIMESTAMP: &str = "%Y%m%d_%H%M%S";
const TIMESTAMP_LEN: usize = 15;

/// On-disk layout of a calibration file.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CalibrationFile {
    name: String,
    upper_left: Point3,
    lower_left: Point3,
    upper_right: Point3,
    lower_right: Point3,
    x_quantity: i64,
    y_quantity: i64,
    interpolated_positions: Vec<Point3>,
    labels: Vec<String>,
}

/// One well of a calibration, borrowed from the record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Well<'a> {
    pub label: &'a str,
    pub index: GridIndex,
    pub position: WellPosition,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "CalibrationFile", into = "CalibrationFile")]
pub struct CalibrationRecord {
    name: String,
    corners: PlateCorners,
    grid: GridSize,
    positions: Vec<WellPosition>,
    labels: Vec<String>,
    indices: Vec<GridIndex>,
    lookup: HashMap<String, usize>,
}

impl CalibrationRecord {
    /// Interpolate and label a new calibration.
    pub fn new(
        name: &str,
        corners: PlateCorners,
        grid: GridSize,
    ) -> Result<Self, WellPathError> {
        let name = validate_name(name, "name")?;
        corners.validate()?;
        if corners.is_degenerate() {
            log::warn!(
                "Calibration '{}' has corners sharing the same X/Y; wells will overlap",
                name
            );
        }

        let positions = interpolate(grid, &corners);
        let labels = labels_for_grid(grid);
        let indices = (0..grid.well_count()).map(|i| grid.index_at(i)).collect();
        let lookup = build_lookup(&labels);

        log::info!("Created calibration '{}' with {} wells ({})", name, positions.len(), grid);
        Ok(Self {
            name,
            corners,
            grid,
            positions,
            labels,
            indices,
            lookup,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn corners(&self) -> &PlateCorners {
        &self.corners
    }

    pub fn grid(&self) -> GridSize {
        self.grid
    }

    pub fn positions(&self) -> &[WellPosition] {
        &self.positions
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn well_count(&self) -> usize {
        self.positions.len()
    }

    /// Wells in stored (row-major) order.
    pub fn wells(&self) -> impl Iterator<Item = Well<'_>> + '_ {
        self.labels
            .iter()
            .zip(&self.indices)
            .zip(&self.positions)
            .map(|((label, index), position)| Well {
                label,
                index: *index,
                position: *position,
            })
    }

    pub fn well(&self, label: &str) -> Option<Well<'_>> {
        let i = *self.lookup.get(label)?;
        Some(Well {
            label: &self.labels[i],
            index: self.indices[i],
            position: self.positions[i],
        })
    }

    /// Row-major slot of `label`.
    pub fn slot_of(&self, label: &str) -> Option<usize> {
        self.lookup.get(label).copied()
    }

    /// Grid cell of each well, parallel to [`Self::labels`].
    pub fn indices(&self) -> &[GridIndex] {
        &self.indices
    }

    pub fn contains(&self, label: &str) -> bool {
        self.lookup.contains_key(label)
    }

    pub fn position_of(&self, label: &str) -> Option<WellPosition> {
        self.well(label).map(|w| w.position)
    }

    pub fn to_json(&self) -> Result<String, WellPathError> {
        serde_json::to_string_pretty(self).map_err(|e| {
            WellPathError::Serialization(format!("Failed to serialize calibration: {}", e))
        })
    }

    pub fn from_json(json: &str) -> Result<Self, WellPathError> {
        let file: CalibrationFile = serde_json::from_str(json).map_err(|e| {
            WellPathError::data_integrity("calibration", format!("Failed to parse calibration: {}", e))
        })?;
        Self::try_from(file)
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, WellPathError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| {
            WellPathError::Io(format!("Failed to read calibration {:?}: {}", path, e))
        })?;
        let record = Self::from_json(&contents)?;
        log::info!(
            "Loaded calibration '{}' ({} wells) from {:?}",
            record.name,
            record.well_count(),
            path
        );
        Ok(record)
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), WellPathError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                WellPathError::Io(format!("Failed to create calibration directory: {}", e))
            })?;
        }
        fs::write(path, self.to_json()?).map_err(|e| {
            WellPathError::Io(format!("Failed to write calibration {:?}: {}", path, e))
        })?;
        log::info!("Saved calibration '{}' to {:?}", self.name, path);
        Ok(())
    }

    /// Save into `dir` under a timestamped filename and return the full path.
    pub fn save_to_dir<P: AsRef<Path>>(
        &self,
        dir: P,
        timestamp: NaiveDateTime,
    ) -> Result<PathBuf, WellPathError> {
        let path = dir
            .as_ref()
            .join(calibration_filename(&self.name, timestamp)?);
        self.save_to_file(&path)?;
        Ok(path)
    }
}

impl TryFrom<CalibrationFile> for CalibrationRecord {
    type Error = WellPathError;

    fn try_from(file: CalibrationFile) -> Result<Self, Self::Error> {
        let name = validate_name(&file.name, "name").map_err(|e| match e {
            WellPathError::Validation { field, message } => {
                WellPathError::data_integrity(field, message)
            }
            other => other,
        })?;
        let width = positive_quantity(file.x_quantity, "x_quantity")?;
        let depth = positive_quantity(file.y_quantity, "y_quantity")?;
        let grid = GridSize::new(width, depth).map_err(|e| {
            WellPathError::validation("x_quantity", e.to_string())
        })?;

        let corners = PlateCorners::new(
            file.upper_left,
            file.lower_left,
            file.upper_right,
            file.lower_right,
        );
        corners.validate().map_err(|e| match e {
            WellPathError::Validation { field, message } => {
                WellPathError::data_integrity(field, message)
            }
            other => other,
        })?;

        let expected = grid.well_count();
        if file.interpolated_positions.len() != expected {
            return Err(WellPathError::data_integrity(
                "interpolated_positions",
                format!(
                    "expected {} positions for a {} grid, found {}",
                    expected,
                    grid,
                    file.interpolated_positions.len()
                ),
            ));
        }
        if file.labels.len() != expected {
            return Err(WellPathError::data_integrity(
                "labels",
                format!(
                    "expected {} labels for a {} grid, found {}",
                    expected,
                    grid,
                    file.labels.len()
                ),
            ));
        }

        let mut indices = Vec::with_capacity(expected);
        let mut lookup = HashMap::with_capacity(expected);
        for (i, label) in file.labels.iter().enumerate() {
            let field = format!("labels[{}]", i);
            let index = parse_label_strict(label, &field)
                .map_err(|e| WellPathError::data_integrity(field.as_str(), e.to_string()))?;
            match grid.index_of(index) {
                None => {
                    return Err(WellPathError::data_integrity(
                        field,
                        format!("label `{}` lies outside the {} grid", label, grid),
                    ));
                }
                // Positions are stored row-major, so each label must sit in its own slot.
                Some(slot) if slot != i => {
                    return Err(WellPathError::data_integrity(
                        field,
                        format!(
                            "label `{}` belongs at position {} in row-major order, found at {}",
                            label, slot, i
                        ),
                    ));
                }
                Some(_) => {}
            }
            lookup.insert(label.clone(), i);
            indices.push(index);
        }

        Ok(Self {
            name,
            corners,
            grid,
            positions: file.interpolated_positions,
            labels: file.labels,
            indices,
            lookup,
        })
    }
}

impl From<CalibrationRecord> for CalibrationFile {
    fn from(record: CalibrationRecord) -> Self {
        Self {
            name: record.name,
            upper_left: record.corners.upper_left,
            lower_left: record.corners.lower_left,
            upper_right: record.corners.upper_right,
            lower_right: record.corners.lower_right,
            x_quantity: record.grid.width() as i64,
            y_quantity: record.grid.depth() as i64,
            interpolated_positions: record.positions,
            labels: record.labels,
        }
    }
}

fn positive_quantity(value: i64, field: &str) -> Result<usize, WellPathError> {
    if value <= 0 {
        return Err(WellPathError::validation(
            field,
            format!("must be a positive integer, got {}", value),
        ));
    }
    usize::try_from(value)
        .map_err(|_| WellPathError::validation(field, format!("{} is too large", value)))
}

fn build_lookup(labels: &[String]) -> HashMap<String, usize> {
    labels
        .iter()
        .enumerate()
        .map(|(i, label)| (label.clone(), i))
        .collect()
}

/// Trim a user-supplied name and make sure it is usable inside a filename.
pub(crate) fn validate_name(name: &str, field: &str) -> Result<String, WellPathError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(WellPathError::validation(field, "name must not be empty"));
    }
    if trimmed.contains(|c| c == '/' || c == '\\') || trimmed == "." || trimmed == ".." {
        return Err(WellPathError::validation(
            field,
            format!("`{}` cannot be used in a filename", trimmed),
        ));
    }
    Ok(trimmed.to_string())
}

/// `YYYYMMDD_HHMMSS_<name>.json`
pub fn calibration_filename(name: &str, timestamp: NaiveDateTime) -> Result<String, WellPathError> {
    let name = validate_name(name, "name")?;
    Ok(format!("{}_{}.json", timestamp.format(FILENAME_TIMESTAMP), name))
}

/// Split a calibration filename into its creation time and name.
pub fn parse_calibration_filename(file_name: &str) -> Option<(NaiveDateTime, String)> {
    let stem = file_name.strip_suffix(".json")?;
    let stamp = stem.get(..TIMESTAMP_LEN)?;
    if stem.get(TIMESTAMP_LEN..TIMESTAMP_LEN + 1)? != "_" {
        return None;
    }
    let name = stem.get(TIMESTAMP_LEN + 1..)?;
    if name.is_empty() {
        return None;
    }
    let created = NaiveDateTime::parse_from_str(stamp, FILENAME_TIMESTAMP).ok()?;
    Some((created, name.to_string()))
}

/// Sorted `.json` filenames in `dir`. A missing directory has no calibrations.
pub fn list_calibrations<P: AsRef<Path>>(dir: P) -> Result<Vec<String>, WellPathError> {
    let dir = dir.as_ref();
    if !dir.exists() {
        log::debug!("Calibration directory {:?} does not exist", dir);
        return Ok(Vec::new());
    }

    let mut names = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.ends_with(".json") {
            names.push(name);
        }
    }
    names.sort();
    Ok(names)
}
