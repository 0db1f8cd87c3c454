//! Visitation sequencing
//!
//! Turns a calibration plus a set of selected labels into the ordered list of
//! wells the stage visits. Selected labels the calibration does not know are
//! skipped and reported on the result instead of failing the run, so a
//! selection saved against an edited calibration still runs the wells it can.

use crate::calibration::CalibrationRecord;
use crate::labels::split_label;
use crate::types::{GridIndex, Pattern, WellPosition};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// One stop of the visitation sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisitStep {
    pub label: String,
    pub index: GridIndex,
    pub position: WellPosition,
    /// 1-based column number, as used in output filenames.
    pub x_label: String,
    /// Row letters, as used in output filenames.
    pub y_label: String,
}

impl VisitStep {
    pub fn x(&self) -> f64 {
        self.position.x
    }

    pub fn y(&self) -> f64 {
        self.position.y
    }

    /// The legacy `(x, y, x_label, y_label)` tuple.
    pub fn as_tuple(&self) -> (f64, f64, &str, &str) {
        (self.position.x, self.position.y, &self.x_label, &self.y_label)
    }
}

/// Ordered wells for one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WellSequence {
    pub pattern: Pattern,
    pub steps: Vec<VisitStep>,
    /// Z used for every move: the Z of the first selected well in
    /// calibration order. `None` when nothing was selected.
    pub z: Option<f64>,
    /// Selected labels that are not in the calibration.
    pub skipped: Vec<String>,
}

impl WellSequence {
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn labels(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.label.as_str()).collect()
    }

    /// XY travel distance between consecutive wells.
    pub fn travel_distance(&self) -> f64 {
        self.steps
            .windows(2)
            .map(|pair| pair[0].position.planar_distance(&pair[1].position))
            .sum()
    }
}

fn sort_key(pattern: Pattern, index: GridIndex) -> (usize, i64) {
    let col = index.col as i64;
    match pattern {
        Pattern::Raster => (index.row, col),
        Pattern::Snake => {
            if index.row % 2 == 0 {
                (index.row, col)
            } else {
                (index.row, -col)
            }
        }
    }
}

/// Order the selected wells of `calibration` by `pattern`.
///
/// Labels missing from the calibration land in [`WellSequence::skipped`]
/// with a warning. A label selected twice is visited once. An empty
/// selection gives an empty sequence; rejecting that before a run is up to
/// the caller.
pub fn sequence<S: AsRef<str>>(
    calibration: &CalibrationRecord,
    selected_labels: &[S],
    pattern: Pattern,
) -> WellSequence {
    let mut seen = HashSet::new();
    let mut steps = Vec::with_capacity(selected_labels.len());
    let mut skipped = Vec::new();

    for label in selected_labels {
        let label = label.as_ref();
        if !seen.insert(label) {
            log::debug!("Well {} selected more than once; visiting it once", label);
            continue;
        }
        let Some(well) = calibration.well(label) else {
            log::warn!(
                "Selected well {} is not in calibration '{}'; skipping",
                label,
                calibration.name()
            );
            skipped.push(label.to_string());
            continue;
        };
        // Calibration labels are validated on construction.
        let letters = split_label(well.label).map_or(well.label, |(letters, _)| letters);
        steps.push(VisitStep {
            label: well.label.to_string(),
            index: well.index,
            position: well.position,
            x_label: (well.index.col + 1).to_string(),
            y_label: letters.to_string(),
        });
    }

    let z = steps
        .iter()
        .filter_map(|s| calibration.slot_of(&s.label).map(|slot| (slot, s.position.z)))
        .min_by_key(|(slot, _)| *slot)
        .map(|(_, z)| z);
    steps.sort_by_key(|s| sort_key(pattern, s.index));

    if !skipped.is_empty() {
        log::warn!("{} selected wells skipped", skipped.len());
    }
    log::debug!(
        "Sequenced {} wells in {} order from calibration '{}'",
        steps.len(),
        pattern,
        calibration.name()
    );

    WellSequence {
        pattern,
        steps,
        z,
        skipped,
    }
}
