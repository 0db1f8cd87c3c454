//! Checked/unchecked state for the wells of one calibration

use crate::calibration::CalibrationRecord;
use crate::errors::WellPathError;
use crate::types::{GridIndex, GridSize};
use serde::{Deserialize, Serialize};

/// Aggregate state of a row or column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionState {
    AllChecked,
    AllUnchecked,
    SomeChecked,
}

/// Which wells of a calibration are selected.
///
/// Holds one flag per well, parallel to the calibration's stored labels.
#[derive(Debug, Clone, PartialEq)]
pub struct WellSelection<'a> {
    calibration: &'a CalibrationRecord,
    checked: Vec<bool>,
}

impl<'a> WellSelection<'a> {
    /// Nothing selected.
    pub fn none(calibration: &'a CalibrationRecord) -> Self {
        Self {
            calibration,
            checked: vec![false; calibration.well_count()],
        }
    }

    /// Every well selected.
    pub fn all(calibration: &'a CalibrationRecord) -> Self {
        Self {
            calibration,
            checked: vec![true; calibration.well_count()],
        }
    }

    /// Select `labels`. Labels the calibration does not have are returned
    /// alongside the selection.
    pub fn from_labels<S: AsRef<str>>(
        calibration: &'a CalibrationRecord,
        labels: &[S],
    ) -> (Self, Vec<String>) {
        let mut selection = Self::none(calibration);
        let mut unknown = Vec::new();
        for label in labels {
            let label = label.as_ref();
            if selection.set(label, true).is_err() {
                unknown.push(label.to_string());
            }
        }
        if !unknown.is_empty() {
            log::warn!(
                "{} labels are not in calibration '{}': {:?}",
                unknown.len(),
                calibration.name(),
                unknown
            );
        }
        (selection, unknown)
    }

    pub fn grid(&self) -> GridSize {
        self.calibration.grid()
    }

    fn slot(&self, label: &str) -> Result<usize, WellPathError> {
        self.calibration.slot_of(label).ok_or_else(|| {
            WellPathError::validation(
                "label",
                format!("`{}` is not in calibration '{}'", label, self.calibration.name()),
            )
        })
    }

    pub fn is_checked(&self, label: &str) -> bool {
        self.slot(label).map(|i| self.checked[i]).unwrap_or(false)
    }

    pub fn set(&mut self, label: &str, checked: bool) -> Result<(), WellPathError> {
        let i = self.slot(label)?;
        self.checked[i] = checked;
        Ok(())
    }

    /// Flip one well; returns its new state.
    pub fn toggle(&mut self, label: &str) -> Result<bool, WellPathError> {
        let i = self.slot(label)?;
        self.checked[i] = !self.checked[i];
        Ok(self.checked[i])
    }

    pub fn check_all(&mut self) {
        self.checked.fill(true);
    }

    pub fn uncheck_all(&mut self) {
        self.checked.fill(false);
    }

    fn set_where<F: Fn(GridIndex) -> bool>(&mut self, matches: F, checked: bool) {
        for (flag, index) in self.checked.iter_mut().zip(self.calibration.indices()) {
            if matches(*index) {
                *flag = checked;
            }
        }
    }

    fn state_where<F: Fn(GridIndex) -> bool>(&self, matches: F) -> SelectionState {
        let (mut checked, mut total) = (0usize, 0usize);
        for (flag, index) in self.checked.iter().zip(self.calibration.indices()) {
            if matches(*index) {
                total += 1;
                if *flag {
                    checked += 1;
                }
            }
        }
        if checked == 0 {
            SelectionState::AllUnchecked
        } else if checked == total {
            SelectionState::AllChecked
        } else {
            SelectionState::SomeChecked
        }
    }

    /// Rows and columns are 0-based. Out of range is a no-op.
    pub fn check_row(&mut self, row: usize) {
        self.set_where(|i| i.row == row, true);
    }

    pub fn uncheck_row(&mut self, row: usize) {
        self.set_where(|i| i.row == row, false);
    }

    pub fn check_column(&mut self, col: usize) {
        self.set_where(|i| i.col == col, true);
    }

    pub fn uncheck_column(&mut self, col: usize) {
        self.set_where(|i| i.col == col, false);
    }

    /// An out-of-range row has no checked wells.
    pub fn row_state(&self, row: usize) -> SelectionState {
        self.state_where(|i| i.row == row)
    }

    pub fn column_state(&self, col: usize) -> SelectionState {
        self.state_where(|i| i.col == col)
    }

    pub fn count(&self) -> usize {
        self.checked.iter().filter(|c| **c).count()
    }

    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    /// Selected labels in calibration order.
    pub fn selected_labels(&self) -> Vec<String> {
        self.calibration
            .labels()
            .iter()
            .zip(&self.checked)
            .filter(|(_, checked)| **checked)
            .map(|(label, _)| label.clone())
            .collect()
    }
}
