//! Output folder and file naming for experiment runs
//!
//! Layout under the outputs directory:
//!
//! ```text
//! outputs/20250314_growth/
//!     20250314_091502_growth_B7.h264
//!     20250314_091502_growth_B7_GPIO_ON_img2.jpg
//!     20250314_091455_growth_points.csv
//! ```

use crate::calibration::validate_name;
use crate::errors::WellPathError;
use crate::experiment::DEFAULT_EXPERIMENT_NAME;
use crate::sequence::{VisitStep, WellSequence};
use chrono::NaiveDateTime;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// One row of the points CSV.
#[derive(Debug, Serialize)]
struct PointRow<'a> {
    xlabel: &'a str,
    ylabel: &'a str,
    xval: f64,
    yval: f64,
    zval: f64,
}

/// File naming for one run, anchored at the time the run started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputNaming {
    experiment_name: String,
    started: NaiveDateTime,
}

impl OutputNaming {
    /// A blank `experiment_name` becomes `exp`.
    pub fn new(experiment_name: &str, started: NaiveDateTime) -> Result<Self, WellPathError> {
        let name = if experiment_name.trim().is_empty() {
            DEFAULT_EXPERIMENT_NAME.to_string()
        } else {
            validate_name(experiment_name, "experiment_name")?
        };
        Ok(Self {
            experiment_name: name,
            started,
        })
    }

    pub fn experiment_name(&self) -> &str {
        &self.experiment_name
    }

    /// `<outputs>/<YYYYMMDD>_<experiment>`
    pub fn output_folder<P: AsRef<Path>>(&self, outputs_dir: P) -> PathBuf {
        outputs_dir.as_ref().join(format!(
            "{}_{}",
            self.started.format("%Y%m%d"),
            self.experiment_name
        ))
    }

    /// `<YYYYMMDD>_<HHMMSS>_<experiment>_<row><col><ext>` for a recording
    /// started at `at`.
    pub fn video_filename(&self, step: &VisitStep, at: NaiveDateTime, ext: &str) -> String {
        format!(
            "{}_{}_{}{}{}",
            at.format("%Y%m%d_%H%M%S"),
            self.experiment_name,
            step.y_label,
            step.x_label,
            ext
        )
    }

    /// `<YYYYMMDD>_<HHMMSS>_<experiment>_<row><col>_GPIO_<ON|OFF>_img<n><ext>`
    pub fn image_filename(
        &self,
        step: &VisitStep,
        at: NaiveDateTime,
        gpio_on: bool,
        image_number: usize,
        ext: &str,
    ) -> String {
        format!(
            "{}_{}_{}{}_GPIO_{}_img{}{}",
            at.format("%Y%m%d_%H%M%S"),
            self.experiment_name,
            step.y_label,
            step.x_label,
            if gpio_on { "ON" } else { "OFF" },
            image_number,
            ext
        )
    }

    /// `<YYYYMMDD_HHMMSS>_<experiment>_points.csv`
    pub fn points_filename(&self, at: NaiveDateTime) -> String {
        format!(
            "{}_{}_points.csv",
            at.format("%Y%m%d_%H%M%S"),
            self.experiment_name
        )
    }

    /// Write the points CSV for `sequence` into this run's output folder,
    /// creating it if needed.
    pub fn save_points<P: AsRef<Path>>(
        &self,
        outputs_dir: P,
        sequence: &WellSequence,
        at: NaiveDateTime,
    ) -> Result<PathBuf, WellPathError> {
        let folder = self.output_folder(outputs_dir);
        fs::create_dir_all(&folder).map_err(|e| {
            WellPathError::Io(format!("Failed to create output folder {:?}: {}", folder, e))
        })?;
        let path = folder.join(self.points_filename(at));
        write_points_csv(&path, sequence)?;
        Ok(path)
    }
}

/// Write `xlabel,ylabel,xval,yval,zval` rows for every step of `sequence`.
///
/// `zval` is the sequence Z, the height every well is visited at.
pub fn write_points_csv<P: AsRef<Path>>(
    path: P,
    sequence: &WellSequence,
) -> Result<(), WellPathError> {
    let path = path.as_ref();
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)?;
    writer.write_record(["xlabel", "ylabel", "xval", "yval", "zval"])?;
    for step in &sequence.steps {
        writer.serialize(PointRow {
            xlabel: &step.x_label,
            ylabel: &step.y_label,
            xval: step.x(),
            yval: step.y(),
            zval: sequence.z.unwrap_or(step.position.z),
        })?;
    }
    writer.flush()?;
    log::info!("Wrote {} points to {:?}", sequence.len(), path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{GridIndex, Pattern, Point3};
    use chrono::NaiveDate;

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, 14)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    fn step() -> VisitStep {
        VisitStep {
            label: "B7".to_string(),
            index: GridIndex::new(1, 6),
            position: Point3::new(1.0, 2.0, 3.0),
            x_label: "7".to_string(),
            y_label: "B".to_string(),
        }
    }

    #[test]
    fn test_output_folder() {
        let naming = OutputNaming::new("growth", at(9, 0, 0)).unwrap();
        assert_eq!(
            naming.output_folder("outputs"),
            PathBuf::from("outputs").join("20250314_growth")
        );
    }

    #[test]
    fn test_blank_name_defaults() {
        let naming = OutputNaming::new("  ", at(9, 0, 0)).unwrap();
        assert_eq!(naming.experiment_name(), "exp");
        assert!(OutputNaming::new("../x", at(9, 0, 0)).is_err());
    }

    #[test]
    fn test_file_names() {
        let naming = OutputNaming::new("growth", at(9, 0, 0)).unwrap();
        assert_eq!(
            naming.video_filename(&step(), at(9, 15, 2), ".h264"),
            "20250314_091502_growth_B7.h264"
        );
        assert_eq!(
            naming.image_filename(&step(), at(9, 15, 2), true, 2, ".jpg"),
            "20250314_091502_growth_B7_GPIO_ON_img2.jpg"
        );
        assert_eq!(
            naming.points_filename(at(9, 14, 55)),
            "20250314_091455_growth_points.csv"
        );
    }

    #[test]
    fn test_points_csv() {
        let dir = tempfile::tempdir().unwrap();
        let sequence = WellSequence {
            pattern: Pattern::Raster,
            steps: vec![step()],
            z: Some(120.5),
            skipped: Vec::new(),
        };
        let naming = OutputNaming::new("growth", at(9, 0, 0)).unwrap();
        let path = naming.save_points(dir.path(), &sequence, at(9, 1, 0)).unwrap();

        let contents = fs::read_to_string(path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines, vec!["xlabel,ylabel,xval,yval,zval", "7,B,1.0,2.0,120.5"]);
    }
}
