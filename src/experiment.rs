//! Experiment profiles and run planning
//!
//! A profile names a calibration file, the wells to visit, the traversal
//! pattern and the per-well action phases. Profiles are stored as pretty
//! JSON under the experiments directory as
//! `YYYYMMDD_HHMMSS_<experiment>_profile.json`.

use crate::calibration::{validate_name, CalibrationRecord};
use crate::errors::WellPathError;
use crate::sequence::{sequence, WellSequence};
use crate::types::Pattern;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_EXPERIMENT_NAME: &str = "exp";

const PROFILE_SUFFIX: &str = "_profile.json";

/// What happens during one phase at a well.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PhaseAction {
    #[serde(rename = "GPIO ON")]
    GpioOn,
    #[serde(rename = "GPIO OFF")]
    GpioOff,
    #[serde(rename = "DELAY")]
    Delay,
    #[serde(rename = "CAPTURE IMAGE")]
    CaptureImage,
}

impl PhaseAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            PhaseAction::GpioOn => "GPIO ON",
            PhaseAction::GpioOff => "GPIO OFF",
            PhaseAction::Delay => "DELAY",
            PhaseAction::CaptureImage => "CAPTURE IMAGE",
        }
    }

    pub fn is_gpio(&self) -> bool {
        matches!(self, PhaseAction::GpioOn | PhaseAction::GpioOff)
    }
}

impl fmt::Display for PhaseAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a run records one video per well or individual images.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptureMode {
    #[default]
    #[serde(alias = "Video Capture")]
    Video,
    #[serde(alias = "Image Capture")]
    Image,
}

impl CaptureMode {
    /// Actions a phase may use in this mode.
    pub fn allowed_actions(&self) -> &'static [PhaseAction] {
        match self {
            CaptureMode::Video => &[PhaseAction::GpioOn, PhaseAction::GpioOff],
            CaptureMode::Image => &[
                PhaseAction::GpioOn,
                PhaseAction::GpioOff,
                PhaseAction::Delay,
                PhaseAction::CaptureImage,
            ],
        }
    }

    /// Whether `action` takes its duration from the phase's time.
    pub fn is_timed(&self, action: PhaseAction) -> bool {
        match self {
            CaptureMode::Video => action.is_gpio(),
            CaptureMode::Image => action == PhaseAction::Delay,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActionPhase {
    pub action: PhaseAction,
    /// Seconds. Ignored for actions that are instant in the current mode.
    #[serde(default)]
    pub time: f64,
}

impl ActionPhase {
    pub fn new(action: PhaseAction, time: f64) -> Self {
        Self { action, time }
    }

    /// Seconds this phase takes in `mode`.
    pub fn duration(&self, mode: CaptureMode) -> f64 {
        if mode.is_timed(self.action) {
            self.time
        } else {
            0.0
        }
    }
}

/// Check a phase list against `mode`.
pub fn validate_phases(phases: &[ActionPhase], mode: CaptureMode) -> Result<(), WellPathError> {
    if phases.is_empty() {
        return Err(WellPathError::validation(
            "action_phases",
            "at least one action phase is required",
        ));
    }
    for (i, phase) in phases.iter().enumerate() {
        let field = format!("action_phases[{}]", i);
        if !mode.allowed_actions().contains(&phase.action) {
            return Err(WellPathError::validation(
                field,
                format!("{} is not available in {:?} capture", phase.action, mode),
            ));
        }
        if mode.is_timed(phase.action) {
            if !phase.time.is_finite() {
                return Err(WellPathError::validation(
                    field,
                    format!("phase {} ({}) has invalid time", i + 1, phase.action),
                ));
            }
            if phase.time < 0.0 {
                return Err(WellPathError::validation(
                    field,
                    format!("phase {} ({}) has negative time", i + 1, phase.action),
                ));
            }
        }
    }
    Ok(())
}

/// Seconds spent at each well.
pub fn per_well_seconds(phases: &[ActionPhase], mode: CaptureMode) -> f64 {
    phases.iter().map(|p| p.duration(mode)).sum()
}

/// Format seconds as `HH:MM:SS`, truncating fractions. Hours do not wrap.
pub fn format_hms(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds as u64
    } else {
        0
    };
    format!("{:02}:{:02}:{:02}", total / 3600, (total % 3600) / 60, total % 60)
}

fn default_phases() -> Vec<ActionPhase> {
    vec![ActionPhase::new(PhaseAction::GpioOff, 30.0)]
}

fn default_experiment_name() -> String {
    DEFAULT_EXPERIMENT_NAME.to_string()
}

/// Saved experiment settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentProfile {
    /// Calibration file name, relative to the calibration directory.
    pub calibration_file: String,
    pub selected_wells: Vec<String>,
    #[serde(default)]
    pub pattern: Pattern,
    #[serde(default = "default_experiment_name")]
    pub experiment_name: String,
    #[serde(default = "default_phases")]
    pub action_phases: Vec<ActionPhase>,
    #[serde(default)]
    pub capture_mode: CaptureMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution: Option<[u32; 2]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fps: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub export_type: Option<String>,
    #[serde(
        default,
        alias = "motion_config_file",
        skip_serializing_if = "Option::is_none"
    )]
    pub motion_config_profile: Option<String>,
}

impl ExperimentProfile {
    pub fn new(calibration_file: impl Into<String>, selected_wells: Vec<String>) -> Self {
        Self {
            calibration_file: calibration_file.into(),
            selected_wells,
            pattern: Pattern::default(),
            experiment_name: default_experiment_name(),
            action_phases: default_phases(),
            capture_mode: CaptureMode::default(),
            resolution: None,
            fps: None,
            export_type: None,
            motion_config_profile: None,
        }
    }

    /// Experiment name used in file names; blank falls back to `exp`.
    pub fn effective_name(&self) -> &str {
        let trimmed = self.experiment_name.trim();
        if trimmed.is_empty() {
            DEFAULT_EXPERIMENT_NAME
        } else {
            trimmed
        }
    }

    /// Check everything that does not need the calibration.
    pub fn validate(&self) -> Result<(), WellPathError> {
        validate_name(&self.calibration_file, "calibration_file")?;
        validate_name(self.effective_name(), "experiment_name")?;
        if self.selected_wells.is_empty() {
            return Err(WellPathError::validation(
                "selected_wells",
                "no wells selected",
            ));
        }
        validate_phases(&self.action_phases, self.capture_mode)?;
        if let Some(fps) = self.fps {
            if !fps.is_finite() || fps <= 0.0 {
                return Err(WellPathError::validation(
                    "fps",
                    format!("fps must be positive, got {}", fps),
                ));
            }
        }
        if let Some([w, h]) = self.resolution {
            if w == 0 || h == 0 {
                return Err(WellPathError::validation(
                    "resolution",
                    format!("resolution must be non-zero, got {}x{}", w, h),
                ));
            }
        }
        Ok(())
    }

    /// Load the calibration this profile refers to from `calibration_dir`.
    pub fn resolve_calibration<P: AsRef<Path>>(
        &self,
        calibration_dir: P,
    ) -> Result<CalibrationRecord, WellPathError> {
        let file = validate_name(&self.calibration_file, "calibration_file")?;
        CalibrationRecord::load_from_file(calibration_dir.as_ref().join(file))
    }

    /// Sequence the selected wells against `calibration` and estimate the run.
    pub fn plan(&self, calibration: &CalibrationRecord) -> Result<ExperimentPlan, WellPathError> {
        self.validate()?;

        let sequence = sequence(calibration, &self.selected_wells, self.pattern);
        if sequence.is_empty() {
            return Err(WellPathError::validation(
                "selected_wells",
                format!(
                    "none of the {} selected wells are in calibration '{}'",
                    self.selected_wells.len(),
                    calibration.name()
                ),
            ));
        }

        let per_well = per_well_seconds(&self.action_phases, self.capture_mode);
        let total = per_well * sequence.len() as f64;
        log::info!(
            "Planned experiment '{}': {} wells, {} per well, {} total",
            self.effective_name(),
            sequence.len(),
            format_hms(per_well),
            format_hms(total)
        );

        Ok(ExperimentPlan {
            experiment_name: self.effective_name().to_string(),
            calibration_name: calibration.name().to_string(),
            capture_mode: self.capture_mode,
            phases: self.action_phases.clone(),
            sequence,
            per_well_seconds: per_well,
            total_seconds: total,
        })
    }

    pub fn to_json(&self) -> Result<String, WellPathError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| WellPathError::Serialization(format!("Failed to serialize profile: {}", e)))
    }

    pub fn from_json(json: &str) -> Result<Self, WellPathError> {
        serde_json::from_str(json)
            .map_err(|e| WellPathError::data_integrity("profile", format!("Invalid profile: {}", e)))
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, WellPathError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| {
            WellPathError::Io(format!("Failed to read profile {:?}: {}", path, e))
        })?;
        let profile = Self::from_json(&contents)?;
        log::info!("Loaded experiment profile from {:?}", path);
        Ok(profile)
    }

    /// Write the profile into `dir` under its timestamped name.
    pub fn save_to_dir<P: AsRef<Path>>(
        &self,
        dir: P,
        timestamp: NaiveDateTime,
    ) -> Result<PathBuf, WellPathError> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir).map_err(|e| {
            WellPathError::Io(format!("Failed to create experiments directory {:?}: {}", dir, e))
        })?;
        let path = dir.join(profile_filename(self.effective_name(), timestamp)?);
        fs::write(&path, self.to_json()?)
            .map_err(|e| WellPathError::Io(format!("Failed to write profile {:?}: {}", path, e)))?;
        log::info!("Saved experiment profile to {:?}", path);
        Ok(path)
    }
}

/// `YYYYMMDD_HHMMSS_<experiment>_profile.json`
pub fn profile_filename(experiment_name: &str, timestamp: NaiveDateTime) -> Result<String, WellPathError> {
    let name = validate_name(experiment_name, "experiment_name")?;
    Ok(format!(
        "{}_{}{}",
        timestamp.format("%Y%m%d_%H%M%S"),
        name,
        PROFILE_SUFFIX
    ))
}

/// Profile files in `dir`, sorted by name. A missing directory has none.
pub fn list_profiles<P: AsRef<Path>>(dir: P) -> Result<Vec<String>, WellPathError> {
    let dir = dir.as_ref();
    if !dir.exists() {
        return Ok(Vec::new());
    }
    let mut names = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if let Some(name) = entry.file_name().to_str() {
            if name.ends_with(PROFILE_SUFFIX) && entry.path().is_file() {
                names.push(name.to_string());
            }
        }
    }
    names.sort();
    Ok(names)
}

/// A validated, sequenced run with its time estimate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExperimentPlan {
    pub experiment_name: String,
    pub calibration_name: String,
    pub capture_mode: CaptureMode,
    pub phases: Vec<ActionPhase>,
    pub sequence: WellSequence,
    pub per_well_seconds: f64,
    pub total_seconds: f64,
}

impl ExperimentPlan {
    pub fn well_count(&self) -> usize {
        self.sequence.len()
    }

    pub fn per_well_hms(&self) -> String {
        format_hms(self.per_well_seconds)
    }

    pub fn total_hms(&self) -> String {
        format_hms(self.total_seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_hms() {
        assert_eq!(format_hms(0.0), "00:00:00");
        assert_eq!(format_hms(59.9), "00:00:59");
        assert_eq!(format_hms(3723.0), "01:02:03");
        assert_eq!(format_hms(100.0 * 3600.0), "100:00:00");
        assert_eq!(format_hms(-5.0), "00:00:00");
    }

    #[test]
    fn test_phase_serde_names() {
        let phase = ActionPhase::new(PhaseAction::GpioOn, 5.0);
        let json = serde_json::to_string(&phase).unwrap();
        assert_eq!(json, r#"{"action":"GPIO ON","time":5.0}"#);

        let back: ActionPhase = serde_json::from_str(r#"{"action":"CAPTURE IMAGE"}"#).unwrap();
        assert_eq!(back, ActionPhase::new(PhaseAction::CaptureImage, 0.0));
        assert!(serde_json::from_str::<ActionPhase>(r#"{"action":"BLINK","time":1}"#).is_err());
    }

    #[test]
    fn test_video_mode_rejects_image_actions() {
        let phases = [
            ActionPhase::new(PhaseAction::GpioOff, 10.0),
            ActionPhase::new(PhaseAction::Delay, 5.0),
        ];
        let err = validate_phases(&phases, CaptureMode::Video).unwrap_err();
        assert_eq!(err.field(), Some("action_phases[1]"));
        assert!(validate_phases(&phases, CaptureMode::Image).is_ok());
    }

    #[test]
    fn test_negative_time_rejected_only_when_timed() {
        let phases = [ActionPhase::new(PhaseAction::GpioOn, -1.0)];
        assert!(validate_phases(&phases, CaptureMode::Video).is_err());
        // GPIO is instant in image mode, so its time is ignored.
        assert!(validate_phases(&phases, CaptureMode::Image).is_ok());

        let delay = [ActionPhase::new(PhaseAction::Delay, f64::NAN)];
        assert!(validate_phases(&delay, CaptureMode::Image).is_err());
        assert!(validate_phases(&[], CaptureMode::Image).is_err());
    }

    #[test]
    fn test_per_well_seconds() {
        let phases = [
            ActionPhase::new(PhaseAction::GpioOff, 30.0),
            ActionPhase::new(PhaseAction::GpioOn, 15.0),
            ActionPhase::new(PhaseAction::Delay, 2.0),
            ActionPhase::new(PhaseAction::CaptureImage, 9.0),
        ];
        assert_eq!(per_well_seconds(&phases[..2], CaptureMode::Video), 45.0);
        assert_eq!(per_well_seconds(&phases, CaptureMode::Image), 2.0);
    }

    #[test]
    fn test_capture_mode_aliases() {
        let mode: CaptureMode = serde_json::from_str("\"Image Capture\"").unwrap();
        assert_eq!(mode, CaptureMode::Image);
        assert_eq!(serde_json::to_string(&CaptureMode::Video).unwrap(), "\"video\"");
    }

    #[test]
    fn test_profile_filename() {
        let ts = chrono::NaiveDate::from_ymd_opt(2025, 3, 14)
            .unwrap()
            .and_hms_opt(9, 5, 7)
            .unwrap();
        assert_eq!(
            profile_filename("growth", ts).unwrap(),
            "20250314_090507_growth_profile.json"
        );
        assert!(profile_filename("a/b", ts).is_err());
    }

    #[test]
    fn test_legacy_profile_fields() {
        let json = r#"{
            "calibration_file": "20250101_120000_plate.json",
            "selected_wells": ["A1", "B2"],
            "pattern": "snake →↙",
            "experiment_name": "",
            "action_phases": [{"action": "GPIO ON", "time": 3}],
            "resolution": [1920, 1080],
            "fps": 30.0,
            "export_type": "H264",
            "motion_config_file": "default"
        }"#;
        let profile = ExperimentProfile::from_json(json).unwrap();
        assert_eq!(profile.pattern, Pattern::Snake);
        assert_eq!(profile.effective_name(), "exp");
        assert_eq!(profile.capture_mode, CaptureMode::Video);
        assert_eq!(profile.motion_config_profile.as_deref(), Some("default"));
        assert!(profile.validate().is_ok());
    }

    #[test]
    fn test_empty_selection_rejected() {
        let profile = ExperimentProfile::new("cal.json", Vec::new());
        assert_eq!(profile.validate().unwrap_err().field(), Some("selected_wells"));
    }
}
