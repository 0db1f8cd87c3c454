//! Configuration management for wellpath
//!
//! Provides configuration loading, saving, and validation for the stage
//! connection, laser output, data directories and logging.

use crate::errors::WellPathError;
use crate::stage::{AxisRange, LimitPolicy};
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Highest BCM GPIO line on a Raspberry Pi header.
pub const MAX_GPIO_PIN: u8 = 27;

/// Prefix for environment overrides, e.g. `WELLPATH_STAGE__BAUDRATE=250000`.
pub const ENV_PREFIX: &str = "WELLPATH";

/// Root configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct WellPathConfig {
    pub stage: StageConfig,
    pub laser: LaserConfig,
    pub paths: PathsConfig,
    pub logging: LoggingConfig,
}

/// Motion stage connection and travel limits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StageConfig {
    /// Serial baud rate
    pub baudrate: u32,
    /// Serial read timeout in seconds
    pub timeout_secs: u64,
    /// How long homing may take, in seconds
    pub home_timeout_secs: u64,
    /// How long to wait for a move to finish, in seconds
    pub movement_wait_timeout_secs: u64,
    /// Feedrate for moves in mm/min; unset keeps the firmware default
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feedrate_mm_per_min: Option<f64>,
    pub limits: LimitPolicy,
}

/// Laser output line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LaserConfig {
    /// BCM pin number driving the laser
    pub gpio_pin: u8,
}

/// Where calibrations, experiment profiles and run outputs live
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub calibration_dir: PathBuf,
    pub experiments_dir: PathBuf,
    pub outputs_dir: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `error`, `warn`, `info`, `debug`, `trace` or `off`
    pub level: String,
}

impl Default for StageConfig {
    fn default() -> Self {
        Self {
            baudrate: 115_200,
            timeout_secs: 10,
            home_timeout_secs: 90,
            movement_wait_timeout_secs: 30,
            feedrate_mm_per_min: None,
            limits: LimitPolicy::default(),
        }
    }
}

impl Default for LaserConfig {
    fn default() -> Self {
        Self { gpio_pin: 21 }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            calibration_dir: PathBuf::from("calibrations"),
            experiments_dir: PathBuf::from("experiments"),
            outputs_dir: PathBuf::from("outputs"),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl LoggingConfig {
    pub fn level_filter(&self) -> Result<log::LevelFilter, WellPathError> {
        log::LevelFilter::from_str(self.level.trim()).map_err(|_| {
            WellPathError::validation(
                "logging.level",
                format!("unknown log level `{}`", self.level),
            )
        })
    }
}

fn check_range(field: &str, range: &AxisRange) -> Result<(), WellPathError> {
    if !range.min.is_finite() || !range.max.is_finite() || range.min > range.max {
        return Err(WellPathError::validation(
            field,
            format!("invalid range [{}, {}]", range.min, range.max),
        ));
    }
    Ok(())
}

impl WellPathConfig {
    /// Load configuration from TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, WellPathError> {
        let path = path.as_ref();

        if !path.exists() {
            log::info!("Config file not found at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .map_err(|e| WellPathError::Io(format!("Failed to read config file: {}", e)))?;

        let config: WellPathConfig = toml::from_str(&contents).map_err(|e| {
            WellPathError::Serialization(format!("Failed to parse config file: {}", e))
        })?;

        log::info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Defaults, then the TOML file at `path` if present, then
    /// `WELLPATH_<SECTION>__<KEY>` environment variables.
    pub fn load_layered<P: AsRef<Path>>(path: P) -> Result<Self, WellPathError> {
        let path = path.as_ref();
        let defaults = Config::try_from(&Self::default()).map_err(|e| {
            WellPathError::Serialization(format!("Failed to build default config: {}", e))
        })?;

        let layered = Config::builder()
            .add_source(defaults)
            .add_source(File::from(path).format(FileFormat::Toml).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| WellPathError::validation("config", format!("{}", e)))?;

        let config: WellPathConfig = layered
            .try_deserialize()
            .map_err(|e| WellPathError::validation("config", format!("{}", e)))?;
        config.validate()?;

        log::debug!("Resolved layered configuration from {:?}", path);
        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), WellPathError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                WellPathError::Io(format!("Failed to create config directory: {}", e))
            })?;
        }

        let toml_string = toml::to_string_pretty(self).map_err(|e| {
            WellPathError::Serialization(format!("Failed to serialize config: {}", e))
        })?;

        fs::write(path, toml_string)
            .map_err(|e| WellPathError::Io(format!("Failed to write config file: {}", e)))?;

        log::info!("Saved configuration to {:?}", path);
        Ok(())
    }

    /// Get default config file path
    pub fn default_path() -> PathBuf {
        PathBuf::from("wellpath.toml")
    }

    /// Load from default location or fall back to defaults
    pub fn load_or_default() -> Self {
        Self::load_from_file(Self::default_path()).unwrap_or_else(|e| {
            log::warn!("Failed to load config, using defaults: {}", e);
            Self::default()
        })
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), WellPathError> {
        let stage = &self.stage;
        if stage.baudrate == 0 {
            return Err(WellPathError::validation(
                "stage.baudrate",
                "baudrate must be positive",
            ));
        }
        for (field, secs) in [
            ("stage.timeout_secs", stage.timeout_secs),
            ("stage.home_timeout_secs", stage.home_timeout_secs),
            ("stage.movement_wait_timeout_secs", stage.movement_wait_timeout_secs),
        ] {
            if secs == 0 {
                return Err(WellPathError::validation(field, "timeout must be positive"));
            }
        }
        if let Some(feedrate) = stage.feedrate_mm_per_min {
            if !feedrate.is_finite() || feedrate <= 0.0 {
                return Err(WellPathError::validation(
                    "stage.feedrate_mm_per_min",
                    format!("feedrate must be positive, got {}", feedrate),
                ));
            }
        }
        check_range("stage.limits.x", &stage.limits.x)?;
        check_range("stage.limits.y", &stage.limits.y)?;
        check_range("stage.limits.z", &stage.limits.z)?;

        if self.laser.gpio_pin > MAX_GPIO_PIN {
            return Err(WellPathError::validation(
                "laser.gpio_pin",
                format!("GPIO pin must be 0-{}, got {}", MAX_GPIO_PIN, self.laser.gpio_pin),
            ));
        }

        for (field, dir) in [
            ("paths.calibration_dir", &self.paths.calibration_dir),
            ("paths.experiments_dir", &self.paths.experiments_dir),
            ("paths.outputs_dir", &self.paths.outputs_dir),
        ] {
            if dir.as_os_str().is_empty() {
                return Err(WellPathError::validation(field, "directory must not be empty"));
            }
        }

        self.logging.level_filter()?;
        Ok(())
    }
}
