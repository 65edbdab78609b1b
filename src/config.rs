//! Layered application settings.
//!
//! Defaults are compiled in from `config/default.toml`; an optional TOML
//! file (`--config`) and `MICROSCAN_*` environment variables override them.
//! The resolved [`Settings`] value is constructed once in `main` and passed
//! explicitly into the planner and sequencer constructors. Nothing here is
//! global.
//!
//! ## Override example
//!
//! ```toml
//! [controller]
//! host = "192.168.7.2"
//! ack_timeout = "5s"
//!
//! [objectives.am10x]
//! width = 1.3
//! height = 1.0
//! margins = "standard"
//! ```

use crate::error::{AppResult, ScanError};
use crate::geometry::{Margins, Objective, Point};
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

const DEFAULT_CONFIG: &str = include_str!("../config/default.toml");

/// Fully resolved application settings.
#[derive(Clone, Debug, Deserialize)]
pub struct Settings {
    /// Motion controller endpoint and protocol limits.
    pub controller: ControllerSettings,
    /// Settle delays of the acquisition loop.
    pub timing: TimingSettings,
    /// Camera backend configuration.
    pub camera: CameraSettings,
    /// Named margin presets referenced by objectives.
    pub margins: HashMap<String, Margins>,
    /// Known objectives keyed by their CLI identifier.
    pub objectives: HashMap<String, ObjectiveSpec>,
}

/// Motion controller endpoint and protocol limits.
#[derive(Clone, Debug, Deserialize)]
pub struct ControllerSettings {
    /// Controller hostname or IP.
    pub host: String,
    /// Control port (telnet-style line session).
    pub port: u16,
    /// Bound on every per-command acknowledgment wait.
    #[serde(with = "humantime_serde")]
    pub ack_timeout: Duration,
}

/// Settle delays of the acquisition loop.
#[derive(Clone, Debug, Deserialize)]
pub struct TimingSettings {
    /// After a move that starts a new column pass (full y retrace), backlash
    /// and vibration need longer to die down.
    #[serde(with = "humantime_serde")]
    pub settle_new_row: Duration,
    /// After a move within the same column pass.
    #[serde(with = "humantime_serde")]
    pub settle_same_row: Duration,
    /// After the homing move.
    #[serde(with = "humantime_serde")]
    pub home_settle: Duration,
    /// After moving to the calibration position.
    #[serde(with = "humantime_serde")]
    pub calibration_settle: Duration,
    /// After each capture, before the next move.
    #[serde(with = "humantime_serde")]
    pub capture_settle: Duration,
}

impl TimingSettings {
    /// All delays zero. For tests and simulated rigs.
    pub fn immediate() -> Self {
        Self {
            settle_new_row: Duration::ZERO,
            settle_same_row: Duration::ZERO,
            home_settle: Duration::ZERO,
            calibration_settle: Duration::ZERO,
            capture_settle: Duration::ZERO,
        }
    }
}

/// Camera backend configuration.
#[derive(Clone, Debug, Deserialize)]
pub struct CameraSettings {
    /// Sensor width in pixels.
    pub width: u32,
    /// Sensor height in pixels.
    pub height: u32,
    /// Divisor applied to the sensor resolution for the preview.
    pub preview_scale: u32,
    /// Still-capture command of the platform camera stack.
    pub capture_command: String,
    /// Live-preview command of the platform camera stack.
    pub preview_command: String,
    /// Fixed capture controls applied after calibration.
    pub controls: CaptureControls,
}

impl CameraSettings {
    /// Sensor resolution as a point value.
    pub fn resolution(&self) -> Point {
        Point::new(f64::from(self.width), f64::from(self.height))
    }
}

/// Fixed capture controls, locked once at calibration so every tile is
/// captured identically.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CaptureControls {
    /// Shutter time in microseconds.
    pub exposure_us: u32,
    /// Analogue sensor gain.
    pub analogue_gain: f64,
}

/// One objective entry of the configuration; margins reference a preset by
/// name.
#[derive(Clone, Debug, Deserialize)]
pub struct ObjectiveSpec {
    /// Field of view width in mm.
    pub width: f64,
    /// Field of view height in mm.
    pub height: f64,
    /// Name of the margin preset to apply.
    pub margins: String,
}

impl Settings {
    /// Load settings: compiled-in defaults, then the optional file at
    /// `path`, then `MICROSCAN_*` environment variables.
    ///
    /// # Errors
    /// Fails on unreadable or malformed sources.
    pub fn load(path: Option<&Path>) -> AppResult<Self> {
        let mut builder =
            Config::builder().add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml));
        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }
        let settings = builder
            .add_source(Environment::with_prefix("MICROSCAN").separator("__"))
            .build()?
            .try_deserialize()?;
        Ok(settings)
    }

    /// Resolve an objective identifier to a validated [`Objective`].
    ///
    /// # Errors
    /// Fails for an unknown identifier, an unknown margin preset, or a
    /// preset violating the margin invariants.
    pub fn objective(&self, id: &str) -> AppResult<Objective> {
        let spec = self.objectives.get(id).ok_or_else(|| {
            let mut known: Vec<&str> = self.objectives.keys().map(String::as_str).collect();
            known.sort_unstable();
            ScanError::Configuration(format!(
                "unknown objective '{id}' (known: {})",
                known.join(", ")
            ))
        })?;
        let margins = self.margins.get(&spec.margins).ok_or_else(|| {
            ScanError::Configuration(format!(
                "objective '{id}' references unknown margin preset '{}'",
                spec.margins
            ))
        })?;
        margins.validate()?;
        Ok(Objective::new(spec.width, spec.height, *margins))
    }
}
