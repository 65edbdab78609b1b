//! Camera capability surface.
//!
//! The acquisition core only needs "capture a frame to a named output";
//! driver details (sensor configuration, encoding, preview rendering) stay
//! behind this trait. The sequencer logs capture metadata but never
//! inspects it for correctness.

pub mod mock;
pub mod still;

pub use mock::MockCamera;
pub use still::CommandCamera;

use crate::config::CaptureControls;
use crate::error::AppResult;
use crate::geometry::Margins;
use chrono::{DateTime, Utc};
use image::RgbaImage;
use serde::Serialize;
use std::path::Path;

/// Metadata returned with each captured frame.
#[derive(Clone, Debug, Serialize)]
pub struct CaptureMetadata {
    /// Shutter time in microseconds.
    pub exposure_us: u32,
    /// Analogue sensor gain.
    pub analogue_gain: f64,
    /// When the frame was captured.
    pub timestamp: DateTime<Utc>,
}

/// Normalized sensor window (all components in `[0, 1]`) used to zoom the
/// framing preview onto the usable region.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CropWindow {
    /// Left edge.
    pub x: f64,
    /// Top edge.
    pub y: f64,
    /// Window width.
    pub width: f64,
    /// Window height.
    pub height: f64,
}

impl CropWindow {
    /// Window covering the usable (non-margin) part of the field of view.
    pub fn from_margins(margins: &Margins) -> Self {
        Self {
            x: margins.left,
            y: margins.top,
            width: 1.0 - margins.left - margins.right,
            height: 1.0 - margins.top - margins.bottom,
        }
    }
}

/// Capability interface for the image sensor.
pub trait Camera {
    /// Fix exposure and gain so every tile is captured with identical
    /// settings.
    fn lock_controls(&mut self, controls: &CaptureControls) -> AppResult<()>;

    /// Start the live framing preview showing `overlay`, optionally zoomed
    /// to `crop`.
    fn start_preview(&mut self, overlay: &RgbaImage, crop: Option<CropWindow>) -> AppResult<()>;

    /// Capture one frame to `path`, blocking until it is written.
    fn capture_still(&mut self, path: &Path) -> AppResult<CaptureMetadata>;
}
