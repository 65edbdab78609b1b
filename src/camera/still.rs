//! Camera backend shelling out to the platform capture stack
//! (`rpicam-still`/`rpicam-hello` on the target rig).
//!
//! Capture blocks until the child process exits, which satisfies the
//! synchronous capture contract without linking sensor libraries. The
//! framing overlay is written as a PNG for the operator since the preview
//! tool has no compositing input.

use crate::camera::{Camera, CaptureMetadata, CropWindow};
use crate::config::{CameraSettings, CaptureControls};
use crate::error::{AppResult, ScanError};
use chrono::Utc;
use image::RgbaImage;
use log::{debug, info};
use std::path::Path;
use std::process::{Child, Command, Stdio};

/// Process-spawning camera backend.
pub struct CommandCamera {
    capture_command: String,
    preview_command: String,
    controls: Option<CaptureControls>,
    capture_crop: Option<CropWindow>,
    preview: Option<Child>,
}

impl CommandCamera {
    /// Create a backend from the configured commands.
    pub fn new(settings: &CameraSettings) -> Self {
        Self {
            capture_command: settings.capture_command.clone(),
            preview_command: settings.preview_command.clone(),
            controls: None,
            capture_crop: None,
            preview: None,
        }
    }

    /// Restrict captures to a sensor window. Used by the cropped output
    /// format; `None` captures full-frame.
    pub fn set_capture_crop(&mut self, crop: Option<CropWindow>) {
        self.capture_crop = crop;
    }

    fn control_args(&self) -> Vec<String> {
        match &self.controls {
            Some(controls) => vec![
                "--shutter".to_string(),
                controls.exposure_us.to_string(),
                "--gain".to_string(),
                controls.analogue_gain.to_string(),
            ],
            None => Vec::new(),
        }
    }
}

fn roi_arg(crop: &CropWindow) -> String {
    format!("{},{},{},{}", crop.x, crop.y, crop.width, crop.height)
}

impl Camera for CommandCamera {
    fn lock_controls(&mut self, controls: &CaptureControls) -> AppResult<()> {
        info!(
            "Locking capture controls: {} us exposure, gain {}",
            controls.exposure_us, controls.analogue_gain
        );
        self.controls = Some(controls.clone());
        Ok(())
    }

    fn start_preview(&mut self, overlay: &RgbaImage, crop: Option<CropWindow>) -> AppResult<()> {
        let overlay_path = std::env::temp_dir().join("microscan-overlay.png");
        overlay
            .save(&overlay_path)
            .map_err(|e| ScanError::Camera(format!("failed to write framing overlay: {e}")))?;
        info!("Framing overlay written to {}", overlay_path.display());

        let mut command = Command::new(&self.preview_command);
        command.args(["-t", "0"]);
        if let Some(crop) = crop {
            command.args(["--roi", &roi_arg(&crop)]);
        }
        let child = command
            .stdout(Stdio::null())
            .spawn()
            .map_err(|e| ScanError::Camera(format!("failed to run {}: {e}", self.preview_command)))?;
        debug!("Preview running (pid {})", child.id());
        self.preview = Some(child);
        Ok(())
    }

    fn capture_still(&mut self, path: &Path) -> AppResult<CaptureMetadata> {
        let mut command = Command::new(&self.capture_command);
        command
            .arg("--output")
            .arg(path)
            .args(["--nopreview", "--immediate"])
            .args(self.control_args());
        if let Some(crop) = &self.capture_crop {
            command.args(["--roi", &roi_arg(crop)]);
        }
        let status = command
            .status()
            .map_err(|e| ScanError::Camera(format!("failed to run {}: {e}", self.capture_command)))?;
        if !status.success() {
            return Err(ScanError::Capture {
                path: path.to_path_buf(),
                reason: format!("{} exited with {status}", self.capture_command),
            });
        }
        let (exposure_us, analogue_gain) = self
            .controls
            .as_ref()
            .map(|c| (c.exposure_us, c.analogue_gain))
            .unwrap_or((0, 0.0));
        Ok(CaptureMetadata {
            exposure_us,
            analogue_gain,
            timestamp: Utc::now(),
        })
    }
}

impl Drop for CommandCamera {
    fn drop(&mut self) {
        if let Some(mut child) = self.preview.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}
