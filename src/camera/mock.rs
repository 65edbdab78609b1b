//! Recording camera double for tests.

use crate::camera::{Camera, CaptureMetadata, CropWindow};
use crate::config::CaptureControls;
use crate::error::{AppResult, ScanError};
use chrono::Utc;
use image::RgbaImage;
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Mock camera that records capture paths and writes empty marker files.
///
/// Clones share state, like [`crate::motion::MockController`].
#[derive(Clone, Default)]
pub struct MockCamera {
    inner: Arc<Mutex<State>>,
}

#[derive(Default)]
struct State {
    captures: Vec<PathBuf>,
    locked: Option<CaptureControls>,
    preview_count: usize,
    fail_on: Option<usize>,
}

impl MockCamera {
    /// Create a camera that succeeds on every capture.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the `index`-th capture (zero-based) fail like a sensor fault.
    pub fn fail_on(&self, index: usize) {
        self.inner.lock().fail_on = Some(index);
    }

    /// Paths captured so far, in order.
    pub fn captures(&self) -> Vec<PathBuf> {
        self.inner.lock().captures.clone()
    }

    /// Controls locked by the sequencer's calibration step, if any.
    pub fn locked_controls(&self) -> Option<CaptureControls> {
        self.inner.lock().locked.clone()
    }

    /// How many times a preview was started.
    pub fn preview_count(&self) -> usize {
        self.inner.lock().preview_count
    }
}

impl Camera for MockCamera {
    fn lock_controls(&mut self, controls: &CaptureControls) -> AppResult<()> {
        self.inner.lock().locked = Some(controls.clone());
        Ok(())
    }

    fn start_preview(&mut self, _overlay: &RgbaImage, _crop: Option<CropWindow>) -> AppResult<()> {
        self.inner.lock().preview_count += 1;
        Ok(())
    }

    fn capture_still(&mut self, path: &Path) -> AppResult<CaptureMetadata> {
        let mut state = self.inner.lock();
        let index = state.captures.len();
        if state.fail_on == Some(index) {
            return Err(ScanError::Capture {
                path: path.to_path_buf(),
                reason: "simulated sensor fault".to_string(),
            });
        }
        std::fs::write(path, []).map_err(|e| ScanError::Capture {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        state.captures.push(path.to_path_buf());
        let (exposure_us, analogue_gain) = state
            .locked
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
