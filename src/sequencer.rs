//! Scan orchestration: drives motion and capture in lockstep.
//!
//! The sequencer owns both collaborators for the duration of a run and
//! issues exactly one motion command at a time; a tile is only captured
//! after its move has been acknowledged and the stage has settled. The
//! throughput cost is deliberate: capturing at a not-yet-settled position
//! is the primary correctness risk.
//!
//! There is no checkpointing. A run that dies mid-scan is restarted from
//! the beginning; tiles already on disk are kept, since a partial mosaic is
//! still useful to the operator.

use crate::camera::Camera;
use crate::config::{CaptureControls, TimingSettings};
use crate::error::AppResult;
use crate::motion::MotionController;
use crate::output::{ImageFormat, OutputLayout};
use crate::planner::ScanGrid;
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info};
use std::thread;

/// Drives the full scan over a planned grid.
pub struct CaptureSequencer<M: MotionController, C: Camera> {
    motion: M,
    camera: C,
    controls: CaptureControls,
    timing: TimingSettings,
    dry_run: bool,
}

impl<M: MotionController, C: Camera> CaptureSequencer<M, C> {
    /// Create a sequencer. Both collaborators are owned exclusively for the
    /// run; configuration is passed in explicitly.
    pub fn new(
        motion: M,
        camera: C,
        controls: CaptureControls,
        timing: TimingSettings,
        dry_run: bool,
    ) -> Self {
        Self {
            motion,
            camera,
            controls,
            timing,
            dry_run,
        }
    }

    /// Switch to absolute positioning, lock camera controls at a lit stage
    /// position, then home.
    fn prepare(&mut self) -> AppResult<()> {
        self.motion.send("G90")?;
        info!("Calibrating camera");
        self.motion.send("G0 X1 Y1")?;
        self.camera.lock_controls(&self.controls)?;
        thread::sleep(self.timing.calibration_settle);
        info!("Homing");
        self.motion.send("G0 X0 Y0")?;
        thread::sleep(self.timing.home_settle);
        Ok(())
    }

    /// Run the scan: move, settle, capture for every tile in grid order,
    /// then release the motion session.
    ///
    /// In dry-run mode every motion command is still issued, so the rig
    /// physically performs the scan, but capture and file output are
    /// skipped.
    ///
    /// # Errors
    /// Any motion or capture failure aborts immediately; tiles already
    /// captured stay on disk.
    pub fn run(
        &mut self,
        grid: &ScanGrid,
        output: &OutputLayout,
        format: ImageFormat,
    ) -> AppResult<()> {
        self.prepare()?;

        let bar = ProgressBar::new(grid.len() as u64);
        if let Ok(style) =
            ProgressStyle::default_bar().template("[{bar:40.cyan/blue}] {pos}/{len} ({eta})")
        {
            bar.set_style(style);
        }

        for tile in grid {
            self.motion.send(&format!("G0 X{} Y{}", tile.x, tile.y))?;
            let settle = if tile.y == 0.0 {
                // Start of a new column pass: the full y retrace needs
                // longer for backlash and vibration to die down.
                self.timing.settle_new_row
            } else {
                self.timing.settle_same_row
            };
            thread::sleep(settle);
            bar.inc(1);

            if !self.dry_run {
                let path = output.tile_path(tile, format);
                let metadata = self.camera.capture_still(&path)?;
                debug!(
                    "Captured {} ({} us, gain {})",
                    path.display(),
                    metadata.exposure_us,
                    metadata.analogue_gain
                );
                thread::sleep(self.timing.capture_settle);
            }
        }

        bar.finish();
        self.motion.close()?;
        Ok(())
    }

    /// Drive the grid extremes so the operator can verify travel and focus.
    /// The stage is left at the far corner for inspection.
    pub fn run_test(&mut self, grid: &ScanGrid) -> AppResult<()> {
        self.prepare()?;
        let extent = grid.extent();
        self.motion.send("G0 X0 Y0")?;
        thread::sleep(self.timing.home_settle);
        self.motion.send(&format!("G0 X{}", extent.x))?;
        thread::sleep(self.timing.home_settle);
        self.motion.send(&format!("G0 Y{}", extent.y))?;
        Ok(())
    }

    /// Loop over the grid corners for die leveling. `confirm` is called
    /// after each move; returning `false` ends the loop. Produces no
    /// output.
    pub fn run_level(
        &mut self,
        grid: &ScanGrid,
        confirm: &mut dyn FnMut() -> bool,
    ) -> AppResult<()> {
        self.prepare()?;
        let extent = grid.extent();
        let corners = [
            (extent.x, 0.0),
            (0.0, 0.0),
            (extent.x, extent.y),
        ];
        loop {
            for (x, y) in corners {
                self.motion.send(&format!("G0 X{x} Y{y}"))?;
                if !confirm() {
                    self.motion.close()?;
                    return Ok(());
                }
            }
        }
    }
}
