//! Output tree layout for captured tiles.
//!
//! Tiles land under `root/vendor/chip[/extra]` with deterministic names
//! `r{row:03}_c{col:03}.{ext}`; downstream stitching relies on the exact
//! naming.

use crate::error::{AppResult, ScanError};
use crate::planner::Tile;
use clap::ValueEnum;
use std::fs;
use std::path::{Path, PathBuf};

/// Image output format selected on the command line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ImageFormat {
    /// JPEG tiles.
    Jpg,
    /// PNG tiles.
    Png,
    /// PNG tiles restricted to the usable sensor window.
    Crop,
}

impl ImageFormat {
    /// File extension for captured tiles. Cropped captures are written as
    /// PNG.
    pub fn extension(&self) -> &'static str {
        match self {
            ImageFormat::Jpg => "jpg",
            ImageFormat::Png | ImageFormat::Crop => "png",
        }
    }
}

impl std::fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            ImageFormat::Jpg => "jpg",
            ImageFormat::Png => "png",
            ImageFormat::Crop => "crop",
        })
    }
}

/// Directory one run's tiles are written into.
#[derive(Clone, Debug)]
pub struct OutputLayout {
    dir: PathBuf,
}

impl OutputLayout {
    /// Compute the run directory without touching the filesystem. Used by
    /// dry runs, which never write.
    pub fn locate(root: &Path, vendor: &str, chip: &str, extra_id: Option<&str>) -> Self {
        let mut dir = root.join(vendor).join(chip);
        if let Some(extra) = extra_id {
            dir.push(extra);
        }
        Self { dir }
    }

    /// Compute and create the run directory. Creation is idempotent; an
    /// existing tree is reused.
    ///
    /// # Errors
    /// Filesystem failure is fatal for capturing runs.
    pub fn create(root: &Path, vendor: &str, chip: &str, extra_id: Option<&str>) -> AppResult<Self> {
        let layout = Self::locate(root, vendor, chip, extra_id);
        fs::create_dir_all(&layout.dir).map_err(|source| ScanError::Output {
            path: layout.dir.clone(),
            source,
        })?;
        Ok(layout)
    }

    /// The run directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Output path for one tile.
    pub fn tile_path(&self, tile: &Tile, format: ImageFormat) -> PathBuf {
        self.dir
            .join(format!("{}.{}", tile.file_stem(), format.extension()))
    }
}
