//! Command-line argument surface.

use crate::geometry::Point;
use crate::output::ImageFormat;
use clap::Parser;
use std::path::PathBuf;

/// Tiled image acquisition for a microscope on a motorized stage.
#[derive(Parser, Debug)]
#[command(name = "microscan", version, about)]
pub struct Cli {
    /// Farthest coordinates to cover, as `x,y` in mm.
    #[arg(long, value_parser = parse_point, value_name = "X,Y")]
    pub end: Point,

    /// Identifier of the objective in use.
    #[arg(long)]
    pub obj: String,

    /// Vendor of the imaged chip.
    #[arg(long)]
    pub vendor: String,

    /// Identifier of the imaged chip.
    #[arg(long)]
    pub chip: String,

    /// Identifier of the layer being imaged.
    #[arg(long)]
    pub layer: String,

    /// Tile overlap in percent.
    #[arg(long, default_value_t = 30)]
    pub overlap: u32,

    /// Extra identifier appended to the output directory.
    #[arg(long)]
    pub extraid: Option<String>,

    /// Image output format.
    #[arg(long, value_enum, default_value_t = ImageFormat::Jpg)]
    pub format: ImageFormat,

    /// Perform all motion but skip capture and file output.
    #[arg(long)]
    pub dry: bool,

    /// Root output directory.
    #[arg(long, default_value = "out")]
    pub out: PathBuf,

    /// Show the framing preview and do nothing else.
    #[arg(long)]
    pub view: bool,

    /// Zoom the preview onto the usable (non-margin) region.
    #[arg(long)]
    pub crop: bool,

    /// Drive the grid extremes and hold for inspection.
    #[arg(long)]
    pub test: bool,

    /// Loop over the grid corners for die leveling.
    #[arg(long)]
    pub level: bool,

    /// Motion controller host, overriding the configured one.
    #[arg(long)]
    pub host: Option<String>,

    /// Extra settings file layered over the built-in defaults.
    #[arg(long)]
    pub config: Option<PathBuf>,
}

fn parse_point(s: &str) -> Result<Point, String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| "coordinates must be given as x,y".to_string())?;
    let x: f64 = x
        .trim()
        .parse()
        .map_err(|_| format!("invalid x coordinate '{x}'"))?;
    let y: f64 = y
        .trim()
        .parse()
        .map_err(|_| format!("invalid y coordinate '{y}'"))?;
    Ok(Point::new(x, y))
}
