//! Scan planning: stage step geometry and the ordered tile grid.
//!
//! A [`Plan`] binds an objective to an overlap fraction and the sensor
//! resolution, and derives the stage displacement between adjacent tiles.
//! [`Plan::grid`] expands a target travel extent into the ordered
//! [`ScanGrid`] the sequencer walks.
//!
//! The grid is generated column-major with inverted row numbering: the tile
//! emitted at planner index `(x, y)` carries output row `y_count - y - 1`.
//! Row 0 is the farthest-traveled y position, matching the bottom-up
//! mounting of the die on the stage. Filenames, and therefore downstream
//! stitching, depend on this exact ordering.

use crate::error::{AppResult, ScanError};
use crate::geometry::{round2, Objective, Point};
use serde::Serialize;

/// A validated scan plan: objective, overlap fraction and sensor resolution.
#[derive(Clone, Copy, Debug)]
pub struct Plan {
    objective: Objective,
    overlap: f64,
    res: Point,
}

impl Plan {
    /// Create a plan.
    ///
    /// # Errors
    /// Rejects margins violating their invariants, `overlap` outside
    /// `[0, 1)`, and any combination yielding a non-positive step size (a
    /// zero-size objective, for instance). Planning failures are detected
    /// here, before any motion occurs.
    pub fn new(objective: Objective, overlap: f64, res: Point) -> AppResult<Self> {
        objective.margins.validate()?;
        if !(0.0..1.0).contains(&overlap) {
            return Err(ScanError::Plan(format!(
                "overlap must be in [0, 1), got {overlap}"
            )));
        }
        let plan = Self {
            objective,
            overlap,
            res,
        };
        if plan.step_x() <= 0.0 || plan.step_y() <= 0.0 {
            return Err(ScanError::Plan(format!(
                "degenerate step size {} x {} mm; check objective dimensions and overlap",
                plan.step_x(),
                plan.step_y()
            )));
        }
        Ok(plan)
    }

    /// The objective this plan was built for.
    pub fn objective(&self) -> &Objective {
        &self.objective
    }

    /// Overlap fraction shared between adjacent tiles.
    pub fn overlap(&self) -> f64 {
        self.overlap
    }

    /// Sensor resolution in pixels.
    pub fn res(&self) -> Point {
        self.res
    }

    /// Horizontal stage displacement between adjacent tiles, in mm.
    pub fn step_x(&self) -> f64 {
        let overlap = self.objective.move_x() * self.overlap;
        round2(self.objective.move_x() - overlap)
    }

    /// Vertical stage displacement between adjacent tiles, in mm.
    pub fn step_y(&self) -> f64 {
        let overlap = self.objective.move_y() * self.overlap;
        round2(self.objective.move_y() - overlap)
    }

    /// Pixel bounds of the usable (non-margin) region at sensor resolution,
    /// as `(left, top, right, bottom)`.
    pub fn crop_px(&self) -> (u32, u32, u32, u32) {
        let m = self.objective.margins;
        let left = (self.res.x * m.left) as u32;
        let top = (self.res.y * m.top) as u32;
        let right = (self.res.x - self.res.x * m.right) as u32;
        let bottom = (self.res.y - self.res.y * m.bottom) as u32;
        (left, top, right, bottom)
    }

    /// Expand the plan into the ordered tile grid covering `travel_end`.
    ///
    /// The per-axis tile count is `ceil((end + step/2) / step)`: a travel
    /// distance exactly divisible by the step yields full coverage without a
    /// redundant extra tile, while a distance just past N steps rounds up to
    /// N + 1 instead of truncating.
    ///
    /// # Errors
    /// Rejects negative travel coordinates.
    pub fn grid(&self, travel_end: Point) -> AppResult<ScanGrid> {
        if travel_end.x < 0.0 || travel_end.y < 0.0 {
            return Err(ScanError::Plan(format!(
                "travel end coordinates must be non-negative, got ({}, {})",
                travel_end.x, travel_end.y
            )));
        }
        let step_x = self.step_x();
        let step_y = self.step_y();
        let x_count = ((travel_end.x + step_x / 2.0) / step_x).ceil() as usize;
        let y_count = ((travel_end.y + step_y / 2.0) / step_y).ceil() as usize;

        let mut tiles = Vec::with_capacity(x_count * y_count);
        for x in 0..x_count {
            for y in 0..y_count {
                tiles.push(Tile {
                    col: x,
                    row: y_count - y - 1,
                    x: round2(x as f64 * step_x),
                    y: round2(y as f64 * step_y),
                });
            }
        }

        Ok(ScanGrid {
            tiles,
            x_count,
            y_count,
        })
    }
}

/// One grid cell of the mosaic: its row/column identity and its absolute
/// target stage coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Tile {
    /// Output column index.
    pub col: usize,
    /// Output row index (0 = farthest traveled in y).
    pub row: usize,
    /// Target stage x coordinate in mm.
    pub x: f64,
    /// Target stage y coordinate in mm.
    pub y: f64,
}

impl Tile {
    /// File stem identifying this tile in the mosaic, e.g. `r002_c000`.
    pub fn file_stem(&self) -> String {
        format!("r{:03}_c{:03}", self.row, self.col)
    }
}

/// The ordered tile sequence of one run. Computed once, immutable after.
#[derive(Clone, Debug)]
pub struct ScanGrid {
    tiles: Vec<Tile>,
    x_count: usize,
    y_count: usize,
}

impl ScanGrid {
    /// Total number of tiles.
    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    /// Whether the grid holds no tiles.
    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// Number of columns.
    pub fn x_count(&self) -> usize {
        self.x_count
    }

    /// Number of rows.
    pub fn y_count(&self) -> usize {
        self.y_count
    }

    /// Iterate tiles in traversal order.
    pub fn iter(&self) -> std::slice::Iter<'_, Tile> {
        self.tiles.iter()
    }

    /// Farthest stage coordinates the scan will visit.
    pub fn extent(&self) -> Point {
        self.tiles.iter().fold(Point::new(0.0, 0.0), |acc, tile| {
            Point::new(acc.x.max(tile.x), acc.y.max(tile.y))
        })
    }
}

impl<'a> IntoIterator for &'a ScanGrid {
    type Item = &'a Tile;
    type IntoIter = std::slice::Iter<'a, Tile>;

    fn into_iter(self) -> Self::IntoIter {
        self.tiles.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Margins;

    fn plan_with_step(step: f64) -> Plan {
        // No margins and zero overlap: step == objective size.
        let objective = Objective::new(step, step, Margins::none());
        Plan::new(objective, 0.0, Point::new(4056.0, 3040.0)).unwrap()
    }

    #[test]
    fn test_zero_overlap_step_equals_usable_travel() {
        let margins = Margins::new(0.05, 0.05, 0.05, 0.05).unwrap();
        let objective = Objective::new(1.7, 1.3, margins);
        let plan = Plan::new(objective, 0.0, Point::new(100.0, 100.0)).unwrap();
        assert_eq!(plan.step_x(), objective.move_x());
        assert_eq!(plan.step_y(), objective.move_y());
    }

    #[test]
    fn test_step_shrinks_by_overlap() {
        let objective = Objective::new(2.0, 1.0, Margins::none());
        let plan = Plan::new(objective, 0.3, Point::new(100.0, 100.0)).unwrap();
        assert_eq!(plan.step_x(), 1.4);
        assert_eq!(plan.step_y(), 0.7);
    }

    #[test]
    fn test_rejects_overlap_out_of_range() {
        let objective = Objective::new(1.0, 1.0, Margins::none());
        assert!(Plan::new(objective, 1.0, Point::new(1.0, 1.0)).is_err());
        assert!(Plan::new(objective, -0.1, Point::new(1.0, 1.0)).is_err());
    }

    #[test]
    fn test_rejects_zero_size_objective() {
        let objective = Objective::new(0.0, 1.0, Margins::none());
        assert!(Plan::new(objective, 0.3, Point::new(1.0, 1.0)).is_err());
    }

    #[test]
    fn test_grid_count_half_step_bias() {
        // end 10.0 with step 3.0: ceil((10 + 1.5) / 3) = 4 per axis.
        let grid = plan_with_step(3.0).grid(Point::new(10.0, 10.0)).unwrap();
        assert_eq!(grid.x_count(), 4);
        assert_eq!(grid.y_count(), 4);
        assert_eq!(grid.len(), 16);
    }

    #[test]
    fn test_grid_exact_multiple_has_no_redundant_tile() {
        // end 9.0 with step 3.0: ceil(10.5 / 3) = 4, not 5.
        let grid = plan_with_step(3.0).grid(Point::new(9.0, 9.0)).unwrap();
        assert_eq!(grid.x_count(), 4);
    }

    #[test]
    fn test_grid_zero_end_single_tile() {
        let grid = plan_with_step(3.0).grid(Point::new(0.0, 0.0)).unwrap();
        assert_eq!(grid.len(), 1);
        let tile = grid.iter().next().unwrap();
        assert_eq!((tile.col, tile.row), (0, 0));
        assert_eq!((tile.x, tile.y), (0.0, 0.0));
    }

    #[test]
    fn test_rejects_negative_travel() {
        assert!(plan_with_step(3.0).grid(Point::new(-1.0, 5.0)).is_err());
    }

    #[test]
    fn test_row_inversion() {
        // 2 columns x 3 rows: first emitted tile (planner index x=0, y=0)
        // carries output row 2, column 0.
        let grid = plan_with_step(1.0).grid(Point::new(1.2, 2.2)).unwrap();
        assert_eq!(grid.x_count(), 2);
        assert_eq!(grid.y_count(), 3);
        let tiles: Vec<_> = grid.iter().collect();
        assert_eq!((tiles[0].col, tiles[0].row), (0, 2));
        assert_eq!((tiles[1].col, tiles[1].row), (0, 1));
        assert_eq!((tiles[2].col, tiles[2].row), (0, 0));
        assert_eq!((tiles[3].col, tiles[3].row), (1, 2));
    }

    #[test]
    fn test_column_major_coordinates() {
        let grid = plan_with_step(1.5).grid(Point::new(1.6, 1.6)).unwrap();
        let tiles: Vec<_> = grid.iter().collect();
        // x stays fixed while y advances, then x steps.
        assert_eq!((tiles[0].x, tiles[0].y), (0.0, 0.0));
        assert_eq!((tiles[1].x, tiles[1].y), (0.0, 1.5));
        assert_eq!((tiles[2].x, tiles[2].y), (1.5, 0.0));
    }

    #[test]
    fn test_tile_file_stem() {
        let tile = Tile {
            col: 0,
            row: 2,
            x: 0.0,
            y: 0.0,
        };
        assert_eq!(tile.file_stem(), "r002_c000");
    }

    #[test]
    fn test_extent_matches_last_step() {
        let grid = plan_with_step(3.0).grid(Point::new(10.0, 10.0)).unwrap();
        let extent = grid.extent();
        assert_eq!(extent.x, 9.0);
        assert_eq!(extent.y, 9.0);
    }

    #[test]
    fn test_crop_px_centered_window() {
        let margins = Margins::new(0.1, 0.1, 0.25, 0.25).unwrap();
        let objective = Objective::new(1.0, 1.0, margins);
        let plan = Plan::new(objective, 0.0, Point::new(1000.0, 800.0)).unwrap();
        assert_eq!(plan.crop_px(), (250, 80, 750, 720));
    }
}
