//! Framing guide overlay for the live preview.
//!
//! Renders, on a transparent background, the valid (non-margin) capture
//! region in red, the overlap-shrunk region in green, and a center
//! crosshair in blue. Purely a human framing aid; nothing in the scan's
//! correctness depends on it.

use crate::geometry::{Objective, Point};
use image::{Rgba, RgbaImage};

const CROP_COLOR: Rgba<u8> = Rgba([255, 0, 0, 255]);
const OVERLAP_COLOR: Rgba<u8> = Rgba([0, 255, 0, 255]);
const CENTER_COLOR: Rgba<u8> = Rgba([0, 0, 255, 255]);
const GUIDE_STROKE: i64 = 10;
const CENTER_STROKE: i64 = 2;

/// Render the guide overlay at resolution `res`.
pub fn render_overlay(objective: &Objective, overlap: f64, res: Point) -> RgbaImage {
    let width = res.x as i64;
    let height = res.y as i64;
    let mut img = RgbaImage::new(width as u32, height as u32);

    let m = objective.margins;
    let crop_left = (res.x * m.left) as i64;
    let crop_top = (res.y * m.top) as i64;
    let crop_right = (res.x - res.x * m.right) as i64;
    let crop_bottom = (res.y - res.y * m.bottom) as i64;

    // Half the overlap is lost on each side of a shared border.
    let over_left = crop_left + (res.x * overlap / 2.0) as i64;
    let over_top = crop_top + (res.y * overlap / 2.0) as i64;
    let over_right = crop_right - (res.x * overlap / 2.0) as i64;
    let over_bottom = crop_bottom - (res.y * overlap / 2.0) as i64;

    draw_hollow_rect(
        &mut img,
        crop_left,
        crop_top,
        crop_right,
        crop_bottom,
        GUIDE_STROKE,
        CROP_COLOR,
    );
    draw_hollow_rect(
        &mut img,
        over_left,
        over_top,
        over_right,
        over_bottom,
        GUIDE_STROKE,
        OVERLAP_COLOR,
    );

    let mid_x = width / 2 - 1;
    let mid_y = height / 2 - 1;
    fill_rect(&mut img, mid_x, 0, mid_x + CENTER_STROKE, height, CENTER_COLOR);
    fill_rect(&mut img, 0, mid_y, width, mid_y + CENTER_STROKE, CENTER_COLOR);

    img
}

/// Outline `[x0, x1) x [y0, y1)` with four bands of `stroke` thickness
/// drawn inward.
fn draw_hollow_rect(img: &mut RgbaImage, x0: i64, y0: i64, x1: i64, y1: i64, stroke: i64, color: Rgba<u8>) {
    fill_rect(img, x0, y0, x1, y0 + stroke, color);
    fill_rect(img, x0, y1 - stroke, x1, y1, color);
    fill_rect(img, x0, y0, x0 + stroke, y1, color);
    fill_rect(img, x1 - stroke, y0, x1, y1, color);
}

fn fill_rect(img: &mut RgbaImage, x0: i64, y0: i64, x1: i64, y1: i64, color: Rgba<u8>) {
    let x0 = x0.clamp(0, i64::from(img.width()));
    let x1 = x1.clamp(0, i64::from(img.width()));
    let y0 = y0.clamp(0, i64::from(img.height()));
    let y1 = y1.clamp(0, i64::from(img.height()));
    for y in y0..y1 {
        for x in x0..x1 {
            img.put_pixel(x as u32, y as u32, color);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Margins;

    fn test_objective() -> Objective {
        Objective::new(1.0, 1.0, Margins::new(0.1, 0.1, 0.2, 0.2).unwrap())
    }

    #[test]
    fn test_overlay_dimensions() {
        let img = render_overlay(&test_objective(), 0.3, Point::new(400.0, 200.0));
        assert_eq!((img.width(), img.height()), (400, 200));
    }

    #[test]
    fn test_background_is_transparent() {
        let img = render_overlay(&test_objective(), 0.3, Point::new(400.0, 200.0));
        assert_eq!(img.get_pixel(0, 0).0[3], 0);
    }

    #[test]
    fn test_crop_border_is_red() {
        // crop_left = 400 * 0.2 = 80, crop_top = 200 * 0.1 = 20
        let img = render_overlay(&test_objective(), 0.3, Point::new(400.0, 200.0));
        assert_eq!(*img.get_pixel(80, 20), Rgba([255, 0, 0, 255]));
    }

    #[test]
    fn test_overlap_border_is_green() {
        // over_left = 80 + 400 * 0.15 = 140, over_top = 20 + 200 * 0.15 = 50
        let img = render_overlay(&test_objective(), 0.3, Point::new(400.0, 200.0));
        assert_eq!(*img.get_pixel(140, 50), Rgba([0, 255, 0, 255]));
    }

    #[test]
    fn test_center_crosshair_is_blue() {
        let img = render_overlay(&test_objective(), 0.3, Point::new(400.0, 200.0));
        assert_eq!(*img.get_pixel(199, 5), Rgba([0, 0, 255, 255]));
        assert_eq!(*img.get_pixel(5, 99), Rgba([0, 0, 255, 255]));
    }

    #[test]
    fn test_out_of_bounds_geometry_is_clamped() {
        // Degenerate preview smaller than the stroke width must not panic.
        let img = render_overlay(&test_objective(), 0.9, Point::new(8.0, 8.0));
        assert_eq!((img.width(), img.height()), (8, 8));
    }
}
