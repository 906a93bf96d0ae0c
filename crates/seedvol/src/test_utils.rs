//! Synthetic silhouettes shared by unit tests.

use image::{GrayImage, Luma, Rgb, RgbImage};

/// Axis-aligned filled rectangle: `origin` is the top-left pixel and `size`
/// the pixel extent `[w, h]`.
pub(crate) fn draw_rect_image(
    w: u32,
    h: u32,
    origin: [u32; 2],
    size: [u32; 2],
    fg: u8,
    bg: u8,
) -> GrayImage {
    let x_range = origin[0]..origin[0] + size[0];
    let y_range = origin[1]..origin[1] + size[1];
    GrayImage::from_fn(w, h, |x, y| {
        if x_range.contains(&x) && y_range.contains(&y) {
            Luma([fg])
        } else {
            Luma([bg])
        }
    })
}

/// Filled rectangle of `size = [length, width]` rotated by `angle_deg`
/// (image coordinates, y down) about `center`. Foreground 255 on black.
pub(crate) fn draw_rotated_rect_image(
    w: u32,
    h: u32,
    center: [f32; 2],
    size: [f32; 2],
    angle_deg: f32,
) -> GrayImage {
    let (s, c) = angle_deg.to_radians().sin_cos();
    GrayImage::from_fn(w, h, |x, y| {
        let dx = x as f32 - center[0];
        let dy = y as f32 - center[1];
        let u = dx * c + dy * s;
        let v = -dx * s + dy * c;
        if u.abs() <= 0.5 * size[0] && v.abs() <= 0.5 * size[1] {
            Luma([255])
        } else {
            Luma([0])
        }
    })
}

/// Filled axis-aligned ellipse with full axes `[a, b]` along x and y.
pub(crate) fn draw_ellipse_image(w: u32, h: u32, center: [f32; 2], axes: [f32; 2]) -> GrayImage {
    let ra = 0.5 * axes[0];
    let rb = 0.5 * axes[1];
    GrayImage::from_fn(w, h, |x, y| {
        let nx = (x as f32 - center[0]) / ra;
        let ny = (y as f32 - center[1]) / rb;
        if nx * nx + ny * ny <= 1.0 {
            Luma([255])
        } else {
            Luma([0])
        }
    })
}

/// Color image painted with `color` wherever `mask` is non-zero.
pub(crate) fn paint_mask(mask: &GrayImage, color: [u8; 3], bg: [u8; 3]) -> RgbImage {
    let (w, h) = mask.dimensions();
    RgbImage::from_fn(w, h, |x, y| {
        if mask.get_pixel(x, y)[0] > 0 {
            Rgb(color)
        } else {
            Rgb(bg)
        }
    })
}
