//! View alignment: rotate the long axis onto x, resample the side view so
//! both views share the same pixel length.

use image::imageops::FilterType;
use image::{GrayImage, Luma};
use imageproc::geometric_transformations::{rotate, Interpolation};

use crate::blob::BlobGeometry;

/// Rotate `gray` about the blob center so its length axis lies along x.
/// Uncovered pixels are filled with black (background).
pub fn rotate_to_axis(gray: &GrayImage, geometry: &BlobGeometry) -> GrayImage {
    let center = (geometry.center[0] as f32, geometry.center[1] as f32);
    let theta = -geometry.angle_deg.to_radians() as f32;
    rotate(gray, center, theta, Interpolation::Bilinear, Luma([0]))
}

/// `true` when the view is angled enough to be rotated before profiling.
pub fn needs_rotation(geometry: &BlobGeometry, tolerance_deg: f64) -> bool {
    geometry.detected && geometry.angle_deg.abs() > tolerance_deg
}

/// Stretch `gray` horizontally by `factor`; height is unchanged.
pub fn resample_length(gray: &GrayImage, factor: f64) -> GrayImage {
    let (w, h) = gray.dimensions();
    let new_w = (w as f64 * factor).round().max(1.0) as u32;
    image::imageops::resize(gray, new_w, h, FilterType::Triangle)
}
