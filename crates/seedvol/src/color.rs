//! Color summary of the top-view blob.

use image::{GrayImage, RgbImage};

/// Mean `[R, G, B]` of `image` over the non-zero pixels of `mask`.
///
/// Returns zeros for an empty mask. Mask pixels outside `image` are ignored.
pub fn mean_rgb(image: &RgbImage, mask: &GrayImage) -> [f64; 3] {
    let (w, h) = image.dimensions();
    let mut sum = [0u64; 3];
    let mut count = 0u64;

    for (x, y, m) in mask.enumerate_pixels() {
        if m[0] == 0 || x >= w || y >= h {
            continue;
        }
        let p = image.get_pixel(x, y);
        for c in 0..3 {
            sum[c] += p[c] as u64;
        }
        count += 1;
    }

    if count == 0 {
        return [0.0; 3];
    }
    sum.map(|s| s as f64 / count as f64)
}
