//! Binary silhouettes: global threshold, closing, largest-blob masks.

use image::{GrayImage, Luma};
use imageproc::distance_transform::Norm;
use imageproc::region_labelling::{connected_components, Connectivity};

use crate::blob::BlobGeometry;

/// Foreground value used in every mask produced by this crate.
pub const FOREGROUND: u8 = 255;

/// Binary (0 / 255) raster of one camera view.
#[derive(Debug, Clone)]
pub struct Silhouette {
    mask: GrayImage,
}

impl Silhouette {
    /// Binarize `gray`: pixels strictly above `threshold` become foreground.
    pub fn threshold(gray: &GrayImage, threshold: u8) -> Self {
        let (w, h) = gray.dimensions();
        let mask = GrayImage::from_fn(w, h, |x, y| {
            if gray.get_pixel(x, y)[0] > threshold {
                Luma([FOREGROUND])
            } else {
                Luma([0])
            }
        });
        Self { mask }
    }

    /// Morphological closing (one dilation, then one erosion) with a
    /// `(2r+1) x (2r+1)` square structuring element. `radius == 0` is a no-op.
    pub fn closed(self, radius: u8) -> Self {
        if radius == 0 {
            return self;
        }
        Self {
            mask: imageproc::morphology::close(&self.mask, Norm::LInf, radius),
        }
    }

    /// Threshold followed by closing; the pre-filter used for every view.
    pub fn from_gray(gray: &GrayImage, threshold: u8, closing_radius: u8) -> Self {
        Self::threshold(gray, threshold).closed(closing_radius)
    }

    /// Wrap an existing mask; any non-zero pixel is foreground.
    pub fn from_mask(mask: &GrayImage) -> Self {
        Self::threshold(mask, 0)
    }

    pub fn mask(&self) -> &GrayImage {
        &self.mask
    }

    pub fn into_mask(self) -> GrayImage {
        self.mask
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.mask.dimensions()
    }

    /// Number of foreground pixels.
    pub fn foreground_count(&self) -> usize {
        self.mask.pixels().filter(|p| p[0] == FOREGROUND).count()
    }

    pub fn is_empty(&self) -> bool {
        self.foreground_count() == 0
    }

    /// Mask holding only the 8-connected component that owns the selected
    /// contour of `geometry`. Empty when nothing was detected.
    pub fn blob_mask(&self, geometry: &BlobGeometry) -> GrayImage {
        let (w, h) = self.mask.dimensions();
        let mut out = GrayImage::new(w, h);

        let Some(seed) = geometry.selected_contour().and_then(|c| c.points.first()) else {
            return out;
        };
        let [sx, sy] = *seed;
        if sx < 0 || sy < 0 || sx as u32 >= w || sy as u32 >= h {
            return out;
        }

        let labels = connected_components(&self.mask, Connectivity::Eight, Luma([0u8]));
        let target = labels.get_pixel(sx as u32, sy as u32)[0];
        if target == 0 {
            return out;
        }

        for (x, y, label) in labels.enumerate_pixels() {
            if label[0] == target {
                out.put_pixel(x, y, Luma([FOREGROUND]));
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::draw_rect_image;

    #[test]
    fn threshold_is_strictly_greater() {
        let mut img = GrayImage::new(3, 1);
        img.put_pixel(0, 0, Luma([59]));
        img.put_pixel(1, 0, Luma([60]));
        img.put_pixel(2, 0, Luma([61]));

        let s = Silhouette::threshold(&img, 60);
        assert_eq!(s.mask().get_pixel(0, 0)[0], 0);
        assert_eq!(s.mask().get_pixel(1, 0)[0], 0);
        assert_eq!(s.mask().get_pixel(2, 0)[0], FOREGROUND);
    }

    #[test]
    fn closing_fills_pinholes_without_shrinking_blob() {
        let mut img = draw_rect_image(80, 60, [20, 15], [40, 30], 200, 0);
        img.put_pixel(40, 30, Luma([0]));

        let raw = Silhouette::threshold(&img, 60);
        let closed = raw.clone().closed(2);
        assert_eq!(raw.foreground_count(), 40 * 30 - 1);
        assert_eq!(closed.foreground_count(), 40 * 30);
    }

    #[test]
    fn empty_image_has_no_foreground() {
        let img = GrayImage::new(32, 32);
        let s = Silhouette::from_gray(&img, 60, 2);
        assert!(s.is_empty());
    }

    #[test]
    fn blob_mask_keeps_only_selected_component() {
        let mut img = draw_rect_image(120, 80, [10, 10], [50, 30], 255, 0);
        for y in 50..60 {
            for x in 80..90 {
                img.put_pixel(x, y, Luma([255]));
            }
        }
        let s = Silhouette::from_gray(&img, 60, 2);
        let geom = s.analyze();
        let mask = s.blob_mask(&geom);

        let count = mask.pixels().filter(|p| p[0] == FOREGROUND).count();
        assert_eq!(count, 50 * 30);
        assert_eq!(mask.get_pixel(85, 55)[0], 0);
    }

    #[test]
    fn blob_mask_of_sentinel_is_empty() {
        let img = GrayImage::new(16, 16);
        let s = Silhouette::from_gray(&img, 60, 2);
        let geom = s.analyze();
        let mask = s.blob_mask(&geom);
        assert!(mask.pixels().all(|p| p[0] == 0));
    }
}
