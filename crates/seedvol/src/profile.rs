//! Per-position cross-section extents along the shared length axis.

use image::GrayImage;

/// Vertical foreground span (`max_y - min_y`) of every column that has
/// foreground, in ascending column order.
///
/// The mask must already be aligned so the object's length axis runs
/// along x.
pub fn column_extents(mask: &GrayImage) -> Vec<f64> {
    let (w, h) = mask.dimensions();
    let mut extents = Vec::new();
    for x in 0..w {
        let mut span: Option<(u32, u32)> = None;
        for y in 0..h {
            if mask.get_pixel(x, y)[0] == 0 {
                continue;
            }
            span = Some(match span {
                None => (y, y),
                Some((lo, _)) => (lo, y),
            });
        }
        if let Some((lo, hi)) = span {
            extents.push((hi - lo) as f64);
        }
    }
    extents
}

/// Paired diameters (px) of one object seen from the top and the side.
///
/// Both views are sampled at the same positions along the length axis; the
/// sequences may differ by a column or two after resampling, and only the
/// common prefix is used.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CrossSectionProfile {
    pub top: Vec<f64>,
    pub side: Vec<f64>,
}

impl CrossSectionProfile {
    pub fn new(top: Vec<f64>, side: Vec<f64>) -> Self {
        debug_assert!(top.iter().chain(side.iter()).all(|&d| d >= 0.0));
        Self { top, side }
    }

    /// Build from the aligned top mask and the length-resampled side mask.
    pub fn from_masks(top_mask: &GrayImage, side_mask: &GrayImage) -> Self {
        let profile = Self::new(column_extents(top_mask), column_extents(side_mask));
        if profile.top.len() != profile.side.len() {
            tracing::trace!(
                "profile length mismatch: top={} side={}, using {}",
                profile.top.len(),
                profile.side.len(),
                profile.len()
            );
        }
        profile
    }

    /// Number of usable positions (the shorter of the two sequences).
    pub fn len(&self) -> usize {
        self.top.len().min(self.side.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `(top, side)` diameter pairs over the common prefix.
    pub fn pairs(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.top.iter().copied().zip(self.side.iter().copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::draw_rect_image;
    use image::Luma;

    #[test]
    fn rectangle_has_constant_extent() {
        let mask = draw_rect_image(150, 80, [10, 20], [100, 40], 255, 0);
        let ext = column_extents(&mask);
        assert_eq!(ext.len(), 100);
        assert!(ext.iter().all(|&d| d == 39.0));
    }

    #[test]
    fn empty_columns_are_skipped() {
        let mut mask = GrayImage::new(10, 10);
        mask.put_pixel(2, 1, Luma([255]));
        mask.put_pixel(2, 6, Luma([255]));
        mask.put_pixel(7, 4, Luma([255]));
        assert_eq!(column_extents(&mask), vec![5.0, 0.0]);
    }

    #[test]
    fn extent_spans_interior_gaps() {
        let mut mask = GrayImage::new(4, 12);
        for y in [2, 3, 9, 10] {
            mask.put_pixel(1, y, Luma([255]));
        }
        assert_eq!(column_extents(&mask), vec![8.0]);
    }

    #[test]
    fn mismatched_views_use_shorter_prefix() {
        let top = draw_rect_image(150, 80, [10, 20], [100, 40], 255, 0);
        let side = draw_rect_image(150, 80, [10, 20], [98, 30], 255, 0);
        let p = CrossSectionProfile::from_masks(&top, &side);
        assert_eq!(p.top.len(), 100);
        assert_eq!(p.side.len(), 98);
        assert_eq!(p.len(), 98);
        assert_eq!(p.pairs().count(), 98);
        assert!(p.pairs().all(|(t, s)| t == 39.0 && s == 29.0));
    }
}
