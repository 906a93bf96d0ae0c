//! Largest-blob geometry: contour selection and oriented bounding box.

use image::GrayImage;
use imageproc::contours::{find_contours, BorderType, Contour};
use imageproc::geometry::min_area_rect;
use imageproc::point::Point;
use serde::{Deserialize, Serialize};

use crate::silhouette::Silhouette;

/// One traced boundary in pixel coordinates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobContour {
    pub points: Vec<[i32; 2]>,
    /// `true` for an outer border, `false` for a hole border.
    pub outer: bool,
}

impl From<&Contour<i32>> for BlobContour {
    fn from(c: &Contour<i32>) -> Self {
        Self {
            points: c.points.iter().map(|p| [p.x, p.y]).collect(),
            outer: matches!(c.border_type, BorderType::Outer),
        }
    }
}

impl BlobContour {
    /// Enclosed area (shoelace formula over the boundary polygon).
    pub fn area(&self) -> f64 {
        polygon_area(&self.points)
    }
}

/// Summary of the largest foreground region of one view.
///
/// Invariant: `length >= width`. When no foreground is found the geometry
/// is the sentinel (see [`BlobGeometry::sentinel`]).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlobGeometry {
    /// Longer side of the minimum-area rectangle (px).
    pub length: f64,
    /// Shorter side of the minimum-area rectangle (px).
    pub width: f64,
    /// Orientation of the length axis relative to the image x-axis, degrees in `(-90, 90]`.
    pub angle_deg: f64,
    /// Rectangle center `[x, y]` (px).
    pub center: [f64; 2],
    /// Area enclosed by the selected contour (px²).
    pub area: f64,
    /// All boundaries found, in traversal order.
    #[serde(skip)]
    pub contours: Vec<BlobContour>,
    /// Index of the selected (largest outer) contour in `contours`.
    pub selected: usize,
    /// `false` for the sentinel.
    pub detected: bool,
}

impl BlobGeometry {
    /// Degenerate geometry reported when a view has no foreground region.
    pub fn sentinel() -> Self {
        Self {
            length: 1.0,
            width: 1.0,
            angle_deg: 0.0,
            center: [1.0, 1.0],
            area: 1.0,
            contours: vec![BlobContour {
                points: vec![[1, 1]],
                outer: true,
            }],
            selected: 0,
            detected: false,
        }
    }

    pub fn selected_contour(&self) -> Option<&BlobContour> {
        self.contours.get(self.selected)
    }
}

/// Threshold, close and measure the largest blob of a grayscale view.
pub fn analyze(gray: &GrayImage, threshold: u8, closing_radius: u8) -> BlobGeometry {
    Silhouette::from_gray(gray, threshold, closing_radius).analyze()
}

impl Silhouette {
    /// Measure the largest-area outer contour of this silhouette.
    ///
    /// Ties keep the first contour in traversal order.
    pub fn analyze(&self) -> BlobGeometry {
        let raw = trace_contours(self.mask());
        if raw.is_empty() {
            tracing::debug!("no contours found, returning sentinel geometry");
            return BlobGeometry::sentinel();
        }

        let contours: Vec<BlobContour> = raw.iter().map(BlobContour::from).collect();
        let mut best: Option<(usize, f64)> = None;
        for (i, c) in contours.iter().enumerate() {
            if !c.outer {
                continue;
            }
            let area = c.area();
            match best {
                Some((_, largest)) if area <= largest => {}
                _ => best = Some((i, area)),
            }
        }
        let Some((selected, area)) = best else {
            return BlobGeometry::sentinel();
        };

        let rect = min_area_rect(&raw[selected].points);
        let corners = rect.map(|p: Point<i32>| [p.x as f64, p.y as f64]);
        let obb = OrientedBox::from_corners(&corners);

        BlobGeometry {
            length: obb.length,
            width: obb.width,
            angle_deg: obb.angle_deg,
            center: obb.center,
            area,
            contours,
            selected,
            detected: true,
        }
    }
}

/// Border following on a 1 px background-padded copy of `mask`, with points
/// shifted back to `mask` coordinates. Without the padding a blob touching
/// the image border is traced as a hole.
fn trace_contours(mask: &GrayImage) -> Vec<Contour<i32>> {
    let (w, h) = mask.dimensions();
    let mut padded = GrayImage::new(w + 2, h + 2);
    image::imageops::replace(&mut padded, mask, 1, 1);

    let mut contours = find_contours::<i32>(&padded);
    for c in &mut contours {
        for p in &mut c.points {
            p.x -= 1;
            p.y -= 1;
        }
    }
    contours
}

/// Length/width/angle/center derived from four consecutive rectangle corners.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct OrientedBox {
    pub length: f64,
    pub width: f64,
    pub angle_deg: f64,
    pub center: [f64; 2],
}

impl OrientedBox {
    /// Compare the two edge-midpoint distances; the longer one is the length
    /// axis and defines the angle.
    pub fn from_corners(c: &[[f64; 2]; 4]) -> Self {
        let mid = |p: [f64; 2], q: [f64; 2]| [0.5 * (p[0] + q[0]), 0.5 * (p[1] + q[1])];
        let m01 = mid(c[0], c[1]);
        let m12 = mid(c[1], c[2]);
        let m23 = mid(c[2], c[3]);
        let m30 = mid(c[3], c[0]);

        let axis1 = [m12[0] - m30[0], m12[1] - m30[1]];
        let axis2 = [m01[0] - m23[0], m01[1] - m23[1]];
        let d1 = axis1[0].hypot(axis1[1]);
        let d2 = axis2[0].hypot(axis2[1]);

        let (length, width, axis) = if d1 > d2 {
            (d1, d2, axis1)
        } else {
            (d2, d1, axis2)
        };

        let center = [
            0.25 * (c[0][0] + c[1][0] + c[2][0] + c[3][0]),
            0.25 * (c[0][1] + c[1][1] + c[2][1] + c[3][1]),
        ];

        Self {
            length,
            width,
            angle_deg: normalize_axis_angle(axis[1].atan2(axis[0]).to_degrees()),
            center,
        }
    }
}

/// Fold an undirected axis angle into `(-90, 90]`.
pub(crate) fn normalize_axis_angle(mut deg: f64) -> f64 {
    while deg > 90.0 {
        deg -= 180.0;
    }
    while deg <= -90.0 {
        deg += 180.0;
    }
    deg
}

fn polygon_area(points: &[[i32; 2]]) -> f64 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }
    let mut twice = 0i64;
    for i in 0..n {
        let [x0, y0] = points[i];
        let [x1, y1] = points[(i + 1) % n];
        twice += x0 as i64 * y1 as i64 - x1 as i64 * y0 as i64;
    }
    (twice as f64).abs() * 0.5
}
