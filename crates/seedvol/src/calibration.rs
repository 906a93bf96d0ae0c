//! Pixel-to-physical calibration for the two camera views.
//!
//! The top view has a spatially uniform scale. The side camera's
//! magnification depends on how far the object sits from its lens, so the
//! side scale is recomputed per object from the top-view position using a
//! linear distance model fitted offline.

use std::f64::consts::FRAC_PI_2;
use std::path::Path;

use image::GrayImage;
use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

use crate::blob;
use crate::error::{Result, SeedvolError};
use crate::validity::ValidityThresholds;

pub const CM_PER_INCH: f64 = 2.54;

/// Rig calibration and processing thresholds. Read-only during processing.
///
/// Missing JSON fields fall back to [`CalibrationModel::default`], the
/// January 2017 oat calibration of the reference rig.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationModel {
    /// Top-view scale (cm per pixel), assumed uniform over the frame.
    pub top_scale_cm_per_px: f64,
    /// Distance of the side camera center line from the top frame (inches).
    pub camera_offset_in: f64,
    /// Angle of the side camera center line to the top-frame x-axis (degrees).
    pub camera_offset_angle_deg: f64,
    /// Slope of the side scale model `scale = distance_in * slope + intercept`.
    pub side_scale_slope: f64,
    /// Intercept of the side scale model (cm per pixel).
    pub side_scale_intercept: f64,
    /// Column where the side camera center line crosses the bottom row of
    /// the (cropped) top frame.
    pub reference_intersect_x_px: f64,
    /// Raw top-frame size `[w, h]` before pre-processing crops.
    pub frame_size_px: [u32; 2],
    /// Pre-processing crop of the top frame `[left, top]`.
    pub top_crop_px: [u32; 2],
    /// Objects at or above this `|angle|` get the foreshortening correction.
    pub angled_correction_min_deg: f64,
    /// Binarization threshold of the top view.
    pub top_threshold: u8,
    /// Binarization threshold of the side view.
    pub side_threshold: u8,
    /// Half-size of the square closing element (2 → 5x5).
    pub closing_radius_px: u8,
    /// `[top, side]`: views are rotated onto the x-axis only above this `|angle|`.
    pub alignment_tolerance_deg: [f64; 2],
    pub validity: ValidityThresholds,
}

impl Default for CalibrationModel {
    fn default() -> Self {
        Self {
            top_scale_cm_per_px: 0.002934381,
            camera_offset_in: 1.6875,
            camera_offset_angle_deg: 83.5,
            side_scale_slope: 0.0015,
            side_scale_intercept: 0.0007,
            reference_intersect_x_px: 244.0,
            frame_size_px: [1920, 1080],
            top_crop_px: [300, 300],
            angled_correction_min_deg: 45.0,
            top_threshold: 60,
            side_threshold: 15,
            closing_radius_px: 2,
            alignment_tolerance_deg: [5.0, 6.0],
            validity: ValidityThresholds::default(),
        }
    }
}

impl CalibrationModel {
    /// Load a calibration model from a JSON file.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path).map_err(|e| SeedvolError::io(path, e))?;
        serde_json::from_str(&data).map_err(|e| SeedvolError::json(path, e))
    }

    /// Save the model as pretty-printed JSON.
    pub fn to_json_file(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).map_err(|e| SeedvolError::json(path, e))?;
        std::fs::write(path, json).map_err(|e| SeedvolError::io(path, e))
    }

    /// Eager configuration check, run once before any object is processed.
    pub fn validate(&self) -> Result<()> {
        let finite = [
            ("top_scale_cm_per_px", self.top_scale_cm_per_px),
            ("camera_offset_in", self.camera_offset_in),
            ("camera_offset_angle_deg", self.camera_offset_angle_deg),
            ("side_scale_slope", self.side_scale_slope),
            ("side_scale_intercept", self.side_scale_intercept),
            ("reference_intersect_x_px", self.reference_intersect_x_px),
            ("angled_correction_min_deg", self.angled_correction_min_deg),
            ("alignment_tolerance_deg[0]", self.alignment_tolerance_deg[0]),
            ("alignment_tolerance_deg[1]", self.alignment_tolerance_deg[1]),
        ];
        for (name, v) in finite {
            if !v.is_finite() {
                return Err(SeedvolError::invalid_calibration(format!(
                    "{name} must be finite (got {v})"
                )));
            }
        }

        if self.top_scale_cm_per_px <= 0.0 {
            return Err(SeedvolError::invalid_calibration(
                "top_scale_cm_per_px must be > 0",
            ));
        }
        if self.camera_offset_in < 0.0 {
            return Err(SeedvolError::invalid_calibration(
                "camera_offset_in must be >= 0",
            ));
        }
        if self.top_crop_px[0] >= self.frame_size_px[0]
            || self.top_crop_px[1] >= self.frame_size_px[1]
        {
            return Err(SeedvolError::invalid_calibration(format!(
                "top_crop_px {:?} must be smaller than frame_size_px {:?}",
                self.top_crop_px, self.frame_size_px
            )));
        }
        if !(0.0..=90.0).contains(&self.angled_correction_min_deg) {
            return Err(SeedvolError::invalid_calibration(
                "angled_correction_min_deg must be in [0, 90]",
            ));
        }
        if self.alignment_tolerance_deg.iter().any(|&t| t < 0.0) {
            return Err(SeedvolError::invalid_calibration(
                "alignment_tolerance_deg must be >= 0",
            ));
        }
        self.validity.validate()?;

        // An object sitting exactly on the camera line is the closest
        // possible case; the model must still give a usable scale there.
        let reference = [
            self.reference_intersect_x_px,
            self.cropped_bottom_row_px(),
        ];
        let scale = self.side_scale_factor(reference, 0.0, 0.0);
        if !scale.is_finite() || scale <= 0.0 {
            return Err(SeedvolError::invalid_calibration(format!(
                "side scale model yields {scale} at the reference point"
            )));
        }
        Ok(())
    }

    /// Bottom row of the cropped top frame, in cropped coordinates.
    pub fn cropped_bottom_row_px(&self) -> f64 {
        (self.frame_size_px[1] - self.top_crop_px[1]) as f64
    }

    /// Side-camera offset as a pixel-space vector in the top view.
    pub fn camera_offset_px(&self) -> Vector2<f64> {
        let len_px = self.camera_offset_in * CM_PER_INCH / self.top_scale_cm_per_px;
        let (s, c) = self.camera_offset_angle_deg.to_radians().sin_cos();
        Vector2::new(len_px * c, len_px * s)
    }

    /// Estimated lens-to-object distance of the side camera (inches).
    ///
    /// `center` is the object's top-view center in cropped pixel coordinates;
    /// `top_angle_deg` and `top_length_px` drive the foreshortening correction.
    pub fn camera_distance_in(
        &self,
        center: [f64; 2],
        top_angle_deg: f64,
        top_length_px: f64,
    ) -> f64 {
        let d = self.camera_offset_px().y;
        let to_object = Vector2::new(
            (center[0] - self.reference_intersect_x_px).abs(),
            (self.cropped_bottom_row_px() - center[1]).abs(),
        );
        let a = to_object.norm();
        let phi = to_object.y.atan2(to_object.x);

        // Law of cosines; the angle between the two sides is |phi| + 90°.
        let b_sq = a * a + d * d - 2.0 * a * d * (phi.abs() + FRAC_PI_2).cos();
        let b_px = b_sq.max(0.0).sqrt();
        let mut b_in = b_px * self.top_scale_cm_per_px / CM_PER_INCH;

        if top_angle_deg.abs() >= self.angled_correction_min_deg {
            b_in += 0.25 * top_length_px * self.top_scale_cm_per_px / CM_PER_INCH;
        }
        b_in
    }

    /// Linear distance model: side scale (cm/px) at `distance_in` inches.
    pub fn side_scale_from_distance(&self, distance_in: f64) -> f64 {
        distance_in * self.side_scale_slope + self.side_scale_intercept
    }

    /// Per-object side-view scale factor (cm/px).
    pub fn side_scale_factor(
        &self,
        center: [f64; 2],
        top_angle_deg: f64,
        top_length_px: f64,
    ) -> f64 {
        self.side_scale_from_distance(self.camera_distance_in(
            center,
            top_angle_deg,
            top_length_px,
        ))
    }
}

/// Scale factors measured from a reference rectangle of known size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PixelScale {
    pub length_cm_per_px: f64,
    pub width_cm_per_px: f64,
}

/// Measure cm/px from an image of a dark reference rectangle on a light
/// background. `model_length_cm` must be the longer side.
pub fn calibrate_pixel_size(
    gray: &GrayImage,
    threshold: u8,
    closing_radius: u8,
    model_length_cm: f64,
    model_width_cm: f64,
) -> Result<PixelScale> {
    if !(model_width_cm.is_finite() && model_width_cm > 0.0) {
        return Err(SeedvolError::InvalidParameter {
            parameter: "model_width_cm".to_string(),
            value: model_width_cm.to_string(),
        });
    }
    if !model_length_cm.is_finite() || model_length_cm < model_width_cm {
        return Err(SeedvolError::InvalidParameter {
            parameter: "model_length_cm".to_string(),
            value: model_length_cm.to_string(),
        });
    }

    let mut inverted = gray.clone();
    image::imageops::invert(&mut inverted);
    let geom = blob::analyze(&inverted, threshold, closing_radius);
    if !geom.detected || geom.width <= 0.0 {
        return Err(SeedvolError::NoReferenceObject);
    }

    tracing::debug!(
        "reference rectangle: {:.1}x{:.1}px at ({:.1}, {:.1})",
        geom.length,
        geom.width,
        geom.center[0],
        geom.center[1]
    );

    Ok(PixelScale {
        length_cm_per_px: model_length_cm / geom.length,
        width_cm_per_px: model_width_cm / geom.width,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::draw_rect_image;
    use approx::assert_abs_diff_eq;

    #[test]
    fn default_model_is_valid() {
        CalibrationModel::default().validate().unwrap();
    }

    #[test]
    fn object_on_camera_line_sits_at_offset_distance() {
        let cal = CalibrationModel::default();
        let reference = [cal.reference_intersect_x_px, cal.cropped_bottom_row_px()];
        let b = cal.camera_distance_in(reference, 0.0, 0.0);
        let expected = cal.camera_offset_in * cal.camera_offset_angle_deg.to_radians().sin();
        assert_abs_diff_eq!(b, expected, epsilon = 1e-9);
    }

    #[test]
    fn side_scale_is_monotonic_in_distance() {
        let cal = CalibrationModel::default();
        let bottom = cal.cropped_bottom_row_px();
        let near = [cal.reference_intersect_x_px, bottom - 100.0];
        let far = [cal.reference_intersect_x_px, bottom - 400.0];

        let b_near = cal.camera_distance_in(near, 0.0, 0.0);
        let b_far = cal.camera_distance_in(far, 0.0, 0.0);
        assert!(b_far > b_near);
        assert!(cal.side_scale_factor(far, 0.0, 0.0) > cal.side_scale_factor(near, 0.0, 0.0));

        let inverted = CalibrationModel {
            side_scale_slope: -0.0005,
            side_scale_intercept: 0.01,
            ..CalibrationModel::default()
        };
        assert!(
            inverted.side_scale_factor(far, 0.0, 0.0) < inverted.side_scale_factor(near, 0.0, 0.0)
        );
    }

    #[test]
    fn linear_model_applies_slope_and_intercept() {
        let cal = CalibrationModel::default();
        assert_abs_diff_eq!(cal.side_scale_from_distance(2.0), 2.0 * 0.0015 + 0.0007);
    }

    #[test]
    fn angled_objects_get_length_correction() {
        let cal = CalibrationModel::default();
        let center = [400.0, 500.0];
        let straight = cal.camera_distance_in(center, 44.9, 200.0);
        let angled = cal.camera_distance_in(center, -45.0, 200.0);
        let expected = 50.0 * cal.top_scale_cm_per_px / CM_PER_INCH;
        assert_abs_diff_eq!(angled - straight, expected, epsilon = 1e-12);
    }

    #[test]
    fn zero_horizontal_offset_does_not_divide_by_zero() {
        let cal = CalibrationModel::default();
        let center = [cal.reference_intersect_x_px, 200.0];
        assert!(cal.side_scale_factor(center, 0.0, 100.0).is_finite());
    }

    #[test]
    fn validation_rejects_bad_models() {
        let zero_scale = CalibrationModel {
            top_scale_cm_per_px: 0.0,
            ..CalibrationModel::default()
        };
        assert!(matches!(
            zero_scale.validate(),
            Err(SeedvolError::InvalidCalibration { .. })
        ));

        let nan_slope = CalibrationModel {
            side_scale_slope: f64::NAN,
            ..CalibrationModel::default()
        };
        assert!(nan_slope.validate().is_err());

        let bad_crop = CalibrationModel {
            top_crop_px: [300, 1080],
            ..CalibrationModel::default()
        };
        assert!(bad_crop.validate().is_err());

        let negative_scale = CalibrationModel {
            side_scale_slope: 0.0,
            side_scale_intercept: -0.001,
            ..CalibrationModel::default()
        };
        assert!(negative_scale.validate().is_err());
    }

    #[test]
    fn partial_json_fills_defaults() {
        let cal: CalibrationModel =
            serde_json::from_str(r#"{"top_scale_cm_per_px": 0.01, "validity": {"max_angle_deg": 70}}"#)
                .unwrap();
        assert_abs_diff_eq!(cal.top_scale_cm_per_px, 0.01);
        assert_eq!(cal.top_threshold, 60);
        assert_abs_diff_eq!(cal.validity.max_angle_deg, 70.0);
        assert_abs_diff_eq!(cal.validity.top_area_min, 100.0);
    }

    #[test]
    fn pixel_size_from_reference_rectangle() {
        let img = draw_rect_image(400, 300, [100, 100], [201, 101], 0, 255);
        let s = calibrate_pixel_size(&img, 60, 2, 2.0, 1.0).unwrap();
        assert_abs_diff_eq!(s.length_cm_per_px, 2.0 / 200.0, epsilon = 1e-12);
        assert_abs_diff_eq!(s.width_cm_per_px, 1.0 / 100.0, epsilon = 1e-12);
    }

    #[test]
    fn pixel_size_requires_a_reference() {
        let blank = GrayImage::from_pixel(64, 64, image::Luma([255]));
        assert!(matches!(
            calibrate_pixel_size(&blank, 60, 2, 2.0, 1.0),
            Err(SeedvolError::NoReferenceObject)
        ));
        assert!(matches!(
            calibrate_pixel_size(&blank, 60, 2, 1.0, 2.0),
            Err(SeedvolError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn inch_conversion_is_exported() {
        assert_eq!(crate::CM_PER_INCH, 2.54);
    }
}
