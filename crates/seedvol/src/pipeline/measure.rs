//! Stage orchestration for [`super::Measurer::measure`].

use std::borrow::Cow;

use image::GrayImage;

use super::{ObjectViews, SeedMeasurement};
use crate::align::{needs_rotation, resample_length, rotate_to_axis};
use crate::blob::BlobGeometry;
use crate::calibration::CalibrationModel;
use crate::color::mean_rgb;
use crate::profile::CrossSectionProfile;
use crate::silhouette::Silhouette;
use crate::validity;
use crate::volume::{integrate_volume, VolumeEstimate};

/// Silhouette and its selected blob for one (possibly transformed) image.
#[derive(Debug, Clone)]
struct View<'a> {
    image: Cow<'a, GrayImage>,
    silhouette: Silhouette,
    geometry: BlobGeometry,
}

impl<'a> View<'a> {
    fn analyze(image: Cow<'a, GrayImage>, threshold: u8, closing_radius: u8) -> Self {
        let silhouette = Silhouette::from_gray(&image, threshold, closing_radius);
        let geometry = silhouette.analyze();
        Self {
            image,
            silhouette,
            geometry,
        }
    }

    fn blob_mask(&self) -> GrayImage {
        self.silhouette.blob_mask(&self.geometry)
    }

    /// Rotated and re-analyzed view when the blob is angled beyond
    /// `tolerance_deg`, otherwise a copy of `self`.
    fn aligned(&self, threshold: u8, closing_radius: u8, tolerance_deg: f64) -> View<'static> {
        if needs_rotation(&self.geometry, tolerance_deg) {
            let rotated = rotate_to_axis(&self.image, &self.geometry);
            View::analyze(Cow::Owned(rotated), threshold, closing_radius)
        } else {
            View {
                image: Cow::Owned(self.image.clone().into_owned()),
                silhouette: self.silhouette.clone(),
                geometry: self.geometry.clone(),
            }
        }
    }
}

pub(super) fn run(cal: &CalibrationModel, views: &ObjectViews<'_>) -> SeedMeasurement {
    let radius = cal.closing_radius_px;
    let [top_tol, side_tol] = cal.alignment_tolerance_deg;

    let top = View::analyze(Cow::Borrowed(views.top_gray), cal.top_threshold, radius);
    let side = View::analyze(Cow::Borrowed(views.side_gray), cal.side_threshold, radius);
    if !top.geometry.detected {
        tracing::warn!("no blob in top view, using sentinel geometry");
    }
    if !side.geometry.detected {
        tracing::warn!("no blob in side view, using sentinel geometry");
    }

    let top_aligned = top.aligned(cal.top_threshold, radius, top_tol);
    tracing::debug!(
        length = top.geometry.length,
        width = top.geometry.width,
        angle = top.geometry.angle_deg,
        aligned_length = top_aligned.geometry.length,
        "top view geometry"
    );

    let side_scale = cal.side_scale_factor(
        top.geometry.center,
        top.geometry.angle_deg,
        top_aligned.geometry.length,
    );

    let flags = validity::check(
        &top.geometry,
        &side.geometry,
        views.top_gray.dimensions(),
        views.side_gray.dimensions(),
        &cal.validity,
    );

    let estimate = if flags.is_valid() {
        VolumeEstimate::computed(profile_volume(cal, &top_aligned, &side, side_scale, side_tol))
    } else {
        tracing::warn!(flags = %flags, "object flagged, volume not computed");
        VolumeEstimate::rejected(flags)
    };

    let top_scale = cal.top_scale_cm_per_px;
    let length_cm = top.geometry.length * top_scale;
    let color_rgb = views
        .top_color
        .map(|rgb| mean_rgb(rgb, &top.blob_mask()))
        .unwrap_or([0.0; 3]);

    SeedMeasurement {
        index: 0,
        top_path: None,
        side_path: None,
        length_cm,
        width_cm: top.geometry.width * top_scale,
        height_cm: side.geometry.width * side_scale,
        height_ratio_method_cm: height_ratio_method(
            length_cm,
            &side.geometry,
            cal.camera_offset_angle_deg,
            top.geometry.angle_deg,
        ),
        color_rgb,
        volume_cm3: estimate.volume_cm3,
        angle_deg: top.geometry.angle_deg,
        side_scale_cm_per_px: side_scale,
        top_area_px: top.geometry.area,
        side_area_px: side.geometry.area,
        top_center_px: top.geometry.center,
        top_detected: top.geometry.detected,
        side_detected: side.geometry.detected,
        flags: estimate.flags.to_string(),
        flag_list: estimate.flags,
    }
}

/// Align the side view, stretch it to the aligned top length and integrate
/// the paired cross-section profile.
fn profile_volume(
    cal: &CalibrationModel,
    top_aligned: &View<'_>,
    side: &View<'_>,
    side_scale: f64,
    side_tol: f64,
) -> f64 {
    let radius = cal.closing_radius_px;
    let side_aligned = side.aligned(cal.side_threshold, radius, side_tol);

    let top_len = top_aligned.geometry.length;
    let side_len = side_aligned.geometry.length;
    if !(top_len > 0.0 && side_len > 0.0) {
        tracing::warn!(top_len, side_len, "degenerate blob length, volume set to zero");
        return 0.0;
    }

    let factor = top_len / side_len;
    let resampled = resample_length(&side_aligned.image, factor);
    let side_resampled = View::analyze(Cow::Owned(resampled), cal.side_threshold, radius);
    tracing::debug!(
        factor,
        side_length = side_resampled.geometry.length,
        side_width = side_resampled.geometry.width,
        "side view resampled"
    );

    let profile =
        CrossSectionProfile::from_masks(&top_aligned.blob_mask(), &side_resampled.blob_mask());
    let top_scale = cal.top_scale_cm_per_px;
    integrate_volume(&profile, top_scale, side_scale, top_scale)
}

/// Height from the side-view aspect ratio: the side length is corrected for
/// the camera tilt and the seed's top-view orientation, then matched to the
/// top-view length.
fn height_ratio_method(
    length_cm: f64,
    side: &BlobGeometry,
    camera_angle_deg: f64,
    top_angle_deg: f64,
) -> f64 {
    let angle_cor = (90.0 - camera_angle_deg) - top_angle_deg;
    let cos = angle_cor.to_radians().cos();
    if angle_cor == 90.0 || side.length == 0.0 || cos.abs() < 1e-12 {
        return 0.0;
    }
    let side_len_cor = side.length / cos;
    side.width * length_cm / side_len_cor
}
