//! Per-object measurement pipeline.
//!
//! Wires the stages together for one top/side image pair:
//! silhouette -> blob geometry -> (alignment) -> validity -> profile -> volume.
//!
//! Geometric problems never abort a measurement: undetected blobs become
//! sentinel geometry and implausible ones are flagged with a zero volume.

mod measure;
mod result;

pub use result::SeedMeasurement;

use image::{GrayImage, RgbImage};

use crate::calibration::CalibrationModel;
use crate::error::Result;

/// Borrowed images for a single object.
#[derive(Debug, Clone, Copy)]
pub struct ObjectViews<'a> {
    /// Top view, grayscale.
    pub top_gray: &'a GrayImage,
    /// Top view in color, used only for the color summary.
    pub top_color: Option<&'a RgbImage>,
    /// Side view, grayscale.
    pub side_gray: &'a GrayImage,
}

impl<'a> ObjectViews<'a> {
    pub fn new(top_gray: &'a GrayImage, side_gray: &'a GrayImage) -> Self {
        Self {
            top_gray,
            top_color: None,
            side_gray,
        }
    }

    pub fn with_color(mut self, top_color: &'a RgbImage) -> Self {
        self.top_color = Some(top_color);
        self
    }
}

/// Validated calibration plus the per-object measurement entry point.
///
/// Holds only read-only configuration, so one instance can be shared
/// across threads.
#[derive(Debug, Clone)]
pub struct Measurer {
    calibration: CalibrationModel,
}

impl Measurer {
    /// Validate `calibration` and build a measurer.
    pub fn new(calibration: CalibrationModel) -> Result<Self> {
        calibration.validate()?;
        Ok(Self { calibration })
    }

    pub fn calibration(&self) -> &CalibrationModel {
        &self.calibration
    }

    /// Measure one object. The returned record has `index = 0` and no paths;
    /// the batch runner fills those in.
    pub fn measure(&self, views: &ObjectViews<'_>) -> SeedMeasurement {
        measure::run(&self.calibration, views)
    }
}
