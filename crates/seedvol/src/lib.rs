//! seedvol — two-view silhouette measurement of small seeds.
//!
//! Each object is photographed from above and from the side. The stages are:
//!
//! 1. **Silhouette** – binary threshold and morphological closing.
//! 2. **Blob** – largest outer contour and its minimum-area rectangle
//!    (length, width, angle, center, area).
//! 3. **Calibration** – top-view scale plus a distance-dependent side-view
//!    scale derived from the camera geometry.
//! 4. **Validity** – plausibility rules on border contact, area and angle.
//! 5. **Profile** – per-column vertical extents of the aligned top and
//!    length-matched side silhouettes.
//! 6. **Volume** – sum of elliptical slices built from the paired extents.
//!
//! # Public API
//! - [`Measurer`] and [`CalibrationModel`] as the primary entry points
//! - [`discover_pairs`] / [`run_batch`] for directory processing
//! - the individual stages for callers that need intermediate results

mod align;
mod batch;
mod blob;
mod calibration;
mod color;
mod error;
mod pipeline;
mod profile;
mod silhouette;
mod validity;
mod volume;

#[cfg(test)]
mod test_utils;

pub use align::{needs_rotation, resample_length, rotate_to_axis};
pub use batch::{discover_pairs, run_batch, side_path_for, ImagePair, LoadedPair};
pub use blob::{analyze, BlobContour, BlobGeometry};
pub use calibration::{calibrate_pixel_size, CalibrationModel, PixelScale, CM_PER_INCH};
pub use color::mean_rgb;
pub use error::{Result, SeedvolError};
pub use pipeline::{Measurer, ObjectViews, SeedMeasurement};
pub use profile::{column_extents, CrossSectionProfile};
pub use silhouette::{Silhouette, FOREGROUND};
pub use validity::{
    check as check_validity, contour_touches_edge, ValidityFlag, ValidityFlags,
    ValidityThresholds,
};
pub use volume::{ellipse_area, integrate_volume, VolumeEstimate};
