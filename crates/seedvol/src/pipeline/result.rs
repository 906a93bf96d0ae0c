use std::path::PathBuf;

use crate::validity::ValidityFlags;

/// Output record for one object.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SeedMeasurement {
    /// Position of the object in the batch.
    pub index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub side_path: Option<PathBuf>,
    /// Top-view blob length in cm.
    pub length_cm: f64,
    /// Top-view blob width in cm.
    pub width_cm: f64,
    /// Side-view blob width in cm.
    pub height_cm: f64,
    /// Height from the side-view aspect ratio and the top-view length.
    pub height_ratio_method_cm: f64,
    /// Mean `[R, G, B]` over the top-view blob; zeros without a color image.
    pub color_rgb: [f64; 3],
    /// Integrated volume; `0.0` when the object is flagged.
    pub volume_cm3: f64,
    /// Top-view orientation in degrees, (-90, 90].
    pub angle_deg: f64,
    /// Side-view scale used for this object.
    pub side_scale_cm_per_px: f64,
    pub top_area_px: f64,
    pub side_area_px: f64,
    pub top_center_px: [f64; 2],
    pub top_detected: bool,
    pub side_detected: bool,
    /// Composite flag string, empty when valid.
    pub flags: String,
    pub flag_list: ValidityFlags,
}

impl SeedMeasurement {
    pub fn is_valid(&self) -> bool {
        self.flag_list.is_valid()
    }
}
