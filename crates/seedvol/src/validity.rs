//! Plausibility rules evaluated before committing to a volume estimate.
//!
//! A failed rule never aborts processing: it is recorded as a
//! [`ValidityFlag`] and the object's volume is reported as zero.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::blob::{BlobContour, BlobGeometry};
use crate::error::{Result, SeedvolError};

/// One failed plausibility rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidityFlag {
    /// Selected top contour touches the image border (object truncated).
    TopContourConflictsEdge,
    /// Selected side contour touches the image border.
    SideContourConflictsEdge,
    TopAreaTooSmall,
    SideAreaTooSmall,
    TopAreaTooLarge,
    SideAreaTooLarge,
    /// Top-view orientation beyond the plausible maximum.
    AngleOverMaxError,
}

impl ValidityFlag {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::TopContourConflictsEdge => "top_contour_conflicts_edge",
            Self::SideContourConflictsEdge => "side_contour_conflicts_edge",
            Self::TopAreaTooSmall => "top_area_too_small",
            Self::SideAreaTooSmall => "side_area_too_small",
            Self::TopAreaTooLarge => "top_area_too_large",
            Self::SideAreaTooLarge => "side_area_too_large",
            Self::AngleOverMaxError => "angle_over_max_error",
        }
    }
}

impl fmt::Display for ValidityFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered set of failed rules. Empty means the object is plausible.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidityFlags(Vec<ValidityFlag>);

impl ValidityFlags {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a flag once; insertion order is kept.
    pub fn push(&mut self, flag: ValidityFlag) {
        if !self.0.contains(&flag) {
            self.0.push(flag);
        }
    }

    pub fn is_valid(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, flag: ValidityFlag) -> bool {
        self.0.contains(&flag)
    }

    pub fn iter(&self) -> impl Iterator<Item = ValidityFlag> + '_ {
        self.0.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Composite annotation: flag names joined with `-`.
impl fmt::Display for ValidityFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, flag) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("-")?;
            }
            f.write_str(flag.as_str())?;
        }
        Ok(())
    }
}

/// Thresholds for the plausibility rules (areas in px², angle in degrees).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidityThresholds {
    /// Top area at or below this is flagged as noise.
    pub top_area_min: f64,
    /// Top area at or above this is flagged as merged objects.
    pub top_area_max: f64,
    pub side_area_min: f64,
    pub side_area_max: f64,
    /// `|angle|` strictly above this is flagged.
    pub max_angle_deg: f64,
    /// Contour points within this many pixels of a border count as touching it.
    pub edge_margin_px: u32,
    /// Also apply the border rule to the side view.
    pub check_side_edges: bool,
}

impl Default for ValidityThresholds {
    fn default() -> Self {
        Self {
            top_area_min: 100.0,
            top_area_max: 40_000.0,
            side_area_min: 100.0,
            side_area_max: 16_000.0,
            max_angle_deg: 80.0,
            edge_margin_px: 1,
            check_side_edges: false,
        }
    }
}

impl ValidityThresholds {
    pub fn validate(&self) -> Result<()> {
        let values = [
            ("top_area_min", self.top_area_min),
            ("top_area_max", self.top_area_max),
            ("side_area_min", self.side_area_min),
            ("side_area_max", self.side_area_max),
            ("max_angle_deg", self.max_angle_deg),
        ];
        for (name, v) in values {
            if !v.is_finite() || v < 0.0 {
                return Err(SeedvolError::invalid_calibration(format!(
                    "validity.{name} must be finite and >= 0 (got {v})"
                )));
            }
        }
        if self.top_area_min >= self.top_area_max {
            return Err(SeedvolError::invalid_calibration(
                "validity.top_area_min must be < validity.top_area_max",
            ));
        }
        if self.side_area_min >= self.side_area_max {
            return Err(SeedvolError::invalid_calibration(
                "validity.side_area_min must be < validity.side_area_max",
            ));
        }
        Ok(())
    }
}

/// Evaluate every rule; `top_dims` / `side_dims` are the view sizes `(w, h)`.
pub fn check(
    top: &BlobGeometry,
    side: &BlobGeometry,
    top_dims: (u32, u32),
    side_dims: (u32, u32),
    thresholds: &ValidityThresholds,
) -> ValidityFlags {
    let mut flags = ValidityFlags::new();
    let margin = thresholds.edge_margin_px;

    if top
        .selected_contour()
        .is_some_and(|c| contour_touches_edge(c, top_dims, margin))
    {
        flags.push(ValidityFlag::TopContourConflictsEdge);
    }
    if thresholds.check_side_edges
        && side
            .selected_contour()
            .is_some_and(|c| contour_touches_edge(c, side_dims, margin))
    {
        flags.push(ValidityFlag::SideContourConflictsEdge);
    }
    if top.area <= thresholds.top_area_min {
        flags.push(ValidityFlag::TopAreaTooSmall);
    }
    if side.area <= thresholds.side_area_min {
        flags.push(ValidityFlag::SideAreaTooSmall);
    }
    if top.area >= thresholds.top_area_max {
        flags.push(ValidityFlag::TopAreaTooLarge);
    }
    if side.area >= thresholds.side_area_max {
        flags.push(ValidityFlag::SideAreaTooLarge);
    }
    if top.angle_deg.abs() > thresholds.max_angle_deg {
        flags.push(ValidityFlag::AngleOverMaxError);
    }
    flags
}

/// `true` when any contour point lies within `margin` pixels of the border.
pub fn contour_touches_edge(contour: &BlobContour, dims: (u32, u32), margin: u32) -> bool {
    let (w, h) = (dims.0 as i64, dims.1 as i64);
    let m = margin as i64;
    contour.points.iter().any(|&[x, y]| {
        let (x, y) = (x as i64, y as i64);
        x <= m || y <= m || x >= w - 1 - m || y >= h - 1 - m
    })
}
