//! Elliptical-slice Riemann sum.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use crate::profile::CrossSectionProfile;
use crate::validity::ValidityFlags;

/// Area of an ellipse given its two full axes (diameters).
pub fn ellipse_area(a: f64, b: f64) -> f64 {
    PI * (0.5 * a) * (0.5 * b)
}

/// `Σ π·(top_i/2)·(side_i/2)·top_scale·side_scale·dz` over the common prefix.
///
/// Diameters are in pixels; `top_scale` / `side_scale` convert them to
/// physical length and `dz` is the physical thickness of one slice (the
/// top-view scale, since positions are top-view columns).
pub fn integrate_volume(
    profile: &CrossSectionProfile,
    top_scale: f64,
    side_scale: f64,
    dz: f64,
) -> f64 {
    profile
        .pairs()
        .map(|(top, side)| ellipse_area(top, side) * top_scale * side_scale * dz)
        .sum()
}

/// Volume of one object with the rule outcome that produced it.
///
/// `volume_cm3 == 0.0` whenever `flags` is non-empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolumeEstimate {
    pub volume_cm3: f64,
    pub flags: ValidityFlags,
}

impl VolumeEstimate {
    pub fn computed(volume_cm3: f64) -> Self {
        Self {
            volume_cm3,
            flags: ValidityFlags::new(),
        }
    }

    pub fn rejected(flags: ValidityFlags) -> Self {
        Self {
            volume_cm3: 0.0,
            flags,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.flags.is_valid()
    }
}
