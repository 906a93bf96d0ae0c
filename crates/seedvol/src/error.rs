//! Error type for fatal (batch-aborting) failures.
//!
//! Per-object geometric problems are never errors: they surface as
//! sentinel geometry or [`crate::ValidityFlags`] on the output record.

use std::path::PathBuf;

use thiserror::Error;

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, SeedvolError>;

#[derive(Error, Debug)]
pub enum SeedvolError {
    /// Calibration model failed eager validation.
    #[error("invalid calibration: {reason}")]
    InvalidCalibration { reason: String },

    /// File-system access failed.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Image could not be opened or decoded.
    #[error("failed to load image {}: {source}", path.display())]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// Configuration JSON could not be parsed or written.
    #[error("JSON error on {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A top-view image has no matching side-view image.
    #[error("no side image found for {}", top.display())]
    MissingSideImage { top: PathBuf },

    /// Pixel-size calibration found no reference rectangle.
    #[error("no reference object detected in calibration image")]
    NoReferenceObject,

    /// Invalid input parameter.
    #[error("invalid parameter: {parameter} = {value}")]
    InvalidParameter { parameter: String, value: String },
}

impl SeedvolError {
    pub(crate) fn invalid_calibration(reason: impl Into<String>) -> Self {
        Self::InvalidCalibration {
            reason: reason.into(),
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn image(path: impl Into<PathBuf>, source: image::ImageError) -> Self {
        Self::Image {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn json(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Self::Json {
            path: path.into(),
            source,
        }
    }
}
