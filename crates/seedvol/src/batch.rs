//! Directory batch runner: pair `TopImage*` files with their side views and
//! measure each pair in order.

use std::fs;
use std::path::{Path, PathBuf};

use image::{GrayImage, RgbImage};

use crate::error::{Result, SeedvolError};
use crate::pipeline::{Measurer, ObjectViews, SeedMeasurement};

const TOP_PREFIX: &str = "TopImage";
const SIDE_NAMES: [&str; 2] = ["SideImage", "Side"];

/// Matching top and side image files for one object.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ImagePair {
    pub top: PathBuf,
    pub side: PathBuf,
}

/// Side-view path for a top-view file: `TopImage` in the file name becomes
/// `SideImage`, falling back to `Side`. `None` if neither file exists.
pub fn side_path_for(top: &Path) -> Option<PathBuf> {
    let name = top.file_name()?.to_str()?;
    SIDE_NAMES
        .iter()
        .map(|side| top.with_file_name(name.replacen(TOP_PREFIX, side, 1)))
        .find(|p| p.is_file())
}

/// Every `TopImage*` file in `dir`, sorted by name, with its side view.
pub fn discover_pairs(dir: &Path) -> Result<Vec<ImagePair>> {
    let entries = fs::read_dir(dir).map_err(|e| SeedvolError::io(dir, e))?;

    let mut tops = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| SeedvolError::io(dir, e))?;
        let path = entry.path();
        let is_top = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with(TOP_PREFIX));
        if is_top && path.is_file() {
            tops.push(path);
        }
    }
    tops.sort();

    let pairs = tops
        .into_iter()
        .map(|top| match side_path_for(&top) {
            Some(side) => Ok(ImagePair { top, side }),
            None => Err(SeedvolError::MissingSideImage { top }),
        })
        .collect::<Result<Vec<_>>>()?;

    tracing::info!(dir = %dir.display(), pairs = pairs.len(), "discovered image pairs");
    Ok(pairs)
}

/// Decoded images for one pair.
#[derive(Debug, Clone)]
pub struct LoadedPair {
    pub top_gray: GrayImage,
    pub top_color: RgbImage,
    pub side_gray: GrayImage,
}

impl LoadedPair {
    pub fn load(pair: &ImagePair) -> Result<Self> {
        let top = image::open(&pair.top).map_err(|e| SeedvolError::image(&pair.top, e))?;
        let side = image::open(&pair.side).map_err(|e| SeedvolError::image(&pair.side, e))?;
        Ok(Self {
            top_gray: top.to_luma8(),
            top_color: top.to_rgb8(),
            side_gray: side.to_luma8(),
        })
    }

    pub fn views(&self) -> ObjectViews<'_> {
        ObjectViews::new(&self.top_gray, &self.side_gray).with_color(&self.top_color)
    }
}

/// Measure every pair in order; one record per pair, including objects
/// that were not detected or were flagged. Fails on the first unreadable
/// image.
pub fn run_batch(measurer: &Measurer, pairs: &[ImagePair]) -> Result<Vec<SeedMeasurement>> {
    let mut records = Vec::with_capacity(pairs.len());
    for (index, pair) in pairs.iter().enumerate() {
        let loaded = LoadedPair::load(pair)?;
        let mut record = measurer.measure(&loaded.views());
        record.index = index;
        record.top_path = Some(pair.top.clone());
        record.side_path = Some(pair.side.clone());

        tracing::info!(
            index,
            top = %pair.top.display(),
            length_cm = record.length_cm,
            width_cm = record.width_cm,
            volume_cm3 = record.volume_cm3,
            flags = %record.flags,
            "object measured"
        );
        records.push(record);
    }

    let flagged = records.iter().filter(|r| !r.is_valid()).count();
    tracing::info!(total = records.len(), flagged, "batch complete");
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calibration::CalibrationModel;
    use crate::test_utils::draw_rect_image;

    fn scratch_dir() -> tempfile::TempDir {
        tempfile::tempdir().expect("create temp dir")
    }

    fn save(img: &GrayImage, dir: &Path, name: &str) {
        img.save(dir.join(name)).expect("save png");
    }

    fn unit_measurer() -> Measurer {
        Measurer::new(CalibrationModel {
            top_scale_cm_per_px: 1.0,
            side_scale_slope: 0.0,
            side_scale_intercept: 1.0,
            ..CalibrationModel::default()
        })
        .expect("valid calibration")
    }

    #[test]
    fn discovers_sorted_pairs_with_side_fallback() {
        let tmp = scratch_dir();
        let dir = tmp.path();
        let img = GrayImage::new(4, 4);
        save(&img, dir, "TopImage2.png");
        save(&img, dir, "SideImage2.png");
        save(&img, dir, "TopImage1.png");
        save(&img, dir, "Side1.png");
        save(&img, dir, "notes.png");

        let pairs = discover_pairs(dir).expect("discover");
        assert_eq!(
            pairs,
            vec![
                ImagePair {
                    top: dir.join("TopImage1.png"),
                    side: dir.join("Side1.png"),
                },
                ImagePair {
                    top: dir.join("TopImage2.png"),
                    side: dir.join("SideImage2.png"),
                },
            ]
        );
    }

    #[test]
    fn missing_side_image_is_an_error() {
        let tmp = scratch_dir();
        let dir = tmp.path();
        save(&GrayImage::new(4, 4), dir, "TopImage7.png");

        let err = discover_pairs(dir).unwrap_err();
        assert!(matches!(err, SeedvolError::MissingSideImage { .. }));
    }

    #[test]
    fn missing_directory_is_an_io_error() {
        let tmp = scratch_dir();
        let dir = tmp.path().join("missing");
        assert!(matches!(
            discover_pairs(&dir),
            Err(SeedvolError::Io { .. })
        ));
    }

    #[test]
    fn one_record_per_pair_including_undetected_objects() {
        let tmp = scratch_dir();
        let dir = tmp.path();
        let top = draw_rect_image(300, 200, [100, 80], [100, 40], 255, 0);
        let side = draw_rect_image(300, 200, [100, 85], [100, 30], 255, 0);
        save(&top, dir, "TopImage1.png");
        save(&side, dir, "SideImage1.png");
        save(&GrayImage::new(300, 200), dir, "TopImage2.png");
        save(&side, dir, "SideImage2.png");
        save(&top, dir, "TopImage3.png");
        save(&side, dir, "SideImage3.png");

        let pairs = discover_pairs(dir).expect("discover");
        let records = run_batch(&unit_measurer(), &pairs).expect("batch");

        assert_eq!(records.len(), pairs.len());
        for (i, r) in records.iter().enumerate() {
            assert_eq!(r.index, i);
            assert_eq!(r.top_path.as_ref(), Some(&pairs[i].top));
        }
        assert!(records[0].is_valid());
        assert!(records[0].volume_cm3 > 0.0);
        assert!(!records[1].top_detected);
        assert_eq!(records[1].volume_cm3, 0.0);
        assert_eq!(records[0].volume_cm3, records[2].volume_cm3);
    }

    #[test]
    fn unreadable_image_aborts_the_batch() {
        let tmp = scratch_dir();
        let dir = tmp.path();
        fs::write(dir.join("TopImage1.png"), b"not a png").expect("write");
        fs::write(dir.join("SideImage1.png"), b"not a png").expect("write");

        let pairs = discover_pairs(dir).expect("discover");
        assert!(matches!(
            run_batch(&unit_measurer(), &pairs),
            Err(SeedvolError::Image { .. })
        ));
    }
}
