use tracing::debug;

use crate::geometry::{Aoi, Coverage, coverage};
use crate::scene::Scene;
use crate::store::Store;

pub const DEFAULT_MIN_OVERLAP: f64 = 0.001;

pub fn filter_existing(scenes: Vec<Scene>, store: &Store) -> Vec<Scene> {
    scenes
        .into_iter()
        .filter(|scene| {
            let present = store.has_archive(&scene.title);
            if present {
                debug!("{} already downloaded", scene.archive_name());
            }
            !present
        })
        .collect()
}

pub fn filter_overlap(scenes: Vec<Scene>, aoi: &Aoi, min_overlap: f64) -> Vec<Scene> {
    scenes
        .into_iter()
        .filter_map(|mut scene| {
            let cov = coverage(aoi, scene.shape());
            let overlap = accepted_overlap(&cov, min_overlap)?;
            scene.overlap_percentage = Some(overlap * 100.0);
            Some(scene)
        })
        .collect()
}

/// Returns the overlap fraction (intersection / area of interest) when the
/// scene qualifies.
///
/// A scene qualifies when that fraction exceeds `min_overlap`, or when the
/// area of interest is larger than the footprint and the intersection covers
/// more than `min_overlap` of the footprint. Zero-area inputs never qualify.
pub fn accepted_overlap(cov: &Coverage, min_overlap: f64) -> Option<f64> {
    if !(cov.aoi_area > 0.0) || !(cov.footprint_area > 0.0) {
        return None;
    }
    let overlap = cov.intersection_area / cov.aoi_area;
    let aoi_larger = cov.aoi_area / cov.footprint_area > 1.0;
    let footprint_share = cov.intersection_area / cov.footprint_area;
    if overlap > min_overlap || (aoi_larger && footprint_share > min_overlap) {
        Some(overlap)
    } else {
        None
    }
}
