//! Crop refinement orchestrator.
//!
//! When a scene contains several regions, or a region whose own label is an
//! umbrella term ("food"), each bounding box is cropped out of the source
//! image and resubmitted through the same ingestion interface. Refinement
//! depth is fixed at one: crop passes run the candidate stages only and are
//! never themselves refined, so network calls stay bounded by the number of
//! top-level objects. One crop failing is logged and omitted; it never
//! aborts the pass.

use futures_util::future::{join_all, BoxFuture};

use crate::config::DetectionConfig;
use crate::pipeline::detect::gather_survivors;
use crate::pipeline::filter::is_umbrella;
use crate::pipeline::normalize::normalize;
use crate::pipeline::score::{merge_candidates, Candidate};
use crate::pipeline::signal::{BoundingBox, RawSignal};
use crate::vision::VisionError;

/// Crop collaborator: extract a region of a source image, returning the URI
/// of the cropped image.
pub trait ImageCropper: Send + Sync {
    fn crop(&self, uri: &str, region: &BoundingBox) -> Result<String, VisionError>;
}

/// Vision collaborator: submit an image for analysis.
pub trait VisionAnalyzer: Send + Sync {
    fn analyze<'a>(&'a self, uri: &'a str) -> BoxFuture<'a, Result<RawSignal, VisionError>>;
}

/// Whether a signal warrants crop refinement: more than one detected region,
/// or any region whose own label is an umbrella term.
pub fn needs_refinement(signal: &RawSignal) -> bool {
    if signal.objects.len() > 1 {
        return true;
    }
    signal
        .objects
        .iter()
        .any(|object| object.tags.iter().any(|tag| is_umbrella(&normalize(&tag.name))))
}

/// Re-analyze every detected region and return the merged crop candidates
/// plus their pre-filter token names (for the meat fallback).
///
/// Per-region calls run concurrently; the merge is keyed by token and
/// commutative, so arrival order never changes the result.
pub(crate) async fn refine_with_crops(
    uri: &str,
    signal: &RawSignal,
    cropper: &dyn ImageCropper,
    analyzer: &dyn VisionAnalyzer,
    config: &DetectionConfig,
) -> (Vec<Candidate>, Vec<String>) {
    let regions: Vec<BoundingBox> = signal
        .objects
        .iter()
        .map(|object| object.bounding_box)
        .filter(|bbox| !bbox.is_empty())
        .collect();

    tracing::debug!(regions = regions.len(), "Refining detected regions");
    let passes = join_all(
        regions
            .iter()
            .map(|region| analyze_region(uri, *region, cropper, analyzer, config)),
    )
    .await;

    let mut candidates: Vec<Candidate> = Vec::new();
    let mut names: Vec<String> = Vec::new();
    for (crop_candidates, crop_names) in passes.into_iter().flatten() {
        candidates = merge_candidates(candidates, crop_candidates);
        names.extend(crop_names);
    }

    tracing::debug!(
        merged = candidates.len(),
        "Crop refinement merged candidates"
    );
    (candidates, names)
}

/// One crop pass: crop, re-analyze, run the candidate stages. Depth is fixed
/// at one, so this never triggers further refinement. Any failure is
/// absorbed here.
async fn analyze_region(
    uri: &str,
    region: BoundingBox,
    cropper: &dyn ImageCropper,
    analyzer: &dyn VisionAnalyzer,
    config: &DetectionConfig,
) -> Option<(Vec<Candidate>, Vec<String>)> {
    let crop_uri = match cropper.crop(uri, &region) {
        Ok(crop_uri) => crop_uri,
        Err(e) => {
            tracing::warn!(?region, error = %e, "Crop failed, omitting region");
            return None;
        }
    };

    let crop_signal = match analyzer.analyze(&crop_uri).await {
        Ok(signal) => signal,
        Err(e) => {
            tracing::warn!(?region, error = %e, "Crop re-analysis failed, omitting region");
            return None;
        }
    };

    let (mut candidates, names) = gather_survivors(&crop_signal, config);
    for candidate in &mut candidates {
        // Tie every crop candidate back to the region it came from.
        if !candidate.bounding_boxes.contains(&region) {
            candidate.bounding_boxes.push(region);
        }
    }
    Some((candidates, names))
}
