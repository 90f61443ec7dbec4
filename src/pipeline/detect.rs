//! Pipeline entry points: single-pick selection and multi-pick extraction.
//!
//! `pick_best_one` is the pure, synchronous path used when one photographed
//! item needs one name. `detect_ingredients` is the full async path: it
//! calls the vision provider, runs the same stages, and additionally fans
//! out over detected regions via crop refinement. Both treat an empty
//! result as a normal outcome, not a failure.

use serde::Serialize;

use crate::config::DetectionConfig;
use crate::pipeline::category::disambiguate;
use crate::pipeline::filter::is_generic;
use crate::pipeline::meat::resolve_meat_fallback;
use crate::pipeline::refine::{needs_refinement, refine_with_crops, ImageCropper, VisionAnalyzer};
use crate::pipeline::score::{collect_candidates, merge_candidates, rank, Candidate, SourceGroup};
use crate::pipeline::signal::{BoundingBox, RawSignal};
use crate::pipeline::DetectionError;

/// One detected ingredient, ready for the pantry-confirmation UI.
#[derive(Debug, Clone, Serialize)]
pub struct Detection {
    pub name: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub bounding_boxes: Vec<BoundingBox>,
}

/// Score a signal and apply the disqualification rules, returning the
/// surviving candidates along with every pre-filter token name (the meat
/// fallback scores against the latter).
///
/// Disqualified: tokens sourced exclusively from captions, and generic
/// tokens. Length and score floors were already applied during collection.
pub(crate) fn gather_survivors(
    signal: &RawSignal,
    config: &DetectionConfig,
) -> (Vec<Candidate>, Vec<String>) {
    let collected = collect_candidates(signal, config);
    let pre_filter_names: Vec<String> = collected.iter().map(|c| c.token.clone()).collect();

    let survivors = collected
        .into_iter()
        .filter(|c| {
            !(c.sources.len() == 1 && c.sources.contains(&SourceGroup::Caption))
        })
        .filter(|c| !is_generic(&c.token))
        .collect();

    (survivors, pre_filter_names)
}

/// Reduce a signal to at most one ingredient token, with default tuning.
///
/// Returns `None` for empty input, all-generic input, or a top candidate
/// below the sole-pick threshold. Never errors: malformed fields were
/// already recovered as empty during deserialization.
pub fn pick_best_one(signal: &RawSignal) -> Option<String> {
    pick_best_one_with(signal, &DetectionConfig::default())
}

/// `pick_best_one` with explicit tuning. Runs every stage except crop
/// refinement; pure function of its arguments.
pub fn pick_best_one_with(signal: &RawSignal, config: &DetectionConfig) -> Option<String> {
    let (survivors, pre_filter_names) = gather_survivors(signal, config);
    let mut survivors = disambiguate(survivors);
    survivors.sort_by(rank);

    match survivors.first() {
        Some(top) if top.score >= config.core_threshold => {
            tracing::debug!(token = %top.token, score = top.score, "Single pick");
            Some(top.token.clone())
        }
        Some(top) => {
            tracing::debug!(
                token = %top.token,
                score = top.score,
                "Top candidate below sole-pick threshold"
            );
            None
        }
        None => resolve_meat_fallback(&pre_filter_names, &signal.tags, &signal.captions),
    }
}

/// Detect every distinct ingredient in an image, with default tuning.
pub async fn detect_ingredients(
    uri: &str,
    analyzer: &dyn VisionAnalyzer,
    cropper: &dyn ImageCropper,
) -> Result<Vec<Detection>, DetectionError> {
    detect_ingredients_with(uri, analyzer, cropper, &DetectionConfig::default()).await
}

/// Full multi-pick path: provider call, candidate stages, crop refinement,
/// disambiguation. The result is ordered by descending score and keeps
/// distinct same-category ingredients when spatial evidence supports them.
///
/// Only the initial provider call can fail; crop-level failures are absorbed
/// inside refinement.
pub async fn detect_ingredients_with(
    uri: &str,
    analyzer: &dyn VisionAnalyzer,
    cropper: &dyn ImageCropper,
    config: &DetectionConfig,
) -> Result<Vec<Detection>, DetectionError> {
    tracing::debug!(uri = %uri, "Starting ingredient detection");
    let signal = analyzer.analyze(uri).await?;
    let (mut survivors, mut pre_filter_names) = gather_survivors(&signal, config);

    if needs_refinement(&signal) {
        let (crop_candidates, crop_names) =
            refine_with_crops(uri, &signal, cropper, analyzer, config).await;
        survivors = merge_candidates(survivors, crop_candidates);
        pre_filter_names.extend(crop_names);
    }

    let mut survivors = disambiguate(survivors);
    survivors.sort_by(rank);

    if survivors.is_empty() {
        let fallback = resolve_meat_fallback(&pre_filter_names, &signal.tags, &signal.captions);
        return Ok(fallback
            .map(|name| {
                vec![Detection {
                    name,
                    bounding_boxes: vec![],
                }]
            })
            .unwrap_or_default());
    }

    tracing::info!(count = survivors.len(), "Detection complete");
    Ok(survivors
        .into_iter()
        .map(|c| Detection {
            name: c.token,
            bounding_boxes: c.bounding_boxes,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::signal::{Caption, DetectedObject, Tag};
    use futures_util::future::BoxFuture;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn tag(name: &str, confidence: f32) -> Tag {
        Tag {
            name: name.to_string(),
            confidence,
        }
    }

    fn caption(text: &str, confidence: f32) -> Caption {
        Caption {
            text: text.to_string(),
            confidence,
        }
    }

    fn object(tags: Vec<Tag>, bbox: BoundingBox) -> DetectedObject {
        DetectedObject {
            tags,
            bounding_box: bbox,
            confidence: None,
        }
    }

    // ── pick_best_one ──────────────────────────────────────

    #[test]
    fn empty_signal_picks_nothing() {
        assert_eq!(pick_best_one(&RawSignal::default()), None);
    }

    #[test]
    fn all_fields_absent_picks_nothing() {
        let signal = RawSignal::from_provider_json(serde_json::json!({}));
        assert_eq!(pick_best_one(&signal), None);
    }

    #[test]
    fn generic_only_input_picks_nothing() {
        let signal = RawSignal {
            tags: vec![tag("food", 0.95), tag("produce", 0.9), tag("vegetable", 0.85)],
            captions: vec![caption("fresh produce close up", 0.8)],
            ..Default::default()
        };
        assert_eq!(pick_best_one(&signal), None);
    }

    #[test]
    fn strong_multi_group_chicken_scenario() {
        let signal = RawSignal {
            tags: vec![tag("chicken", 0.92), tag("meat", 0.78), tag("poultry", 0.65)],
            captions: vec![caption("a chicken on a plate", 0.8)],
            objects: vec![object(vec![tag("chicken", 0.88)], BoundingBox::new(4, 4, 60, 60))],
        };
        assert_eq!(pick_best_one(&signal).as_deref(), Some("chicken"));
    }

    #[test]
    fn caption_noise_never_beats_the_tagged_ingredient() {
        let signal = RawSignal {
            tags: vec![tag("chicken", 0.85)],
            captions: vec![caption("a fat chicken on the table", 0.9)],
            ..Default::default()
        };
        assert_eq!(pick_best_one(&signal).as_deref(), Some("chicken"));
    }

    #[test]
    fn caption_only_tokens_are_disqualified() {
        let signal = RawSignal {
            captions: vec![caption("a bright zucchini on a cutting board", 0.95)],
            ..Default::default()
        };
        // "zucchini" has no tag or object support.
        assert_eq!(pick_best_one(&signal), None);
    }

    #[test]
    fn red_meat_siblings_collapse_to_one() {
        let signal = RawSignal {
            tags: vec![tag("beef", 0.8), tag("mutton", 0.78), tag("pork", 0.75)],
            ..Default::default()
        };
        assert_eq!(pick_best_one(&signal).as_deref(), Some("beef"));
    }

    #[test]
    fn fish_parent_excluded_when_octopus_survives() {
        let signal = RawSignal {
            tags: vec![tag("octopus", 0.79), tag("fish", 0.68)],
            objects: vec![object(vec![tag("octopus", 0.82)], BoundingBox::new(0, 0, 50, 50))],
            ..Default::default()
        };
        assert_eq!(pick_best_one(&signal).as_deref(), Some("octopus"));
    }

    #[test]
    fn meat_tag_alone_falls_back_to_literal_meat() {
        let signal = RawSignal {
            tags: vec![tag("meat", 0.78)],
            ..Default::default()
        };
        assert_eq!(pick_best_one(&signal).as_deref(), Some("meat"));
    }

    #[test]
    fn raising_core_threshold_turns_pick_into_none() {
        let signal = RawSignal {
            tags: vec![tag("tomato", 0.9)],
            ..Default::default()
        };
        assert_eq!(pick_best_one(&signal).as_deref(), Some("tomato"));

        let strict = DetectionConfig {
            core_threshold: 0.95,
            ..Default::default()
        };
        assert_eq!(pick_best_one_with(&signal, &strict), None);
    }

    #[test]
    fn pick_is_deterministic() {
        let signal = RawSignal {
            tags: vec![tag("salmon", 0.8), tag("tuna", 0.8)],
            ..Default::default()
        };
        let first = pick_best_one(&signal);
        for _ in 0..10 {
            assert_eq!(pick_best_one(&signal), first);
        }
        // Equal evidence: lexical order decides.
        assert_eq!(first.as_deref(), Some("salmon"));
    }

    // ── detect_ingredients ─────────────────────────────────

    /// Analyzer returning canned signals per URI; anything else errors.
    struct MockAnalyzer {
        responses: HashMap<String, RawSignal>,
        calls: AtomicUsize,
    }

    impl MockAnalyzer {
        fn new(responses: Vec<(&str, RawSignal)>) -> Self {
            Self {
                responses: responses
                    .into_iter()
                    .map(|(k, v)| (k.to_string(), v))
                    .collect(),
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl VisionAnalyzer for MockAnalyzer {
        fn analyze<'a>(
            &'a self,
            uri: &'a str,
        ) -> BoxFuture<'a, Result<RawSignal, crate::vision::VisionError>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Box::pin(async move {
                self.responses
                    .get(uri)
                    .cloned()
                    .ok_or_else(|| crate::vision::VisionError::Connection(uri.to_string()))
            })
        }
    }

    /// Cropper that derives crop URIs from the region; optionally fails for
    /// one region to exercise failure absorption.
    struct MockCropper {
        fail_region: Option<BoundingBox>,
    }

    impl ImageCropper for MockCropper {
        fn crop(
            &self,
            uri: &str,
            region: &BoundingBox,
        ) -> Result<String, crate::vision::VisionError> {
            if self.fail_region.as_ref() == Some(region) {
                return Err(crate::vision::VisionError::InvalidRegion(*region));
            }
            Ok(format!("{uri}#crop-{}-{}", region.x, region.y))
        }
    }

    fn tag_signal(entries: &[(&str, f32)]) -> RawSignal {
        RawSignal {
            tags: entries.iter().map(|(n, c)| tag(n, *c)).collect(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn single_region_scene_skips_refinement() {
        let outer = RawSignal {
            tags: vec![tag("tomato", 0.9)],
            objects: vec![object(vec![tag("tomato", 0.88)], BoundingBox::new(0, 0, 40, 40))],
            ..Default::default()
        };
        let analyzer = MockAnalyzer::new(vec![("img.jpg", outer)]);
        let cropper = MockCropper { fail_region: None };

        let detections = detect_ingredients("img.jpg", &analyzer, &cropper)
            .await
            .unwrap();
        assert_eq!(detections.len(), 1);
        assert_eq!(detections[0].name, "tomato");
        assert_eq!(detections[0].bounding_boxes, vec![BoundingBox::new(0, 0, 40, 40)]);
        assert_eq!(analyzer.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn crop_refinement_discovers_region_ingredients() {
        let box_a = BoundingBox::new(0, 0, 50, 50);
        let box_b = BoundingBox::new(100, 0, 50, 50);
        let outer = RawSignal {
            tags: vec![tag("food", 0.9)],
            objects: vec![
                object(vec![tag("food", 0.8)], box_a),
                object(vec![tag("food", 0.8)], box_b),
            ],
            ..Default::default()
        };
        let analyzer = MockAnalyzer::new(vec![
            ("img.jpg", outer),
            ("img.jpg#crop-0-0", tag_signal(&[("tomato", 0.9)])),
            ("img.jpg#crop-100-0", tag_signal(&[("mushroom", 0.85)])),
        ]);
        let cropper = MockCropper { fail_region: None };

        let detections = detect_ingredients("img.jpg", &analyzer, &cropper)
            .await
            .unwrap();
        let mut names: Vec<&str> = detections.iter().map(|d| d.name.as_str()).collect();
        names.sort_unstable();
        assert_eq!(names, vec!["mushroom", "tomato"]);
        // Outer call plus one per region.
        assert_eq!(analyzer.calls.load(Ordering::SeqCst), 3);

        let tomato = detections.iter().find(|d| d.name == "tomato").unwrap();
        assert!(tomato.bounding_boxes.contains(&box_a));
    }

    #[tokio::test]
    async fn failed_crop_is_omitted_not_fatal() {
        let box_a = BoundingBox::new(0, 0, 50, 50);
        let box_b = BoundingBox::new(100, 0, 50, 50);
        let outer = RawSignal {
            objects: vec![
                object(vec![tag("food", 0.8)], box_a),
                object(vec![tag("food", 0.8)], box_b),
            ],
            ..Default::default()
        };
        let analyzer = MockAnalyzer::new(vec![
            ("img.jpg", outer),
            ("img.jpg#crop-100-0", tag_signal(&[("shrimp", 0.9)])),
        ]);
        let cropper = MockCropper {
            fail_region: Some(box_a),
        };

        let detections = detect_ingredients("img.jpg", &analyzer, &cropper)
            .await
            .unwrap();
        assert_eq!(detections.len(), 1);
        assert_eq!(detections[0].name, "shrimp");
    }

    #[tokio::test]
    async fn same_category_regions_stay_distinct_with_disjoint_boxes() {
        let box_a = BoundingBox::new(0, 0, 50, 50);
        let box_b = BoundingBox::new(200, 0, 50, 50);
        let outer = RawSignal {
            objects: vec![
                object(vec![tag("food", 0.8)], box_a),
                object(vec![tag("food", 0.8)], box_b),
            ],
            ..Default::default()
        };
        let analyzer = MockAnalyzer::new(vec![
            ("img.jpg", outer),
            ("img.jpg#crop-0-0", tag_signal(&[("beef", 0.85)])),
            ("img.jpg#crop-200-0", tag_signal(&[("pork", 0.8)])),
        ]);
        let cropper = MockCropper { fail_region: None };

        let detections = detect_ingredients("img.jpg", &analyzer, &cropper)
            .await
            .unwrap();
        let mut names: Vec<&str> = detections.iter().map(|d| d.name.as_str()).collect();
        names.sort_unstable();
        assert_eq!(names, vec!["beef", "pork"]);
    }

    #[tokio::test]
    async fn results_are_ordered_by_descending_score() {
        let outer = RawSignal {
            tags: vec![tag("tomato", 0.95), tag("mushroom", 0.7)],
            ..Default::default()
        };
        let analyzer = MockAnalyzer::new(vec![("img.jpg", outer)]);
        let cropper = MockCropper { fail_region: None };

        let detections = detect_ingredients("img.jpg", &analyzer, &cropper)
            .await
            .unwrap();
        let names: Vec<&str> = detections.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["tomato", "mushroom"]);
    }

    #[tokio::test]
    async fn initial_analyze_failure_is_an_error() {
        let analyzer = MockAnalyzer::new(vec![]);
        let cropper = MockCropper { fail_region: None };
        let result = detect_ingredients("missing.jpg", &analyzer, &cropper).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn empty_scene_yields_empty_list() {
        let analyzer = MockAnalyzer::new(vec![("img.jpg", RawSignal::default())]);
        let cropper = MockCropper { fail_region: None };
        let detections = detect_ingredients("img.jpg", &analyzer, &cropper)
            .await
            .unwrap();
        assert!(detections.is_empty());
    }
}
