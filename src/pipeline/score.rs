//! Candidate model and composite scorer.
//!
//! One `Candidate` per distinct token, accumulated across the three feature
//! groups of a signal. The composite score is a weighted sum of the best
//! confidence seen per group, plus a cross-group bonus; entries below the
//! trust floor contribute nothing. Ordering is fully deterministic.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use crate::config::DetectionConfig;
use crate::pipeline::normalize::{caption_tokens, normalize};
use crate::pipeline::signal::{BoundingBox, RawSignal};

/// Which feature group a candidate was sourced from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SourceGroup {
    Tag,
    Caption,
    Object,
}

/// One candidate ingredient: a token plus its evidence from one pass.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub token: String,
    pub sources: BTreeSet<SourceGroup>,
    pub score: f32,
    /// Max trusted tag confidence, kept for tie-breaking.
    pub tag_confidence: f32,
    /// Boxes of every object whose tag list produced this token.
    pub bounding_boxes: Vec<BoundingBox>,
}

#[derive(Default)]
struct Accumulator {
    tag_conf: f32,
    caption_conf: f32,
    caption_occurrences: u32,
    object_conf: f32,
    sources: BTreeSet<SourceGroup>,
    boxes: Vec<BoundingBox>,
}

/// Build the scored candidate set for one signal.
///
/// Tag and object-tag entries below `confidence_min` are untrusted and
/// skipped entirely. Caption words carry their caption's confidence.
/// Candidates below `score_min` are dropped. Per-token normalization
/// failures (empty tokens) are skipped so one malformed entry never aborts
/// the rest.
pub fn collect_candidates(signal: &RawSignal, config: &DetectionConfig) -> Vec<Candidate> {
    let mut accs: BTreeMap<String, Accumulator> = BTreeMap::new();

    for tag in &signal.tags {
        if tag.confidence < config.confidence_min {
            continue;
        }
        let token = normalize(&tag.name);
        if token.is_empty() {
            continue;
        }
        let acc = accs.entry(token).or_default();
        acc.tag_conf = acc.tag_conf.max(tag.confidence);
        acc.sources.insert(SourceGroup::Tag);
    }

    for caption in &signal.captions {
        for token in caption_tokens(&caption.text) {
            let acc = accs.entry(token).or_default();
            acc.caption_conf = acc.caption_conf.max(caption.confidence);
            acc.caption_occurrences += 1;
            acc.sources.insert(SourceGroup::Caption);
        }
    }

    for object in &signal.objects {
        for tag in &object.tags {
            if tag.confidence < config.confidence_min {
                continue;
            }
            let token = normalize(&tag.name);
            if token.is_empty() {
                continue;
            }
            let acc = accs.entry(token).or_default();
            acc.object_conf = acc.object_conf.max(tag.confidence);
            acc.sources.insert(SourceGroup::Object);
            if !object.bounding_box.is_empty() && !acc.boxes.contains(&object.bounding_box) {
                acc.boxes.push(object.bounding_box);
            }
        }
    }

    accs.into_iter()
        .filter_map(|(token, acc)| {
            let score = composite_score(&acc, config);
            if score < config.score_min {
                return None;
            }
            Some(Candidate {
                token,
                sources: acc.sources,
                score,
                tag_confidence: acc.tag_conf,
                bounding_boxes: acc.boxes,
            })
        })
        .collect()
}

fn composite_score(acc: &Accumulator, config: &DetectionConfig) -> f32 {
    let mut score = 0.0;

    if acc.sources.contains(&SourceGroup::Tag) {
        score += config.tag_weight * acc.tag_conf;
    }
    if acc.sources.contains(&SourceGroup::Caption) {
        score += config.caption_weight * acc.caption_conf;
        let repeats = acc.caption_occurrences.saturating_sub(1) as f32;
        score += (config.caption_repeat_bonus * repeats).min(config.caption_repeat_bonus_cap);
    }
    if acc.sources.contains(&SourceGroup::Object) {
        score += config.object_weight * acc.object_conf;
    }
    if !acc.sources.is_empty() {
        score += config.group_bonus * (acc.sources.len() - 1) as f32;
    }

    score
}

/// Deterministic candidate ordering: score desc, then feature-group count
/// desc, then tag confidence desc, then lexical asc. Never random.
pub fn rank(a: &Candidate, b: &Candidate) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| b.sources.len().cmp(&a.sources.len()))
        .then_with(|| b.tag_confidence.total_cmp(&a.tag_confidence))
        .then_with(|| a.token.cmp(&b.token))
}

/// Merge two candidate sets keyed by token: keep the max score and tag
/// confidence, union the sources and bounding boxes. Commutative and
/// idempotent, so crop-arrival order never changes the result.
pub fn merge_candidates(base: Vec<Candidate>, extra: Vec<Candidate>) -> Vec<Candidate> {
    let mut merged: BTreeMap<String, Candidate> = BTreeMap::new();

    for candidate in base.into_iter().chain(extra) {
        match merged.get_mut(&candidate.token) {
            None => {
                merged.insert(candidate.token.clone(), candidate);
            }
            Some(existing) => {
                existing.score = existing.score.max(candidate.score);
                existing.tag_confidence = existing.tag_confidence.max(candidate.tag_confidence);
                existing.sources.extend(candidate.sources.iter().copied());
                for bbox in candidate.bounding_boxes {
                    if !existing.bounding_boxes.contains(&bbox) {
                        existing.bounding_boxes.push(bbox);
                    }
                }
            }
        }
    }

    merged.into_values().collect()
}
