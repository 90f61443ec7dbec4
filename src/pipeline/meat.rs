//! Non-veg (meat-signal) resolver.
//!
//! Last-resort fallback for scenes where filtering leaves nothing but the
//! aggregate evidence still implies an animal-protein dish. Words from all
//! feature groups are re-scored with coarse source weights; if no concrete
//! word qualifies, a literal "meat" is emitted only under an explicit
//! meat-scene signal.

use std::collections::{BTreeMap, BTreeSet};

use crate::pipeline::category::category_of;
use crate::pipeline::filter::is_generic;
use crate::pipeline::normalize::{caption_tokens, normalize};
use crate::pipeline::signal::{Caption, Tag};

/// Source weights for the fallback word score.
mod fallback {
    /// Word already present among the pipeline's candidates.
    pub const CANDIDATE_WEIGHT: f32 = 1.0;

    /// Word present among the raw tags.
    pub const TAG_WEIGHT: f32 = 0.8;

    /// Word present in a caption.
    pub const CAPTION_WEIGHT: f32 = 0.6;

    /// Minimum aggregate word score to qualify as the fallback pick.
    pub const QUALIFYING_FLOOR: f32 = 0.8;
}

/// Resolve a meat-signal fallback token.
///
/// `candidates` are the pre-filter candidate tokens of the current pass.
/// Only words naming a concrete animal protein (members of the static food
/// categories) are ranked; this is a non-veg resolver, not a second chance
/// for arbitrary caption vocabulary. Returns the top qualifying word, the
/// literal `"meat"` when only the aggregate meat-scene signal is present,
/// and `None` otherwise.
pub fn resolve_meat_fallback(
    candidates: &[String],
    tags: &[Tag],
    captions: &[Caption],
) -> Option<String> {
    let candidate_words: BTreeSet<&str> = candidates
        .iter()
        .filter(|t| !t.is_empty())
        .map(String::as_str)
        .collect();

    let tag_words: BTreeSet<String> = tags
        .iter()
        .map(|t| normalize(&t.name))
        .filter(|t| !t.is_empty())
        .collect();

    let caption_words: BTreeSet<String> = captions
        .iter()
        .flat_map(|c| caption_tokens(&c.text))
        .collect();

    let mut scores: BTreeMap<&str, f32> = BTreeMap::new();
    for word in candidate_words.iter().copied() {
        *scores.entry(word).or_insert(0.0) += fallback::CANDIDATE_WEIGHT;
    }
    for word in &tag_words {
        *scores.entry(word).or_insert(0.0) += fallback::TAG_WEIGHT;
    }
    for word in &caption_words {
        *scores.entry(word).or_insert(0.0) += fallback::CAPTION_WEIGHT;
    }

    // Highest score wins; the BTreeMap iteration order makes the tie-break
    // lexical and deterministic.
    let best = scores
        .iter()
        .filter(|(word, score)| {
            **score >= fallback::QUALIFYING_FLOOR
                && !is_generic(word)
                && category_of(word).is_some()
        })
        .max_by(|(wa, sa), (wb, sb)| sa.total_cmp(sb).then_with(|| wb.cmp(wa)));

    if let Some((word, score)) = best {
        tracing::debug!(word = %word, score = %score, "Meat fallback resolved a concrete word");
        return Some((*word).to_string());
    }

    if has_meat_scene_signal(&tag_words, &caption_words, captions) {
        tracing::debug!("Meat fallback: aggregate meat-scene signal");
        return Some("meat".to_string());
    }

    None
}

/// Aggregate evidence of a meat scene: an explicit "meat" word, "animal"
/// and "fat" co-occurring with "food", or a caption mentioning "raw meat".
fn has_meat_scene_signal(
    tag_words: &BTreeSet<String>,
    caption_words: &BTreeSet<String>,
    captions: &[Caption],
) -> bool {
    let present = |word: &str| tag_words.contains(word) || caption_words.contains(word);

    if present("meat") {
        return true;
    }
    if present("animal") && present("fat") && present("food") {
        return true;
    }
    captions
        .iter()
        .any(|c| c.text.to_lowercase().contains("raw meat"))
}
