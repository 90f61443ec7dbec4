//! Category disambiguator — sibling collapse and hierarchy collapse.
//!
//! Static membership tables map concrete tokens to a food category. Two
//! passes run over the surviving candidates, hierarchy first:
//!
//! 1. **Hierarchy collapse**: a generic parent term ("fish" next to a
//!    confirmed "octopus") is removed irrespective of spatial evidence.
//!    Parents never coexist with confirmed children.
//! 2. **Sibling collapse**: two members of the same category collapse to the
//!    higher-scoring one, unless object detection localized them in
//!    pairwise-disjoint bounding boxes.

use std::collections::BTreeMap;

use crate::pipeline::score::{rank, Candidate};

/// Static food category for disambiguation. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum FoodCategory {
    RedMeat,
    Poultry,
    Fish,
    Shellfish,
    Cephalopod,
}

const RED_MEAT: &[&str] = &["beef", "goat", "lamb", "mutton", "pork", "veal", "venison"];

const POULTRY: &[&str] = &["chicken", "duck", "goose", "quail", "turkey"];

const FISH: &[&str] = &[
    "anchovy", "bass", "catfish", "cod", "eel", "fish", "halibut", "herring",
    "mackerel", "salmon", "sardine", "snapper", "tilapia", "trout", "tuna",
];

const SHELLFISH: &[&str] = &[
    "clam", "crab", "crayfish", "lobster", "mussel", "oyster", "prawn",
    "scallop", "shrimp",
];

const CEPHALOPOD: &[&str] = &["cuttlefish", "octopus", "squid"];

/// Generic parent terms and the categories whose members confirm them away.
/// "fish" doubles as a concrete token and the colloquial parent of anything
/// from the sea.
const PARENT_TERMS: &[(&str, &[FoodCategory])] = &[
    ("animal", &[
        FoodCategory::RedMeat,
        FoodCategory::Poultry,
        FoodCategory::Fish,
        FoodCategory::Shellfish,
        FoodCategory::Cephalopod,
    ]),
    ("crustacean", &[FoodCategory::Shellfish]),
    ("fish", &[FoodCategory::Fish, FoodCategory::Shellfish, FoodCategory::Cephalopod]),
    ("invertebrate", &[FoodCategory::Shellfish, FoodCategory::Cephalopod]),
    ("meat", &[FoodCategory::RedMeat, FoodCategory::Poultry]),
    ("mollusk", &[FoodCategory::Shellfish, FoodCategory::Cephalopod]),
    ("poultry", &[FoodCategory::Poultry]),
    ("seafood", &[FoodCategory::Fish, FoodCategory::Shellfish, FoodCategory::Cephalopod]),
    ("shellfish", &[FoodCategory::Shellfish]),
];

/// Look up the static category of a token, if any.
pub fn category_of(token: &str) -> Option<FoodCategory> {
    if RED_MEAT.binary_search(&token).is_ok() {
        return Some(FoodCategory::RedMeat);
    }
    if POULTRY.binary_search(&token).is_ok() {
        return Some(FoodCategory::Poultry);
    }
    if FISH.binary_search(&token).is_ok() {
        return Some(FoodCategory::Fish);
    }
    if SHELLFISH.binary_search(&token).is_ok() {
        return Some(FoodCategory::Shellfish);
    }
    if CEPHALOPOD.binary_search(&token).is_ok() {
        return Some(FoodCategory::Cephalopod);
    }
    None
}

fn covered_categories(token: &str) -> Option<&'static [FoodCategory]> {
    PARENT_TERMS
        .binary_search_by(|(parent, _)| (*parent).cmp(token))
        .ok()
        .map(|i| PARENT_TERMS[i].1)
}

fn is_parent_term(token: &str) -> bool {
    covered_categories(token).is_some()
}

/// Run both collapse passes and return the disambiguated set.
pub fn disambiguate(candidates: Vec<Candidate>) -> Vec<Candidate> {
    collapse_siblings(collapse_hierarchy(candidates))
}

/// Remove every generic parent term that has a confirmed child among the
/// survivors. Spatial evidence is irrelevant here.
pub fn collapse_hierarchy(candidates: Vec<Candidate>) -> Vec<Candidate> {
    let confirmed: Vec<FoodCategory> = candidates
        .iter()
        .filter(|c| !is_parent_term(&c.token))
        .filter_map(|c| category_of(&c.token))
        .collect();

    candidates
        .into_iter()
        .filter(|candidate| {
            let Some(covered) = covered_categories(&candidate.token) else {
                return true;
            };
            let child_confirmed = confirmed.iter().any(|cat| covered.contains(cat));
            if child_confirmed {
                tracing::debug!(
                    parent = %candidate.token,
                    "Hierarchy collapse: removing parent with confirmed child"
                );
            }
            !child_confirmed
        })
        .collect()
}

/// Collapse same-category siblings to the highest-ranked member, unless every
/// sibling pair is localized in disjoint bounding boxes. Overlapping boxes
/// collapse: only clearly separated regions count as evidence of two
/// distinct ingredients.
pub fn collapse_siblings(candidates: Vec<Candidate>) -> Vec<Candidate> {
    let mut by_category: BTreeMap<FoodCategory, Vec<Candidate>> = BTreeMap::new();
    let mut uncategorized: Vec<Candidate> = Vec::new();

    for candidate in candidates {
        match category_of(&candidate.token) {
            Some(category) => by_category.entry(category).or_default().push(candidate),
            None => uncategorized.push(candidate),
        }
    }

    let mut kept = uncategorized;
    for (category, mut siblings) in by_category {
        if siblings.len() < 2 || spatially_distinct(&siblings) {
            kept.append(&mut siblings);
            continue;
        }
        siblings.sort_by(rank);
        let winner = siblings.remove(0);
        tracing::debug!(
            category = ?category,
            winner = %winner.token,
            collapsed = siblings.len(),
            "Sibling collapse"
        );
        kept.push(winner);
    }

    kept
}

/// Whether every sibling pair is localized in disjoint boxes. A sibling
/// without any box provides no spatial evidence and forces a collapse.
fn spatially_distinct(siblings: &[Candidate]) -> bool {
    if siblings.iter().any(|c| c.bounding_boxes.is_empty()) {
        return false;
    }
    for (i, a) in siblings.iter().enumerate() {
        for b in &siblings[i + 1..] {
            let disjoint = a
                .bounding_boxes
                .iter()
                .all(|ba| b.bounding_boxes.iter().all(|bb| !ba.intersects(bb)));
            if !disjoint {
                return false;
            }
        }
    }
    true
}
