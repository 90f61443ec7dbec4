//! Generic/stopword filter — removes category-noise tokens.
//!
//! Two fixed sets: umbrella words (broad food-category terms the provider
//! loves to emit) and scene-noise words (photography vocabulary that leaks
//! out of captions). Both are sorted for binary search, following the same
//! layout as every other static table in this crate.

/// Broad umbrella terms that never name a concrete ingredient.
/// Sorted for binary search.
const UMBRELLA_TERMS: &[&str] = &[
    "animal", "crustacean", "cuisine", "dairy", "dish", "drink", "food",
    "fruit", "ingredient", "invertebrate", "meal", "meat", "mollusk",
    "poultry", "produce", "seafood", "shellfish", "snack", "vegetable",
];

/// Scene and photography noise that describes the photo, not the food.
/// Sorted for binary search.
const SCENE_NOISE_TERMS: &[&str] = &[
    "background", "bowl", "close", "diet", "fat", "flesh", "indoor", "local",
    "natural", "nutrition", "outdoor", "plate", "raw", "skin", "surface",
    "table", "wood",
];

/// Whether a normalized token is generic: either an umbrella category word
/// or scene noise. Generic tokens are dropped from the candidate set unless
/// resurrected by the meat-signal fallback.
pub fn is_generic(token: &str) -> bool {
    is_umbrella(token) || SCENE_NOISE_TERMS.binary_search(&token).is_ok()
}

/// Whether a token is a broad umbrella category word. Used on its own by
/// crop refinement, which re-analyzes regions whose object label is an
/// umbrella term ("food", "fruit", "vegetable").
pub fn is_umbrella(token: &str) -> bool {
    UMBRELLA_TERMS.binary_search(&token).is_ok()
}
