//! Token normalizer — turns raw vision vocabulary into canonical tokens.
//!
//! A token is lowercase, singular, descriptor-stripped, and at least three
//! characters long. Normalization is deterministic and idempotent: feeding a
//! normalized token back through `normalize` returns it unchanged. Anything
//! unparseable collapses to the empty string, which callers treat as
//! "no candidate".

use std::sync::OnceLock;

use regex::Regex;

/// Raw provider names longer than this are truncated before processing.
const MAX_RAW_CHARS: usize = 100;

/// Tokens shorter than this carry no signal and are rejected.
const MIN_TOKEN_CHARS: usize = 3;

/// Preparation/processing descriptors, stripped from phrase edges.
const PROCESSING_TERMS: &[&str] = &[
    "chopped", "diced", "minced", "ground", "cubed", "shredded", "sliced", "grated", "peeled",
];

/// Cooking-method descriptors.
const COOKING_TERMS: &[&str] = &[
    "boiled", "fried", "grilled", "roasted", "baked", "steamed", "smoked", "cooked",
];

/// Size and quantity descriptors.
const SIZE_TERMS: &[&str] = &[
    "whole", "half", "quarter", "large", "small", "big", "little", "boneless", "skinless",
];

/// Color descriptors. "orange" is handled separately: it is stripped only in
/// leading-modifier position, since bare "orange" is itself a food.
const COLOR_TERMS: &[&str] = &[
    "red", "white", "yellow", "green", "brown", "pink", "black", "purple",
];

/// Freshness/state descriptors.
const FRESHNESS_TERMS: &[&str] = &[
    "fresh", "dried", "organic", "ripe", "raw", "frozen", "canned",
];

/// Food headwords: when a multi-word phrase ends in one of these, the phrase
/// is a "modifier + food" shape and collapses to the headword
/// ("king oyster mushroom" -> "mushroom"). Sorted for binary search.
const FOOD_HEADWORDS: &[&str] = &[
    "apple", "bean", "berry", "bread", "cabbage", "carrot", "cheese", "corn",
    "fish", "grape", "lettuce", "melon", "milk", "mushroom", "noodle", "nut",
    "onion", "pea", "pepper", "potato", "rice", "squash", "tomato",
];

/// English function words skipped during caption tokenization.
/// Sorted for binary search.
const CAPTION_STOPWORDS: &[&str] = &[
    "a", "about", "above", "an", "and", "are", "at", "be", "behind", "beside",
    "by", "for", "from", "in", "into", "is", "it", "its", "near", "next",
    "of", "on", "or", "over", "some", "that", "the", "this", "to", "under",
    "with",
];

/// Irregular plural -> singular forms that suffix rules would mangle.
/// Sorted by plural for binary search.
const IRREGULAR_SINGULARS: &[(&str, &str)] = &[
    ("buses", "bus"),
    ("fungi", "fungus"),
    ("geese", "goose"),
    ("halves", "half"),
    ("knives", "knife"),
    ("leaves", "leaf"),
    ("loaves", "loaf"),
    ("molasses", "molasses"),
];

/// Normalize one raw provider name into a canonical token.
///
/// Order of operations: strip markup and punctuation (hyphen and apostrophe
/// survive), lowercase, truncate, strip edge descriptors, extract the food
/// headword from modifier phrases, singularize. Returns the empty string
/// when nothing usable remains.
pub fn normalize(raw: &str) -> String {
    if raw.trim().is_empty() {
        return String::new();
    }

    // Compiled once; caption tokenization calls normalize per word.
    static MARKUP: OnceLock<Regex> = OnceLock::new();
    let markup = MARKUP.get_or_init(|| Regex::new(r"<[^>]*>").unwrap());
    let stripped = markup.replace_all(raw, " ");

    let cleaned: String = stripped
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace() || *c == '-' || *c == '\'')
        .collect();

    let lower = cleaned.to_lowercase();
    let truncated: String = lower.chars().take(MAX_RAW_CHARS).collect();

    let mut words: Vec<&str> = truncated.split_whitespace().collect();
    if words.is_empty() {
        return String::new();
    }

    // Edge descriptors only come off while another word remains, so a bare
    // descriptor word ("ground") survives as its own token.
    while words.len() > 1 && is_leading_descriptor(words[0]) {
        words.remove(0);
    }
    while words.len() > 1 && is_descriptor(words[words.len() - 1]) {
        words.pop();
    }

    // Modifier + food shape: keep the rightmost food headword.
    if words.len() > 1 {
        let last = words[words.len() - 1];
        if FOOD_HEADWORDS.binary_search(&singularize(last).as_str()).is_ok() {
            words = vec![last];
        }
    }

    let last_index = words.len() - 1;
    let token = words
        .iter()
        .enumerate()
        .map(|(i, w)| {
            if i == last_index {
                singularize(w)
            } else {
                (*w).to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(" ");

    if token.chars().count() < MIN_TOKEN_CHARS {
        String::new()
    } else {
        token
    }
}

/// Tokenize a caption sentence into normalized candidate words.
/// Function words are dropped before normalization; empty results are
/// skipped, so one malformed word never affects the rest.
pub fn caption_tokens(text: &str) -> Vec<String> {
    text.split(|c: char| !(c.is_alphanumeric() || c == '-' || c == '\''))
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .filter(|w| CAPTION_STOPWORDS.binary_search(&w.as_str()).is_err())
        .map(|w| normalize(&w))
        .filter(|t| !t.is_empty())
        .collect()
}

/// Whether a word is a strippable edge descriptor.
fn is_descriptor(word: &str) -> bool {
    PROCESSING_TERMS.contains(&word)
        || COOKING_TERMS.contains(&word)
        || SIZE_TERMS.contains(&word)
        || COLOR_TERMS.contains(&word)
        || FRESHNESS_TERMS.contains(&word)
}

fn is_leading_descriptor(word: &str) -> bool {
    // "orange chicken" -> "chicken", but bare "orange" stays a food.
    is_descriptor(word) || word == "orange"
}

/// Singularize a single word: irregular table first, then suffix rules that
/// respect sibilant endings and leave -ss/-us/-is words alone.
pub fn singularize(word: &str) -> String {
    if let Ok(i) = IRREGULAR_SINGULARS.binary_search_by(|(plural, _)| (*plural).cmp(word)) {
        return IRREGULAR_SINGULARS[i].1.to_string();
    }

    let len = word.len();
    if len > 4 && word.ends_with("ies") {
        return format!("{}y", &word[..len - 3]);
    }
    if len > 4 && word.ends_with("oes") {
        return word[..len - 2].to_string();
    }
    // Sibilant -es only for true sibilant suffixes (-sses, -ches, -shes,
    // -xes, -zes). A bare 's' before the suffix is usually a -se word
    // ("cheeses"), which the plain -s rule below handles correctly.
    if len > 3 && word.ends_with("es") {
        let stem = &word[..len - 2];
        if stem.ends_with("ss")
            || stem.ends_with('x')
            || stem.ends_with('z')
            || stem.ends_with("ch")
            || stem.ends_with("sh")
        {
            return stem.to_string();
        }
    }
    if len > 3
        && word.ends_with('s')
        && !word.ends_with("ss")
        && !word.ends_with("us")
        && !word.ends_with("is")
    {
        return word[..len - 1].to_string();
    }

    word.to_string()
}
