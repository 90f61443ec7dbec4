//! Ingredient-identification pipeline.
//!
//! Stages, leaf to root: signal model → token normalization → generic
//! filtering → candidate scoring → category disambiguation → optional crop
//! refinement → single- or multi-pick extraction. Every stage is a pure
//! function of its input; all tables and thresholds are constants, so a
//! given signal always maps to the same result.

pub mod category;
pub mod detect;
pub mod filter;
pub mod meat;
pub mod normalize;
pub mod refine;
pub mod score;
pub mod signal;

pub use detect::{
    detect_ingredients, detect_ingredients_with, pick_best_one, pick_best_one_with, Detection,
};
pub use refine::{ImageCropper, VisionAnalyzer};
pub use score::Candidate;
pub use signal::{BoundingBox, Caption, DetectedObject, RawSignal, Tag};

use thiserror::Error;

use crate::vision::VisionError;

/// Errors surfaced by the multi-pick entry point. Everything recoverable
/// (malformed fields, empty results, single crop failures) is handled inside
/// the pipeline and never reaches here.
#[derive(Error, Debug)]
pub enum DetectionError {
    #[error("vision provider error: {0}")]
    Vision(#[from] VisionError),
}
