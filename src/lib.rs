//! Pantrylens — ingredient identification from food photos.
//!
//! Converts raw, noisy computer-vision signals (object tags, free-text
//! captions, bounding-box detections) into a small, clean set of canonical
//! ingredient names for populating a grocery inventory. The heart of the
//! crate is a multi-stage heuristic fusion engine: normalization, generic
//! filtering, composite scoring, category disambiguation, and a bounded
//! crop-refinement pass over detected regions.
//!
//! Two entry points:
//! - [`pipeline::pick_best_one`] — pure, synchronous, one token or nothing.
//! - [`pipeline::detect_ingredients`] — async, calls the vision provider,
//!   refines per-region crops, returns an ordered ingredient list.
//!
//! Everything else — rendering, inventory sync, account storage, recipe
//! search — lives with the calling application.

pub mod config;
pub mod pipeline;
pub mod vision;

pub use config::DetectionConfig;
pub use pipeline::{
    detect_ingredients, pick_best_one, BoundingBox, Detection, DetectionError, RawSignal,
};
pub use vision::{LocalImageCropper, VisionApiClient, VisionError};

use tracing_subscriber::EnvFilter;

/// Initialize tracing for a host application. Call once at startup; respects
/// `RUST_LOG` and defaults to info-level output for this crate.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("pantrylens=info")),
        )
        .init();
}
