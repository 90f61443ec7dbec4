//! Vision collaborators: the provider HTTP client and the local image
//! cropper. Both implement the pipeline's collaborator traits so tests and
//! alternative providers can swap them out.

pub mod client;
pub mod crop;

pub use client::VisionApiClient;
pub use crop::LocalImageCropper;

use thiserror::Error;

use crate::pipeline::signal::BoundingBox;

/// Errors from the vision provider and crop collaborators.
#[derive(Error, Debug)]
pub enum VisionError {
    #[error("cannot reach vision endpoint at {0}")]
    Connection(String),

    #[error("vision request timed out after {0}s")]
    Timeout(u64),

    #[error("HTTP client error: {0}")]
    Http(String),

    #[error("vision endpoint returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("failed to parse provider response: {0}")]
    ResponseParsing(String),

    #[error("image processing error: {0}")]
    Image(String),

    #[error("crop region {0:?} lies outside the image")]
    InvalidRegion(BoundingBox),

    #[error("missing configuration: {0}")]
    Configuration(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
