//! Signal model — typed view of one vision-provider response.
//!
//! The provider returns Azure-image-analysis-shaped JSON. Every field is
//! optional on the wire: a missing `tagsResult`, `objectsResult`, or
//! `denseCaptionsResult` deserializes to an empty list, never an error.
//! `readResult` (OCR text) exists on the wire but is ignored by this core.

use serde::{Deserialize, Serialize};

/// One tag reported by the provider, either top-level or inside an object.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Tag {
    pub name: String,
    pub confidence: f32,
}

/// One dense caption: a free-text sentence describing part of the scene.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Caption {
    pub text: String,
    pub confidence: f32,
}

/// Axis-aligned pixel region reported by object detection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl BoundingBox {
    pub fn new(x: u32, y: u32, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }

    /// A zero-area box carries no spatial information.
    pub fn is_empty(&self) -> bool {
        self.w == 0 || self.h == 0
    }

    /// Whether two boxes share any pixels. Empty boxes intersect nothing.
    pub fn intersects(&self, other: &BoundingBox) -> bool {
        if self.is_empty() || other.is_empty() {
            return false;
        }
        self.x < other.x + other.w
            && other.x < self.x + self.w
            && self.y < other.y + other.h
            && other.y < self.y + self.h
    }
}

/// One localized object detection with its own tag list.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct DetectedObject {
    pub tags: Vec<Tag>,
    #[serde(rename = "boundingBox")]
    pub bounding_box: BoundingBox,
    pub confidence: Option<f32>,
}

/// Immutable view of one vision call. Pure input to the pipeline.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(from = "AnalyzeResponse")]
pub struct RawSignal {
    pub tags: Vec<Tag>,
    pub captions: Vec<Caption>,
    pub objects: Vec<DetectedObject>,
}

impl RawSignal {
    /// Parse a provider response leniently: malformed or missing fields
    /// collapse to empty lists. A completely unparseable value yields an
    /// empty signal rather than an error.
    pub fn from_provider_json(value: serde_json::Value) -> RawSignal {
        serde_json::from_value(value).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty() && self.captions.is_empty() && self.objects.is_empty()
    }
}

/// Wire shape of the provider response.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AnalyzeResponse {
    tags_result: ValueList<Tag>,
    objects_result: ValueList<DetectedObject>,
    dense_captions_result: ValueList<Caption>,
    // OCR text — present on the wire, unused by this core.
    #[allow(dead_code)]
    read_result: serde_json::Value,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
struct ValueList<T> {
    values: Vec<T>,
}

impl<T> Default for ValueList<T> {
    fn default() -> Self {
        Self { values: Vec::new() }
    }
}

impl From<AnalyzeResponse> for RawSignal {
    fn from(response: AnalyzeResponse) -> Self {
        RawSignal {
            tags: response.tags_result.values,
            captions: response.dense_captions_result.values,
            objects: response.objects_result.values,
        }
    }
}
