//! Tunable scoring parameters for the detection pipeline.
//!
//! All weights and thresholds were tuned empirically against labeled food
//! scenes. The defaults are the production values; `DetectionConfig` exists
//! so they can be adjusted without touching pipeline code.

use serde::Serialize;

/// Confidence and score floors used across the pipeline.
pub mod thresholds {
    /// Tag/object entries below this confidence are untrusted and ignored.
    pub const CONFIDENCE_MIN: f32 = 0.65;

    /// Minimum composite score to remain a candidate at all.
    pub const SCORE_MIN: f32 = 0.52;

    /// Minimum composite score to be selected as the sole pick.
    pub const CORE_THRESHOLD: f32 = 0.55;
}

/// Feature-group weights for the composite candidate score.
pub mod weights {
    /// Weight applied to the max tag confidence.
    pub const TAG: f32 = 1.0;

    /// Weight applied to the max caption confidence.
    pub const CAPTION: f32 = 0.6;

    /// Weight applied to the max object-tag confidence.
    pub const OBJECT: f32 = 0.8;

    /// Bonus per distinct feature group beyond the first.
    pub const GROUP_BONUS: f32 = 0.1;

    /// Bonus per repeated caption occurrence of the same token.
    pub const CAPTION_REPEAT_BONUS: f32 = 0.05;

    /// Cap on the total caption-frequency bonus.
    pub const CAPTION_REPEAT_BONUS_CAP: f32 = 0.15;
}

/// Scoring configuration for one detection pass.
///
/// The pipeline is a pure function of `(RawSignal, DetectionConfig)`: the
/// same signal and config always produce the same result.
#[derive(Debug, Clone, Serialize)]
pub struct DetectionConfig {
    /// Trust floor for tag and object-tag confidences.
    pub confidence_min: f32,
    /// Floor to remain a candidate.
    pub score_min: f32,
    /// Floor to be selected as the sole pick.
    pub core_threshold: f32,
    /// Weight for the tags feature group.
    pub tag_weight: f32,
    /// Weight for the dense-captions feature group.
    pub caption_weight: f32,
    /// Weight for the objects feature group.
    pub object_weight: f32,
    /// Cross-feature-group bonus per additional group.
    pub group_bonus: f32,
    /// Per-repeat caption frequency bonus.
    pub caption_repeat_bonus: f32,
    /// Cap on the caption frequency bonus.
    pub caption_repeat_bonus_cap: f32,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            confidence_min: thresholds::CONFIDENCE_MIN,
            score_min: thresholds::SCORE_MIN,
            core_threshold: thresholds::CORE_THRESHOLD,
            tag_weight: weights::TAG,
            caption_weight: weights::CAPTION,
            object_weight: weights::OBJECT,
            group_bonus: weights::GROUP_BONUS,
            caption_repeat_bonus: weights::CAPTION_REPEAT_BONUS,
            caption_repeat_bonus_cap: weights::CAPTION_REPEAT_BONUS_CAP,
        }
    }
}
