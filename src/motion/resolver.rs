//! Motion score and template resolution.

use super::templates::{MotionTemplateStore, DEFAULT_NOISE_AUG_STRENGTH};
use crate::error::Result;
use serde::{Deserialize, Serialize};

const MIN_BUCKET: f64 = 1.0;
const MAX_BUCKET: f64 = 255.0;

/// Motion intensity in `[0, 1]`. Values outside the range are clamped, NaN becomes 0.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(from = "f64", into = "f64")]
pub struct MotionScore(f64);

impl MotionScore {
    /// Creates a clamped score.
    pub fn new(value: f64) -> Self {
        if value.is_nan() {
            Self(0.0)
        } else {
            Self(value.clamp(0.0, 1.0))
        }
    }

    /// The clamped value.
    pub fn value(&self) -> f64 {
        self.0
    }

    /// Linear map of `[0, 1]` onto motion buckets `[1, 255]`.
    pub fn bucket_id(&self) -> u32 {
        (MIN_BUCKET + (MAX_BUCKET - MIN_BUCKET) * self.0)
            .round()
            .clamp(MIN_BUCKET, MAX_BUCKET) as u32
    }
}

impl Default for MotionScore {
    fn default() -> Self {
        Self(0.5)
    }
}

impl From<f64> for MotionScore {
    fn from(value: f64) -> Self {
        Self::new(value)
    }
}

impl From<MotionScore> for f64 {
    fn from(score: MotionScore) -> Self {
        score.0
    }
}

/// Provider-neutral motion parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MotionParams {
    /// Motion intensity knob, 1-255.
    pub motion_bucket_id: u32,
    /// Conditioning noise strength.
    pub noise_aug_strength: f64,
}

/// Resolves the parameters for one generation.
///
/// A template, when named, supplies every value and the score is ignored.
/// Otherwise the score is mapped onto a bucket and the default noise strength
/// is used.
pub fn resolve_motion(
    score: MotionScore,
    template_name: Option<&str>,
    templates: &MotionTemplateStore,
) -> Result<MotionParams> {
    match template_name {
        Some(name) => {
            let template = templates.get(name)?;
            Ok(MotionParams {
                motion_bucket_id: template.motion_bucket_id,
                noise_aug_strength: template.noise_aug_strength(),
            })
        }
        None => Ok(MotionParams {
            motion_bucket_id: score.bucket_id(),
            noise_aug_strength: DEFAULT_NOISE_AUG_STRENGTH,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ClipError;
    use crate::motion::MotionTemplate;
    use std::collections::BTreeMap;

    fn params(score: f64) -> MotionParams {
        resolve_motion(MotionScore::new(score), None, &MotionTemplateStore::builtin()).unwrap()
    }

    #[test]
    fn test_score_endpoints_and_midpoint() {
        assert_eq!(params(0.0).motion_bucket_id, 1);
        assert_eq!(params(1.0).motion_bucket_id, 255);
        assert_eq!(params(0.5).motion_bucket_id, 128);
        assert_eq!(params(0.5).noise_aug_strength, 0.05);
    }

    #[test]
    fn test_score_mapping_matches_formula() {
        for i in 0..=1000 {
            let s = i as f64 / 1000.0;
            let expected = (1.0 + 254.0 * s).round() as u32;
            assert_eq!(params(s).motion_bucket_id, expected, "score {s}");
        }
    }

    #[test]
    fn test_score_is_clamped() {
        assert_eq!(MotionScore::new(-3.0).value(), 0.0);
        assert_eq!(MotionScore::new(7.0).value(), 1.0);
        assert_eq!(MotionScore::new(f64::NAN).value(), 0.0);
        assert_eq!(params(2.0).motion_bucket_id, 255);
        assert_eq!(params(-1.0).motion_bucket_id, 1);
    }

    #[test]
    fn test_template_overrides_score() {
        let store = MotionTemplateStore::builtin();
        for score in [0.0, 0.5, 1.0] {
            let p = resolve_motion(MotionScore::new(score), Some("Cinematic Slow"), &store).unwrap();
            assert_eq!(p.motion_bucket_id, 20);
            assert_eq!(p.noise_aug_strength, 0.02);
        }
    }

    #[test]
    fn test_template_without_noise_uses_default() {
        let mut templates = BTreeMap::new();
        templates.insert(
            "Bare".to_string(),
            MotionTemplate {
                motion_bucket_id: 90,
                noise_aug_strength: None,
                description: String::new(),
            },
        );
        let store = MotionTemplateStore::from_templates(templates);
        let p = resolve_motion(MotionScore::default(), Some("Bare"), &store).unwrap();
        assert_eq!(p.motion_bucket_id, 90);
        assert_eq!(p.noise_aug_strength, 0.05);
    }

    #[test]
    fn test_unknown_template() {
        let err = resolve_motion(MotionScore::default(), Some("Wobble"), &MotionTemplateStore::builtin())
            .unwrap_err();
        assert!(matches!(err, ClipError::UnknownTemplate { ref name, .. } if name == "Wobble"));
    }

    #[test]
    fn test_score_deserializes_clamped() {
        let score: MotionScore = serde_json::from_str("1.7").unwrap();
        assert_eq!(score.value(), 1.0);
    }
}
