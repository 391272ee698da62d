//! Motion controls: named templates and score-to-parameter resolution.

mod resolver;
mod templates;

pub use resolver::{resolve_motion, MotionParams, MotionScore};
pub use templates::{
    MotionTemplate, MotionTemplateStore, DEFAULT_MOTION_CONFIG, DEFAULT_NOISE_AUG_STRENGTH,
};
