#![warn(missing_docs)]
//! ClipStudio - image-to-video clips through remote generation providers.
//!
//! A [`ClipGenerator`] loads a source image, fits it to the provider frame,
//! translates motion controls into provider parameters, submits the job and
//! polls it at a fixed cadence until the clip can be downloaded.
//!
//! # Quick Start
//!
//! ```no_run
//! use clipstudio::{ClipGenerator, ClipRequest, GeneratorConfig};
//!
//! #[tokio::main]
//! async fn main() -> clipstudio::Result<()> {
//!     let config = GeneratorConfig::builder()
//!         .api_provider("stability")
//!         .build();
//!     let generator = ClipGenerator::builder()
//!         .config(config)
//!         .motion_score(0.7)
//!         .build()?;
//!
//!     let request = ClipRequest::new("harbor.jpg", "Boats rocking at dawn", "out/harbor.mp4")
//!         .with_template("Cinematic Slow");
//!     let path = generator.generate_clip(&request).await?;
//!     println!("clip written to {}", path.display());
//!     Ok(())
//! }
//! ```
//!
//! # Features
//!
//! - `stability`: Stability AI image-to-video
//! - `runway`: Runway image-to-video
//! - `video`: All providers (default)

mod config;
mod error;
mod generator;
pub mod motion;
mod preprocess;
pub mod video;

#[cfg(test)]
mod test_support;

pub use config::{GeneratorConfig, GeneratorConfigBuilder};
pub use error::{ClipError, Result};
pub use generator::{
    ClipGenerator, ClipGeneratorBuilder, ConfigSnapshot, FixedSeed, RandomSeed, SeedSource,
};
pub use motion::{MotionParams, MotionScore, MotionTemplate, MotionTemplateStore};
pub use preprocess::{ImagePreprocessor, LanczosPreprocessor};
pub use video::{
    ClipRequest, GenerationJob, ImagePayload, JobPoller, JobStatus, PayloadFormat,
    ProviderAdapter, ProviderKind, ProviderRegistry, SubmitRequest,
};

#[cfg(feature = "stability")]
pub use video::providers::StabilityAdapter;

#[cfg(feature = "runway")]
pub use video::providers::{RunwayAdapter, RunwayModel};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::error::{ClipError, Result};
    pub use crate::{ClipGenerator, ClipRequest, GeneratorConfig, ProviderAdapter};

    #[cfg(feature = "stability")]
    pub use crate::video::providers::StabilityAdapter;

    #[cfg(feature = "runway")]
    pub use crate::video::providers::RunwayAdapter;
}
