//! Clip generation entry point.

use crate::config::GeneratorConfig;
use crate::error::{ClipError, Result};
use crate::motion::{resolve_motion, MotionScore, MotionTemplate, MotionTemplateStore};
use crate::preprocess::{encode_png, ImagePreprocessor, LanczosPreprocessor};
use crate::video::{
    ClipRequest, GenerationJob, ImagePayload, JobPoller, ProviderAdapter, ProviderRegistry,
    SubmitRequest,
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::io::AsyncWriteExt;

const DEFAULT_FPS: u32 = 24;

/// Source of generation seeds.
pub trait SeedSource: Send + Sync {
    /// Returns the seed for the next generation.
    fn next_seed(&self) -> u32;
}

/// Uniformly random 32-bit seeds.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomSeed;

impl SeedSource for RandomSeed {
    fn next_seed(&self) -> u32 {
        rand::random::<u32>()
    }
}

/// Always the same seed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedSeed(pub u32);

impl SeedSource for FixedSeed {
    fn next_seed(&self) -> u32 {
        self.0
    }
}

/// Point-in-time view of a generator's settings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConfigSnapshot {
    /// Generator configuration.
    pub config: GeneratorConfig,
    /// Current motion score.
    pub motion_score: f64,
    /// Current frame rate.
    pub fps: u32,
}

/// Builder for [`ClipGenerator`].
pub struct ClipGeneratorBuilder {
    config: GeneratorConfig,
    motion_score: MotionScore,
    fps: u32,
    registry: ProviderRegistry,
    preprocessor: Arc<dyn ImagePreprocessor>,
    seeds: Arc<dyn SeedSource>,
    client: Option<reqwest::Client>,
}

impl Default for ClipGeneratorBuilder {
    fn default() -> Self {
        Self {
            config: GeneratorConfig::default(),
            motion_score: MotionScore::default(),
            fps: DEFAULT_FPS,
            registry: ProviderRegistry::with_defaults(),
            preprocessor: Arc::new(LanczosPreprocessor),
            seeds: Arc::new(RandomSeed),
            client: None,
        }
    }
}

impl ClipGeneratorBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the generator configuration.
    pub fn config(mut self, config: GeneratorConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the initial motion score (clamped to `[0, 1]`).
    pub fn motion_score(mut self, score: f64) -> Self {
        self.motion_score = MotionScore::new(score);
        self
    }

    /// Sets the frame rate (minimum 1).
    pub fn fps(mut self, fps: u32) -> Self {
        self.fps = fps.max(1);
        self
    }

    /// Registers an extra provider adapter, replacing a built-in one with the same id.
    pub fn provider(mut self, adapter: Arc<dyn ProviderAdapter>) -> Self {
        self.registry.register(adapter);
        self
    }

    /// Replaces the whole provider registry.
    pub fn registry(mut self, registry: ProviderRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Sets the image preprocessing collaborator.
    pub fn image_preprocessor(mut self, preprocessor: Arc<dyn ImagePreprocessor>) -> Self {
        self.preprocessor = preprocessor;
        self
    }

    /// Sets the seed source used when a request carries no seed.
    pub fn seed_source(mut self, seeds: Arc<dyn SeedSource>) -> Self {
        self.seeds = seeds;
        self
    }

    /// Sets the HTTP client used for downloads.
    pub fn http_client(mut self, client: reqwest::Client) -> Self {
        self.client = Some(client);
        self
    }

    /// Builds the generator, loading motion templates.
    pub fn build(self) -> Result<ClipGenerator> {
        let config = self.config.resolve_credentials();
        let templates = MotionTemplateStore::load(config.motion_config_path())?;
        Ok(ClipGenerator {
            config,
            motion_score: self.motion_score,
            fps: self.fps,
            templates,
            registry: self.registry,
            preprocessor: self.preprocessor,
            seeds: self.seeds,
            client: self.client.unwrap_or_default(),
        })
    }
}

/// Turns a source image into a clip through the configured provider.
///
/// `generate_clip` borrows the generator immutably while setters need `&mut
/// self`, so settings cannot change while a generation is in flight.
pub struct ClipGenerator {
    config: GeneratorConfig,
    motion_score: MotionScore,
    fps: u32,
    templates: MotionTemplateStore,
    registry: ProviderRegistry,
    preprocessor: Arc<dyn ImagePreprocessor>,
    seeds: Arc<dyn SeedSource>,
    client: reqwest::Client,
}

impl std::fmt::Debug for ClipGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClipGenerator")
            .field("config", &self.config)
            .field("motion_score", &self.motion_score)
            .field("fps", &self.fps)
            .field("templates", &self.templates.names())
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

impl ClipGenerator {
    /// Creates a new `ClipGeneratorBuilder`.
    pub fn builder() -> ClipGeneratorBuilder {
        ClipGeneratorBuilder::new()
    }

    /// Generates a clip and writes it to `request.output_path`.
    pub async fn generate_clip(&self, request: &ClipRequest) -> Result<PathBuf> {
        let start = Instant::now();
        let output_path = request.output_path.clone();

        if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                ClipError::Generation(format!(
                    "failed to create output directory {}: {e}",
                    parent.display()
                ))
            })?;
        }

        let png = self.prepare_image(&request.image_path)?;

        let motion = resolve_motion(
            self.motion_score,
            request.template_name.as_deref(),
            &self.templates,
        )?;
        let steps = self.config.num_inference_steps();
        let seed = request.seed.unwrap_or_else(|| self.seeds.next_seed());

        let adapter = self.registry.get(self.config.api_provider())?;
        let submit = SubmitRequest {
            image: ImagePayload::encode(png, adapter.payload_format()),
            motion_bucket_id: motion.motion_bucket_id,
            steps,
            seed,
            noise_aug_strength: motion.noise_aug_strength,
        };
        tracing::debug!(
            provider = %adapter.id(),
            motion_bucket_id = submit.motion_bucket_id,
            noise_aug_strength = submit.noise_aug_strength,
            steps,
            seed,
            prompt = %request.prompt,
            "submitting image-to-video job"
        );

        let task_id = adapter.submit(&submit, &self.config).await?;
        let job = GenerationJob::new(task_id, adapter.id());

        let video_url = JobPoller::from_config(&self.config)
            .wait(adapter.as_ref(), &job, &self.config)
            .await?;

        let bytes = self.download(&video_url, &output_path).await?;
        tracing::info!(
            task_id = %job.task_id,
            path = %output_path.display(),
            bytes,
            elapsed_secs = start.elapsed().as_secs(),
            "clip generated"
        );
        Ok(output_path)
    }

    /// Returns a copy of the named motion template.
    pub fn get_motion_template(&self, name: &str) -> Result<MotionTemplate> {
        self.templates.get(name)
    }

    /// Returns a copy of every motion template.
    pub fn list_motion_templates(&self) -> BTreeMap<String, MotionTemplate> {
        self.templates.list()
    }

    /// Sets the motion score used when no template is named (clamped to `[0, 1]`).
    pub fn set_motion_score(&mut self, score: f64) {
        self.motion_score = MotionScore::new(score);
    }

    /// Current motion score.
    pub fn motion_score(&self) -> f64 {
        self.motion_score.value()
    }

    /// Sets the frame rate (minimum 1).
    pub fn set_fps(&mut self, fps: u32) {
        self.fps = fps.max(1);
    }

    /// Current frame rate.
    pub fn fps(&self) -> u32 {
        self.fps
    }

    /// Returns a snapshot of the current settings.
    pub fn get_config(&self) -> ConfigSnapshot {
        ConfigSnapshot {
            config: self.config.clone(),
            motion_score: self.motion_score.value(),
            fps: self.fps,
        }
    }

    fn prepare_image(&self, path: &Path) -> Result<Vec<u8>> {
        if !path.exists() {
            return Err(ClipError::ImageNotFound(path.to_path_buf()));
        }
        let (width, height) = self.config.image_size();
        let image = self.preprocessor.load(path)?;
        let image = self.preprocessor.resize_and_center_crop(image, width, height);
        encode_png(&image)
    }

    /// Streams the video to `path`, returning the number of bytes written.
    ///
    /// `path` is only touched once the server has answered with a success
    /// status. A failure after that removes the partially written file.
    async fn download(&self, url: &str, path: &Path) -> Result<u64> {
        let response = self
            .client
            .get(url)
            .timeout(self.config.download_timeout())
            .send()
            .await
            .map_err(|e| ClipError::Download(format!("request to {url} failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClipError::Download(format!(
                "{url} returned HTTP {}",
                status.as_u16()
            )));
        }

        let mut file = tokio::fs::File::create(path).await.map_err(|e| {
            ClipError::Generation(format!("failed to create {}: {e}", path.display()))
        })?;

        let result = write_body(response, &mut file, url, path).await;
        if result.is_err() {
            drop(file);
            let _ = tokio::fs::remove_file(path).await;
        }
        result
    }
}

async fn write_body(
    mut response: reqwest::Response,
    file: &mut tokio::fs::File,
    url: &str,
    path: &Path,
) -> Result<u64> {
    let mut total: u64 = 0;
    while let Some(chunk) = response
        .chunk()
        .await
        .map_err(|e| ClipError::Download(format!("reading {url} failed: {e}")))?
    {
        total = total.saturating_add(chunk.len() as u64);
        file.write_all(&chunk).await.map_err(|e| {
            ClipError::Generation(format!("failed to write {}: {e}", path.display()))
        })?;
    }
    file.flush().await?;
    Ok(total)
}
