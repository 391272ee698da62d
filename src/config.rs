//! Generator configuration.

use crate::video::ProviderKind;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

const DEFAULT_PROVIDER: &str = "stability";
const DEFAULT_IMAGE_SIZE: (u32, u32) = (1024, 576); // 16:9
const DEFAULT_INFERENCE_STEPS: u32 = 50;
const DEFAULT_GUIDANCE_SCALE: f32 = 7.5;
const DEFAULT_POLLING_INTERVAL: Duration = Duration::from_secs(3);
const DEFAULT_MAX_POLLING_ATTEMPTS: u32 = 200;
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(300);

/// Options shared by every generation call of a [`ClipGenerator`](crate::ClipGenerator).
///
/// Missing fields take their defaults, both through the builder and when
/// deserializing a partial JSON object.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    device: String,
    image_size: (u32, u32),
    api_provider: String,
    #[serde(skip_serializing)]
    api_key: Option<String>,
    api_base_url: Option<String>,
    num_inference_steps: u32,
    guidance_scale: f32,
    #[serde(with = "duration_secs")]
    polling_interval: Duration,
    max_polling_attempts: u32,
    motion_config_path: Option<PathBuf>,
    #[serde(with = "duration_secs")]
    request_timeout: Duration,
    #[serde(with = "duration_secs")]
    download_timeout: Duration,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            device: "cpu".to_string(),
            image_size: DEFAULT_IMAGE_SIZE,
            api_provider: DEFAULT_PROVIDER.to_string(),
            api_key: None,
            api_base_url: None,
            num_inference_steps: DEFAULT_INFERENCE_STEPS,
            guidance_scale: DEFAULT_GUIDANCE_SCALE,
            polling_interval: DEFAULT_POLLING_INTERVAL,
            max_polling_attempts: DEFAULT_MAX_POLLING_ATTEMPTS,
            motion_config_path: None,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            download_timeout: DEFAULT_DOWNLOAD_TIMEOUT,
        }
    }
}

impl std::fmt::Debug for GeneratorConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeneratorConfig")
            .field("device", &self.device)
            .field("image_size", &self.image_size)
            .field("api_provider", &self.api_provider)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("api_base_url", &self.api_base_url)
            .field("num_inference_steps", &self.num_inference_steps)
            .field("guidance_scale", &self.guidance_scale)
            .field("polling_interval", &self.polling_interval)
            .field("max_polling_attempts", &self.max_polling_attempts)
            .field("motion_config_path", &self.motion_config_path)
            .field("request_timeout", &self.request_timeout)
            .field("download_timeout", &self.download_timeout)
            .finish()
    }
}

impl GeneratorConfig {
    /// Creates a new `GeneratorConfigBuilder`.
    pub fn builder() -> GeneratorConfigBuilder {
        GeneratorConfigBuilder::new()
    }

    /// Compute device label, kept for reporting.
    pub fn device(&self) -> &str {
        &self.device
    }

    /// Target `(width, height)` of the preprocessed source image.
    pub fn image_size(&self) -> (u32, u32) {
        self.image_size
    }

    /// Id of the provider adapter used for generation.
    pub fn api_provider(&self) -> &str {
        &self.api_provider
    }

    /// API key, if one is configured. Empty keys count as absent.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref().filter(|k| !k.trim().is_empty())
    }

    /// Fills a missing API key from the provider's environment variable
    /// (`STABILITY_API_KEY` or `RUNWAYML_API_SECRET`).
    ///
    /// The builder applies this on `build()`. A config obtained through serde
    /// gets it when handed to [`ClipGeneratorBuilder::build`](crate::ClipGeneratorBuilder::build).
    pub fn resolve_credentials(self) -> Self {
        self.resolve_credentials_with(|var| std::env::var(var).ok())
    }

    fn resolve_credentials_with(mut self, lookup: impl FnOnce(&str) -> Option<String>) -> Self {
        if self.api_key.is_none() {
            self.api_key = ProviderKind::from_id(&self.api_provider)
                .and_then(|kind| lookup(kind.credential_env_var()));
        }
        self
    }

    /// Base URL override. `None` means the adapter's own default.
    pub fn api_base_url(&self) -> Option<&str> {
        self.api_base_url.as_deref()
    }

    /// Number of diffusion steps requested from the provider.
    pub fn num_inference_steps(&self) -> u32 {
        self.num_inference_steps
    }

    /// Classifier-free guidance scale.
    pub fn guidance_scale(&self) -> f32 {
        self.guidance_scale
    }

    /// Delay before each status poll.
    pub fn polling_interval(&self) -> Duration {
        self.polling_interval
    }

    /// Maximum number of status polls.
    pub fn max_polling_attempts(&self) -> u32 {
        self.max_polling_attempts
    }

    /// Explicit motion template file, if configured.
    pub fn motion_config_path(&self) -> Option<&Path> {
        self.motion_config_path.as_deref()
    }

    /// Timeout applied to each submit/poll API call.
    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    /// Timeout applied to the video download.
    pub fn download_timeout(&self) -> Duration {
        self.download_timeout
    }
}

/// Builder for [`GeneratorConfig`].
#[derive(Debug, Clone, Default)]
pub struct GeneratorConfigBuilder {
    config: GeneratorConfig,
}

impl GeneratorConfigBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the device label.
    pub fn device(mut self, device: impl Into<String>) -> Self {
        self.config.device = device.into();
        self
    }

    /// Sets the target image size in pixels.
    pub fn image_size(mut self, width: u32, height: u32) -> Self {
        self.config.image_size = (width, height);
        self
    }

    /// Sets the provider id (`"stability"`, `"runway"` or a custom adapter id).
    pub fn api_provider(mut self, provider: impl Into<String>) -> Self {
        self.config.api_provider = provider.into();
        self
    }

    /// Sets the API key. Falls back to the provider's env var
    /// (`STABILITY_API_KEY` or `RUNWAYML_API_SECRET`).
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = Some(key.into());
        self
    }

    /// Overrides the provider base URL.
    pub fn api_base_url(mut self, url: impl Into<String>) -> Self {
        self.config.api_base_url = Some(url.into());
        self
    }

    /// Sets the number of inference steps.
    pub fn num_inference_steps(mut self, steps: u32) -> Self {
        self.config.num_inference_steps = steps;
        self
    }

    /// Sets the guidance scale.
    pub fn guidance_scale(mut self, scale: f32) -> Self {
        self.config.guidance_scale = scale;
        self
    }

    /// Sets the delay between status polls.
    pub fn polling_interval(mut self, interval: Duration) -> Self {
        self.config.polling_interval = interval;
        self
    }

    /// Sets the maximum number of status polls.
    pub fn max_polling_attempts(mut self, attempts: u32) -> Self {
        self.config.max_polling_attempts = attempts;
        self
    }

    /// Sets the motion template file.
    pub fn motion_config_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.motion_config_path = Some(path.into());
        self
    }

    /// Sets the per-call API timeout.
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = timeout;
        self
    }

    /// Sets the download timeout.
    pub fn download_timeout(mut self, timeout: Duration) -> Self {
        self.config.download_timeout = timeout;
        self
    }

    /// Builds the configuration, resolving the API key from the environment
    /// when none was set explicitly.
    pub fn build(self) -> GeneratorConfig {
        self.config.resolve_credentials()
    }
}

/// Durations as fractional seconds on the wire.
mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(value.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = GeneratorConfig::default();
        assert_eq!(config.api_provider(), "stability");
        assert_eq!(config.image_size(), (1024, 576));
        assert_eq!(config.num_inference_steps(), 50);
        assert_eq!(config.guidance_scale(), 7.5);
        assert_eq!(config.polling_interval(), Duration::from_secs(3));
        assert_eq!(config.max_polling_attempts(), 200);
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert_eq!(config.download_timeout(), Duration::from_secs(300));
        assert!(config.api_base_url().is_none());
        assert!(config.motion_config_path().is_none());
    }

    #[test]
    fn test_builder_explicit_values_win() {
        let config = GeneratorConfig::builder()
            .api_provider("runway")
            .api_key("rw-test")
            .image_size(512, 512)
            .num_inference_steps(25)
            .polling_interval(Duration::from_millis(500))
            .max_polling_attempts(10)
            .build();

        assert_eq!(config.api_provider(), "runway");
        assert_eq!(config.api_key(), Some("rw-test"));
        assert_eq!(config.image_size(), (512, 512));
        assert_eq!(config.num_inference_steps(), 25);
        assert_eq!(config.polling_interval(), Duration::from_millis(500));
        assert_eq!(config.max_polling_attempts(), 10);
        // untouched fields keep defaults
        assert_eq!(config.guidance_scale(), 7.5);
    }

    #[test]
    fn test_builder_reads_key_from_env() {
        std::env::set_var("RUNWAYML_API_SECRET", "rw-from-env");
        let config = GeneratorConfig::builder().api_provider("runway").build();
        std::env::remove_var("RUNWAYML_API_SECRET");
        assert_eq!(config.api_key(), Some("rw-from-env"));
    }

    #[test]
    fn test_empty_key_counts_as_absent() {
        let config = GeneratorConfig::builder().api_key("  ").build();
        assert_eq!(config.api_key(), None);
    }

    #[test]
    fn test_partial_json_merges_defaults() {
        let json = r#"{"api_provider": "runway", "polling_interval": 0.5, "image_size": [640, 360]}"#;
        let config: GeneratorConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.api_provider(), "runway");
        assert_eq!(config.polling_interval(), Duration::from_millis(500));
        assert_eq!(config.image_size(), (640, 360));
        assert_eq!(config.max_polling_attempts(), 200);
        assert_eq!(config.num_inference_steps(), 50);
    }

    #[test]
    fn test_deserialized_config_resolves_like_builder() {
        let json = r#"{"api_provider": "Runway"}"#;
        let config: GeneratorConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.api_key(), None);

        let lookup = |var: &str| (var == "RUNWAYML_API_SECRET").then(|| "rw-env".to_string());
        assert_eq!(
            config.clone().resolve_credentials_with(lookup).api_key(),
            Some("rw-env")
        );

        let explicit: GeneratorConfig =
            serde_json::from_str(r#"{"api_provider": "runway", "api_key": "rw-file"}"#).unwrap();
        assert_eq!(explicit.resolve_credentials_with(lookup).api_key(), Some("rw-file"));

        let unknown: GeneratorConfig = serde_json::from_str(r#"{"api_provider": "pika"}"#).unwrap();
        assert_eq!(unknown.resolve_credentials_with(lookup).api_key(), None);
    }

    #[test]
    fn test_negative_interval_rejected() {
        let json = r#"{"polling_interval": -1}"#;
        assert!(serde_json::from_str::<GeneratorConfig>(json).is_err());
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let config = GeneratorConfig::builder().api_key("sk-secret").build();
        let debug = format!("{config:?}");
        assert!(!debug.contains("sk-secret"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_serialized_config_omits_api_key() {
        let config = GeneratorConfig::builder().api_key("sk-secret").build();
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("sk-secret"));
        assert!(json.contains("\"api_provider\":\"stability\""));
    }
}
