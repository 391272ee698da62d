//! Core types for image-to-video jobs.

use base64::Engine;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Built-in provider kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Stability AI image-to-video.
    Stability,
    /// Runway image-to-video.
    Runway,
}

impl ProviderKind {
    /// Returns the provider id used in configuration.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stability => "stability",
            Self::Runway => "runway",
        }
    }

    /// Looks up a built-in kind by provider id.
    pub fn from_id(id: &str) -> Option<Self> {
        match id.trim().to_ascii_lowercase().as_str() {
            "stability" => Some(Self::Stability),
            "runway" => Some(Self::Runway),
            _ => None,
        }
    }

    /// Environment variable consulted when no API key is configured.
    pub fn credential_env_var(&self) -> &'static str {
        match self {
            Self::Stability => "STABILITY_API_KEY",
            Self::Runway => "RUNWAYML_API_SECRET",
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How an adapter wants the source image delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadFormat {
    /// Base64 text of the encoded image.
    Base64,
    /// Raw encoded image bytes.
    Bytes,
}

/// PNG-encoded source image in the form an adapter consumes.
#[derive(Clone, PartialEq, Eq)]
pub enum ImagePayload {
    /// Base64 text.
    Base64(String),
    /// Raw bytes.
    Bytes(Vec<u8>),
}

impl ImagePayload {
    /// Wraps encoded image bytes in the requested format.
    pub fn encode(png: Vec<u8>, format: PayloadFormat) -> Self {
        match format {
            PayloadFormat::Base64 => {
                Self::Base64(base64::engine::general_purpose::STANDARD.encode(&png))
            }
            PayloadFormat::Bytes => Self::Bytes(png),
        }
    }

    /// Returns the payload format.
    pub fn format(&self) -> PayloadFormat {
        match self {
            Self::Base64(_) => PayloadFormat::Base64,
            Self::Bytes(_) => PayloadFormat::Bytes,
        }
    }

    /// Returns the base64 text, encoding raw bytes if needed.
    pub fn to_base64(&self) -> String {
        match self {
            Self::Base64(text) => text.clone(),
            Self::Bytes(bytes) => base64::engine::general_purpose::STANDARD.encode(bytes),
        }
    }

    /// Returns the raw bytes, decoding base64 if needed.
    pub fn to_bytes(&self) -> crate::Result<Vec<u8>> {
        match self {
            Self::Bytes(bytes) => Ok(bytes.clone()),
            Self::Base64(text) => base64::engine::general_purpose::STANDARD
                .decode(text)
                .map_err(|e| crate::ClipError::Generation(format!("invalid base64 payload: {e}"))),
        }
    }

    /// Size of the payload in bytes as it will be sent.
    pub fn len(&self) -> usize {
        match self {
            Self::Base64(text) => text.len(),
            Self::Bytes(bytes) => bytes.len(),
        }
    }

    /// Returns true if the payload is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for ImagePayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImagePayload")
            .field("format", &self.format())
            .field("len", &self.len())
            .finish()
    }
}

/// Parameters of one submission.
#[derive(Debug, Clone)]
pub struct SubmitRequest {
    /// Source image.
    pub image: ImagePayload,
    /// Motion intensity knob, 1-255.
    pub motion_bucket_id: u32,
    /// Inference steps.
    pub steps: u32,
    /// Generation seed.
    pub seed: u32,
    /// Conditioning noise strength.
    pub noise_aug_strength: f64,
}

/// Status reported by a single poll.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum JobStatus {
    /// Accepted but not started.
    Pending,
    /// Running.
    Processing,
    /// Finished; the clip is available at `video_url`.
    Succeeded { video_url: String },
    /// Provider gave up on the job.
    Failed { message: String },
    /// Status string the adapter does not recognize.
    Unknown,
}

impl JobStatus {
    /// Whether polling stops at this status.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded { .. } | Self::Failed { .. })
    }
}

/// A submitted job, alive for the duration of one generation call.
#[derive(Debug, Clone)]
pub struct GenerationJob {
    /// Provider-assigned task id.
    pub task_id: String,
    /// Id of the adapter that accepted the job.
    pub provider: String,
    /// When the submit call returned.
    pub submitted_at: Instant,
}

impl GenerationJob {
    /// Records a freshly submitted job.
    pub fn new(task_id: impl Into<String>, provider: impl Into<String>) -> Self {
        Self {
            task_id: task_id.into(),
            provider: provider.into(),
            submitted_at: Instant::now(),
        }
    }
}

/// A request to turn one image into a clip.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClipRequest {
    /// Source image on disk.
    pub image_path: PathBuf,
    /// Text hint. Current providers condition on the image only.
    pub prompt: String,
    /// Destination of the downloaded clip.
    pub output_path: PathBuf,
    /// Fixed seed; a random one is drawn when absent.
    pub seed: Option<u32>,
    /// Motion template name; the generator's motion score is used when absent.
    pub template_name: Option<String>,
}

impl ClipRequest {
    /// Creates a new request.
    pub fn new(
        image_path: impl AsRef<Path>,
        prompt: impl Into<String>,
        output_path: impl AsRef<Path>,
    ) -> Self {
        Self {
            image_path: image_path.as_ref().to_path_buf(),
            prompt: prompt.into(),
            output_path: output_path.as_ref().to_path_buf(),
            seed: None,
            template_name: None,
        }
    }

    /// Sets a fixed seed.
    pub fn with_seed(mut self, seed: u32) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Selects a motion template.
    pub fn with_template(mut self, name: impl Into<String>) -> Self {
        self.template_name = Some(name.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_kind_ids() {
        assert_eq!(ProviderKind::Stability.as_str(), "stability");
        assert_eq!(ProviderKind::Runway.to_string(), "runway");
        assert_eq!(ProviderKind::from_id(" Runway "), Some(ProviderKind::Runway));
        assert_eq!(ProviderKind::from_id("pika"), None);
    }

    #[test]
    fn test_payload_encoding() {
        let png = vec![0x89, b'P', b'N', b'G'];
        let b64 = ImagePayload::encode(png.clone(), PayloadFormat::Base64);
        assert_eq!(b64, ImagePayload::Base64("iVBORw==".to_string()));
        assert_eq!(b64.to_bytes().unwrap(), png);

        let raw = ImagePayload::encode(png.clone(), PayloadFormat::Bytes);
        assert_eq!(raw.format(), PayloadFormat::Bytes);
        assert_eq!(raw.to_base64(), "iVBORw==");
        assert_eq!(raw.len(), 4);
    }

    #[test]
    fn test_payload_debug_hides_data() {
        let payload = ImagePayload::Base64("c2VjcmV0".into());
        let debug = format!("{payload:?}");
        assert!(!debug.contains("c2VjcmV0"));
    }

    #[test]
    fn test_status_is_terminal() {
        assert!(!JobStatus::Pending.is_terminal());
        assert!(!JobStatus::Processing.is_terminal());
        assert!(!JobStatus::Unknown.is_terminal());
        assert!(JobStatus::Succeeded {
            video_url: "https://example.com/v.mp4".into()
        }
        .is_terminal());
        assert!(JobStatus::Failed {
            message: "boom".into()
        }
        .is_terminal());
    }

    #[test]
    fn test_status_serialization() {
        let status = JobStatus::Succeeded {
            video_url: "https://example.com/v.mp4".into(),
        };
        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["status"], "succeeded");
        assert_eq!(json["video_url"], "https://example.com/v.mp4");
    }

    #[test]
    fn test_clip_request_builder() {
        let req = ClipRequest::new("in.png", "a lighthouse", "out/clip.mp4")
            .with_seed(7)
            .with_template("Cinematic Slow");
        assert_eq!(req.image_path, PathBuf::from("in.png"));
        assert_eq!(req.seed, Some(7));
        assert_eq!(req.template_name.as_deref(), Some("Cinematic Slow"));
    }
}
