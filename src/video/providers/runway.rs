//! Runway image-to-video adapter.
//!
//! Runway takes the source image as an uploaded file: the PNG bytes are posted
//! to `/files`, and the returned file id is referenced when creating the task.

use super::{endpoint, parse_id, parse_submit_error, task_endpoint};
use crate::config::GeneratorConfig;
use crate::error::{sanitize_error_message, ClipError, Result};
use crate::video::provider::ProviderAdapter;
use crate::video::types::{JobStatus, PayloadFormat, ProviderKind, SubmitRequest};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

const DEFAULT_BASE_URL: &str = "https://api.dev.runwayml.com/v1";
const API_VERSION_HEADER: &str = "X-Runway-Version";
const API_VERSION: &str = "2024-11-06";

/// Runway model variants.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum RunwayModel {
    /// Stable Video Diffusion (default).
    #[default]
    Svd,
    /// Any other model id accepted by the task endpoint.
    Custom(String),
}

impl RunwayModel {
    /// Returns the API model identifier string.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Svd => "svd",
            Self::Custom(id) => id,
        }
    }
}

/// Runway adapter. Uploads raw image bytes before creating the task.
#[derive(Debug, Clone, Default)]
pub struct RunwayAdapter {
    client: reqwest::Client,
    model: RunwayModel,
}

impl RunwayAdapter {
    /// Creates an adapter using the default model.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the model used for new tasks.
    pub fn with_model(mut self, model: RunwayModel) -> Self {
        self.model = model;
        self
    }

    /// Shares an existing HTTP client.
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    fn base_url<'a>(&self, config: &'a GeneratorConfig) -> &'a str {
        config.api_base_url().unwrap_or(DEFAULT_BASE_URL)
    }

    /// Uploads the image and returns the provider file id.
    async fn upload(&self, png: Vec<u8>, api_key: &str, config: &GeneratorConfig) -> Result<String> {
        let part = reqwest::multipart::Part::bytes(png)
            .file_name("image.png")
            .mime_str("image/png")
            .map_err(|e| ClipError::Generation(format!("invalid upload mime type: {e}")))?;
        let form = reqwest::multipart::Form::new().part("file", part);

        let response = self
            .client
            .post(endpoint(self.base_url(config), "files"))
            .bearer_auth(api_key)
            .header(API_VERSION_HEADER, API_VERSION)
            .timeout(config.request_timeout())
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let headers = response.headers().clone();
            let text = response.text().await.unwrap_or_default();
            return Err(parse_submit_error(self.id(), status.as_u16(), &text, &headers));
        }

        let text = response.text().await?;
        parse_id(self.id(), &text)
    }
}

#[async_trait]
impl ProviderAdapter for RunwayAdapter {
    fn id(&self) -> &str {
        ProviderKind::Runway.as_str()
    }

    fn payload_format(&self) -> PayloadFormat {
        PayloadFormat::Bytes
    }

    async fn submit(&self, request: &SubmitRequest, config: &GeneratorConfig) -> Result<String> {
        let api_key = self.credential(config)?;

        let image_id = self.upload(request.image.to_bytes()?, api_key, config).await?;
        tracing::debug!(image_id = %image_id, "uploaded source image to Runway");

        let body = RunwayTaskRequest::from_request(request, &self.model, image_id);
        let response = self
            .client
            .post(endpoint(self.base_url(config), "generate"))
            .bearer_auth(api_key)
            .header(API_VERSION_HEADER, API_VERSION)
            .timeout(config.request_timeout())
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let headers = response.headers().clone();
            let text = response.text().await.unwrap_or_default();
            return Err(parse_submit_error(self.id(), status.as_u16(), &text, &headers));
        }

        let text = response.text().await?;
        let task_id = parse_id(self.id(), &text)?;
        tracing::debug!(task_id = %task_id, model = %self.model.as_str(), "created Runway task");
        Ok(task_id)
    }

    async fn poll(&self, task_id: &str, config: &GeneratorConfig) -> Result<JobStatus> {
        let api_key = self.credential(config)?;

        let response = self
            .client
            .get(task_endpoint(self.base_url(config), "tasks", task_id)?)
            .bearer_auth(api_key)
            .header(API_VERSION_HEADER, API_VERSION)
            .timeout(config.request_timeout())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ClipError::transport(status.as_u16(), &text));
        }

        let text = response.text().await?;

        let task: RunwayTaskResponse = serde_json::from_str(&text).map_err(|e| {
            ClipError::Protocol(format!(
                "Runway task response unparseable ({e}): {}",
                sanitize_error_message(&text)
            ))
        })?;
        task.into_status(task_id)
    }
}

#[derive(Debug, Serialize)]
struct RunwayTaskRequest {
    model: String,
    image_id: String,
    motion_bucket_id: u32,
    steps: u32,
    seed: u32,
    noise_aug_strength: f64,
}

impl RunwayTaskRequest {
    fn from_request(req: &SubmitRequest, model: &RunwayModel, image_id: String) -> Self {
        Self {
            model: model.as_str().to_string(),
            image_id,
            motion_bucket_id: req.motion_bucket_id,
            steps: req.steps,
            seed: req.seed,
            noise_aug_strength: req.noise_aug_strength,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RunwayTaskResponse {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    output: Option<RunwayOutput>,
    #[serde(default, alias = "failure")]
    error: Option<String>,
}

/// Task output, either `{"video_url": ..}` or a list of URLs.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RunwayOutput {
    Object {
        #[serde(default)]
        video_url: Option<String>,
    },
    Urls(Vec<String>),
}

impl RunwayOutput {
    fn into_video_url(self) -> Option<String> {
        match self {
            Self::Object { video_url } => video_url,
            Self::Urls(urls) => urls.into_iter().next(),
        }
    }
}

impl RunwayTaskResponse {
    fn into_status(self, task_id: &str) -> Result<JobStatus> {
        let status = self.status.unwrap_or_default().to_ascii_lowercase();
        match status.as_str() {
            "pending" | "throttled" => Ok(JobStatus::Pending),
            "running" => Ok(JobStatus::Processing),
            "succeeded" => {
                let video_url = self
                    .output
                    .and_then(RunwayOutput::into_video_url)
                    .filter(|u| !u.is_empty())
                    .ok_or_else(|| {
                        ClipError::Protocol(format!(
                            "Runway task {task_id} succeeded but returned no video URL"
                        ))
                    })?;
                Ok(JobStatus::Succeeded { video_url })
            }
            "failed" => Ok(JobStatus::Failed {
                message: self
                    .error
                    .map(|e| sanitize_error_message(&e))
                    .unwrap_or_else(|| "unknown error".into()),
            }),
            other => {
                tracing::warn!(task_id = %task_id, status = %other, "unrecognized Runway task status");
                Ok(JobStatus::Unknown)
            }
        }
    }
}
