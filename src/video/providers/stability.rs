//! Stability AI image-to-video adapter.

use super::{endpoint, parse_id, parse_submit_error, task_endpoint};
use crate::config::GeneratorConfig;
use crate::error::{sanitize_error_message, ClipError, Result};
use crate::video::provider::ProviderAdapter;
use crate::video::types::{JobStatus, PayloadFormat, ProviderKind, SubmitRequest};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

const DEFAULT_BASE_URL: &str = "https://api.stability.ai";
const SUBMIT_PATH: &str = "v2alpha/generation/image-to-video";

/// Stability AI adapter. Sends the image as base64 inside a JSON body.
#[derive(Debug, Clone, Default)]
pub struct StabilityAdapter {
    client: reqwest::Client,
}

impl StabilityAdapter {
    /// Creates an adapter with a fresh HTTP client.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an adapter sharing an existing HTTP client.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    fn base_url<'a>(&self, config: &'a GeneratorConfig) -> &'a str {
        config.api_base_url().unwrap_or(DEFAULT_BASE_URL)
    }

    fn submit_url(&self, config: &GeneratorConfig) -> String {
        endpoint(self.base_url(config), SUBMIT_PATH)
    }

    fn poll_url(&self, config: &GeneratorConfig, task_id: &str) -> Result<String> {
        task_endpoint(self.base_url(config), &format!("{SUBMIT_PATH}/result"), task_id)
    }
}

#[async_trait]
impl ProviderAdapter for StabilityAdapter {
    fn id(&self) -> &str {
        ProviderKind::Stability.as_str()
    }

    fn payload_format(&self) -> PayloadFormat {
        PayloadFormat::Base64
    }

    async fn submit(&self, request: &SubmitRequest, config: &GeneratorConfig) -> Result<String> {
        let api_key = self.credential(config)?;
        let body = StabilityVideoRequest::from_request(request, config);

        let response = self
            .client
            .post(self.submit_url(config))
            .bearer_auth(api_key)
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
        tracing::debug!(task_id = %task_id, "submitted Stability image-to-video request");
        Ok(task_id)
    }

    async fn poll(&self, task_id: &str, config: &GeneratorConfig) -> Result<JobStatus> {
        let api_key = self.credential(config)?;

        let response = self
            .client
            .get(self.poll_url(config, task_id)?)
            .bearer_auth(api_key)
            .timeout(config.request_timeout())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ClipError::transport(status.as_u16(), &text));
        }

        let text = response.text().await?;

        let poll: StabilityPollResponse = serde_json::from_str(&text).map_err(|e| {
            ClipError::Protocol(format!(
                "Stability poll response unparseable ({e}): {}",
                sanitize_error_message(&text)
            ))
        })?;
        poll.into_status(task_id)
    }
}

#[derive(Debug, Serialize)]
struct StabilityVideoRequest {
    image: String,
    motion_bucket_id: u32,
    seed: u32,
    cfg_scale: f32,
    steps: u32,
    noise_aug_strength: f64,
}

impl StabilityVideoRequest {
    fn from_request(req: &SubmitRequest, config: &GeneratorConfig) -> Self {
        Self {
            image: req.image.to_base64(),
            motion_bucket_id: req.motion_bucket_id,
            seed: req.seed,
            cfg_scale: config.guidance_scale(),
            steps: req.steps,
            noise_aug_strength: req.noise_aug_strength,
        }
    }
}

#[derive(Debug, Deserialize)]
struct StabilityPollResponse {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    video_url: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl StabilityPollResponse {
    fn into_status(self, task_id: &str) -> Result<JobStatus> {
        let status = self.status.unwrap_or_default().to_ascii_lowercase();
        match status.as_str() {
            "pending" => Ok(JobStatus::Pending),
            "processing" => Ok(JobStatus::Processing),
            "complete" => {
                let video_url = self.video_url.filter(|u| !u.is_empty()).ok_or_else(|| {
                    ClipError::Protocol(format!(
                        "Stability task {task_id} is complete but returned no video_url"
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
                tracing::warn!(task_id = %task_id, status = %other, "unrecognized Stability job status");
                Ok(JobStatus::Unknown)
            }
        }
    }
}
