//! Error types for clip generation.

use std::path::PathBuf;
use std::time::Duration;

/// Maximum number of characters of a provider response kept in error messages.
const MAX_ERROR_MESSAGE_CHARS: usize = 500;

/// Errors that can occur during clip generation.
#[derive(Debug, thiserror::Error)]
pub enum ClipError {
    /// No API key configured for the selected provider.
    #[error("missing credential: no API key configured for provider '{0}'")]
    MissingCredential(String),

    /// API key rejected by the provider.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// Account has no remaining credits.
    #[error("quota exceeded: {0}")]
    QuotaExceeded(String),

    /// Rate limit exceeded.
    #[error("rate limited (retry after {retry_after:?}): {message}")]
    RateLimited {
        message: String,
        retry_after: Option<Duration>,
    },

    /// Network failure or unexpected HTTP status.
    #[error("transport error: {message}")]
    Transport {
        status: Option<u16>,
        message: String,
    },

    /// Provider answered successfully but the body is missing expected fields.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Motion template name not present in the loaded set.
    #[error("unknown motion template '{name}', available templates: {}", .available.join(", "))]
    UnknownTemplate {
        name: String,
        available: Vec<String>,
    },

    /// Motion template file is not valid structured data.
    #[error("invalid motion template file {}: {message}", .path.display())]
    ConfigFormat { path: PathBuf, message: String },

    /// Motion template file exists but could not be read.
    #[error("failed to read motion template file {}: {source}", .path.display())]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// No adapter registered for the configured provider id.
    #[error("unsupported provider: {0}")]
    UnsupportedProvider(String),

    /// Source image does not exist.
    #[error("image not found: {}", .0.display())]
    ImageNotFound(PathBuf),

    /// Provider reported that the job failed.
    #[error("video generation failed: {0}")]
    GenerationFailed(String),

    /// Poll budget exhausted before the job reached a terminal state.
    #[error("generation timed out after {0:?}")]
    Timeout(Duration),

    /// Fetching the finished video failed.
    #[error("download failed: {0}")]
    Download(String),

    /// Any other failure.
    #[error("generation error: {0}")]
    Generation(String),
}

impl ClipError {
    /// Returns true if this error is likely transient and worth retrying.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::RateLimited { .. } | Self::Timeout(_) | Self::Transport { .. }
        )
    }

    /// Returns the suggested retry delay, if available.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimited { retry_after, .. } => *retry_after,
            Self::Transport { .. } => Some(Duration::from_secs(2)),
            _ => None,
        }
    }

    pub(crate) fn transport(status: u16, text: &str) -> Self {
        Self::Transport {
            status: Some(status),
            message: format!("HTTP {status}: {}", sanitize_error_message(text)),
        }
    }
}

impl From<reqwest::Error> for ClipError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport {
            status: err.status().map(|s| s.as_u16()),
            message: err.to_string(),
        }
    }
}

impl From<std::io::Error> for ClipError {
    fn from(err: std::io::Error) -> Self {
        Self::Generation(format!("I/O error: {err}"))
    }
}

impl From<image::ImageError> for ClipError {
    fn from(err: image::ImageError) -> Self {
        Self::Generation(format!("image processing failed: {err}"))
    }
}

/// Result type alias for clip generation operations.
pub type Result<T> = std::result::Result<T, ClipError>;

/// Trims a provider error body to a bounded, single-line message.
pub(crate) fn sanitize_error_message(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return "<empty response body>".to_string();
    }
    let single_line: String = trimmed
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect();
    if single_line.chars().count() > MAX_ERROR_MESSAGE_CHARS {
        let truncated: String = single_line.chars().take(MAX_ERROR_MESSAGE_CHARS).collect();
        format!("{truncated}...")
    } else {
        single_line
    }
}

/// Reads a `Retry-After` header expressed in whole seconds.
pub(crate) fn parse_retry_after(headers: &reqwest::header::HeaderMap) -> Option<u64> {
    headers
        .get(reqwest::header::RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()
}
