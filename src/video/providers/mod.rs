//! Image-to-video provider adapters.

#[cfg(feature = "stability")]
mod stability;
#[cfg(feature = "stability")]
pub use stability::StabilityAdapter;

#[cfg(feature = "runway")]
mod runway;
#[cfg(feature = "runway")]
pub use runway::{RunwayAdapter, RunwayModel};

use crate::error::{parse_retry_after, sanitize_error_message, ClipError, Result};
use serde::Deserialize;
use std::time::Duration;

/// Maps a non-2xx submit response onto the error kinds callers branch on.
#[cfg_attr(not(any(feature = "stability", feature = "runway")), allow(dead_code))]
pub(crate) fn parse_submit_error(
    provider: &str,
    status: u16,
    text: &str,
    headers: &reqwest::header::HeaderMap,
) -> ClipError {
    let text = sanitize_error_message(text);
    match status {
        401 | 403 => ClipError::Auth(format!("{provider} rejected the API key: {text}")),
        402 => ClipError::QuotaExceeded(format!("{provider} account has insufficient credits: {text}")),
        429 => ClipError::RateLimited {
            message: format!("{provider}: {text}"),
            retry_after: parse_retry_after(headers).map(Duration::from_secs),
        },
        _ => ClipError::Transport {
            status: Some(status),
            message: format!("{provider} request failed with HTTP {status}: {text}"),
        },
    }
}

#[derive(Debug, Deserialize)]
struct IdResponse {
    #[serde(default)]
    id: Option<String>,
}

/// Extracts the `id` field from a successful response body.
#[cfg_attr(not(any(feature = "stability", feature = "runway")), allow(dead_code))]
pub(crate) fn parse_id(provider: &str, body: &str) -> Result<String> {
    let parsed: IdResponse = serde_json::from_str(body).map_err(|e| {
        ClipError::Protocol(format!(
            "{provider} returned an unparseable response ({e}): {}",
            sanitize_error_message(body)
        ))
    })?;
    parsed.id.filter(|id| !id.is_empty()).ok_or_else(|| {
        ClipError::Protocol(format!(
            "{provider} response is missing 'id': {}",
            sanitize_error_message(body)
        ))
    })
}

/// Joins an endpoint path onto a base URL.
#[cfg_attr(not(any(feature = "stability", feature = "runway")), allow(dead_code))]
pub(crate) fn endpoint(base_url: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Joins `path` onto a base URL and appends `task_id` as one escaped path segment.
#[cfg_attr(not(any(feature = "stability", feature = "runway")), allow(dead_code))]
pub(crate) fn task_endpoint(base_url: &str, path: &str, task_id: &str) -> Result<String> {
    let invalid = |reason: String| ClipError::Transport {
        status: None,
        message: format!("invalid base URL {base_url}: {reason}"),
    };
    let mut url = reqwest::Url::parse(&endpoint(base_url, path)).map_err(|e| invalid(e.to_string()))?;
    url.path_segments_mut()
        .map_err(|_| invalid("cannot carry a path".into()))?
        .push(task_id);
    Ok(url.to_string())
}
