//! Fixed-cadence polling of a submitted job.

use crate::config::GeneratorConfig;
use crate::error::{ClipError, Result};
use crate::video::provider::ProviderAdapter;
use crate::video::types::{GenerationJob, JobStatus};
use std::time::Duration;

/// Progress is logged once every this many attempts.
const PROGRESS_EVERY: u32 = 10;

/// Drives a job from submission to a terminal status.
///
/// Each attempt sleeps `interval` and then polls once. The interval is
/// constant, so the worst-case wait is `interval * max_attempts` plus the
/// latency of the poll calls themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JobPoller {
    interval: Duration,
    max_attempts: u32,
}

impl JobPoller {
    /// Creates a poller with an explicit cadence and budget.
    pub fn new(interval: Duration, max_attempts: u32) -> Self {
        Self {
            interval,
            max_attempts,
        }
    }

    /// Creates a poller from `polling_interval` and `max_polling_attempts`.
    pub fn from_config(config: &GeneratorConfig) -> Self {
        Self::new(config.polling_interval(), config.max_polling_attempts())
    }

    /// Total sleep budget reported on timeout.
    pub fn budget(&self) -> Duration {
        self.interval.saturating_mul(self.max_attempts)
    }

    /// Polls until the job succeeds, fails or the attempt budget runs out.
    ///
    /// Returns the video URL on success. A provider-reported failure becomes
    /// [`ClipError::GenerationFailed`]; poll errors are returned as-is.
    pub async fn wait(
        &self,
        adapter: &dyn ProviderAdapter,
        job: &GenerationJob,
        config: &GeneratorConfig,
    ) -> Result<String> {
        let mut last_status: Option<JobStatus> = None;

        for attempt in 0..self.max_attempts {
            tokio::time::sleep(self.interval).await;

            let status = adapter.poll(&job.task_id, config).await?;
            if last_status.as_ref() != Some(&status) {
                tracing::debug!(
                    task_id = %job.task_id,
                    provider = %job.provider,
                    attempt = attempt + 1,
                    status = ?status,
                    "job status changed"
                );
            }

            match status {
                JobStatus::Succeeded { video_url } => {
                    tracing::debug!(
                        task_id = %job.task_id,
                        elapsed_secs = job.submitted_at.elapsed().as_secs(),
                        "job succeeded"
                    );
                    return Ok(video_url);
                }
                JobStatus::Failed { message } => {
                    return Err(ClipError::GenerationFailed(message));
                }
                other => last_status = Some(other),
            }

            if attempt % PROGRESS_EVERY == 0 {
                tracing::info!(
                    task_id = %job.task_id,
                    provider = %job.provider,
                    waited_secs = self.interval.saturating_mul(attempt).as_secs(),
                    "generation in progress"
                );
            }
        }

        tracing::warn!(
            task_id = %job.task_id,
            attempts = self.max_attempts,
            elapsed_secs = job.submitted_at.elapsed().as_secs(),
            "job did not finish within the polling budget"
        );
        Err(ClipError::Timeout(self.budget()))
    }
}
