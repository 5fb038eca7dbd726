//! Waiting for a submitted job to finish.

use crate::error::{ClipcastError, Result};
use crate::video::{Job, JobStatus, VideoProvider};
use std::time::Duration;
use tokio::time::Instant;

/// Width of the textual progress bar.
pub const PROGRESS_BAR_WIDTH: usize = 30;

/// How the pipeline waits between submission and download.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitStrategy {
    /// Re-fetch the job every `interval` until it is terminal.
    ///
    /// With no `timeout` a job that never finishes is polled forever.
    Poll {
        interval: Duration,
        timeout: Option<Duration>,
    },
    /// Sleep once for `delay` and assume the job is done.
    FixedDelay { delay: Duration },
}

impl WaitStrategy {
    /// Default polling interval.
    pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(10);
    /// Default blind wait.
    pub const DEFAULT_DELAY: Duration = Duration::from_secs(25);

    /// Polls every `interval` with no timeout.
    pub fn poll(interval: Duration) -> Self {
        Self::Poll {
            interval,
            timeout: None,
        }
    }

    /// Sleeps once for `delay`.
    pub fn fixed_delay(delay: Duration) -> Self {
        Self::FixedDelay { delay }
    }
}

impl Default for WaitStrategy {
    fn default() -> Self {
        Self::poll(Self::DEFAULT_INTERVAL)
    }
}

/// Result of waiting on a job.
#[derive(Debug, Clone)]
pub enum WaitOutcome {
    /// The job was observed as completed.
    Completed(Job),
    /// The fixed delay elapsed; the job state was never checked.
    Elapsed,
}

/// Waits for `job` according to `strategy`.
///
/// `observer` sees every job state fetched while polling, including the
/// final one. It is never called for [`WaitStrategy::FixedDelay`].
pub async fn wait_for_job<P, F>(
    provider: &P,
    job: &Job,
    strategy: WaitStrategy,
    mut observer: F,
) -> Result<WaitOutcome>
where
    P: VideoProvider + ?Sized,
    F: FnMut(&Job),
{
    match strategy {
        WaitStrategy::FixedDelay { delay } => {
            tracing::info!(job_id = %job.id, delay_secs = delay.as_secs(), "waiting fixed delay");
            tokio::time::sleep(delay).await;
            Ok(WaitOutcome::Elapsed)
        }
        WaitStrategy::Poll { interval, timeout } => {
            if job.status.is_terminal() {
                return settle(job.clone()).map(WaitOutcome::Completed);
            }
            poll_until_terminal(provider, &job.id, job.status, interval, timeout, &mut observer)
                .await
                .map(WaitOutcome::Completed)
        }
    }
}

async fn poll_until_terminal<P, F>(
    provider: &P,
    job_id: &str,
    initial: JobStatus,
    interval: Duration,
    timeout: Option<Duration>,
    observer: &mut F,
) -> Result<Job>
where
    P: VideoProvider + ?Sized,
    F: FnMut(&Job),
{
    let start = Instant::now();
    let mut last = initial;

    loop {
        let job = provider.retrieve(job_id).await?;
        observer(&job);

        if job.status.rank() < last.rank() {
            tracing::warn!(
                job_id,
                from = %last,
                to = %job.status,
                "job status moved backwards"
            );
        }
        last = job.status;

        match job.status {
            JobStatus::Completed | JobStatus::Failed => return settle(job),
            JobStatus::Queued | JobStatus::InProgress => {
                tracing::debug!(
                    job_id,
                    status = %job.status,
                    progress = job.progress,
                    elapsed_secs = start.elapsed().as_secs(),
                    "polling video generation"
                );
            }
            JobStatus::Unknown => {
                return Err(ClipcastError::UnexpectedStatus(job.status.to_string()));
            }
        }

        if let Some(limit) = timeout {
            if start.elapsed() + interval > limit {
                return Err(ClipcastError::Timeout(limit));
            }
        }
        tokio::time::sleep(interval).await;
    }
}

/// Turns a terminal job into success or the matching error.
fn settle(job: Job) -> Result<Job> {
    match job.status {
        JobStatus::Completed => Ok(job),
        JobStatus::Failed => {
            if job.moderation_code().is_some() {
                return Err(ClipcastError::ContentBlocked(job.failure_message()));
            }
            Err(ClipcastError::JobFailed(job.failure_message()))
        }
        other => Err(ClipcastError::UnexpectedStatus(other.to_string())),
    }
}

/// Renders `Queued: [=====-----] 42.0%` for a job.
pub fn render_progress(job: &Job) -> String {
    let progress = job.progress.clamp(0.0, 100.0);
    let filled = ((progress / 100.0) * PROGRESS_BAR_WIDTH as f32) as usize;
    let filled = filled.min(PROGRESS_BAR_WIDTH);
    let label = if job.status == JobStatus::Queued {
        "Queued"
    } else {
        "Processing"
    };
    format!(
        "{label}: [{}{}] {:.1}%",
        "=".repeat(filled),
        "-".repeat(PROGRESS_BAR_WIDTH - filled),
        progress
    )
}
