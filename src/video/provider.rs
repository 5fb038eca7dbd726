//! Video job API trait.

use crate::error::Result;
use crate::video::types::{ContentVariant, Job, VideoGenerationRequest};
use async_trait::async_trait;
use std::path::Path;

/// Trait for asynchronous video generation services.
///
/// A job is created once, re-fetched until it reaches a terminal state, then
/// its content is downloaded. Implementations never retry.
#[async_trait]
pub trait VideoProvider: Send + Sync {
    /// Submits a generation request and returns the freshly created job.
    async fn create(&self, request: &VideoGenerationRequest) -> Result<Job>;

    /// Fetches the current state of a job.
    async fn retrieve(&self, job_id: &str) -> Result<Job>;

    /// Streams the content of a finished job into `path`, returning bytes written.
    async fn download_content(
        &self,
        job_id: &str,
        variant: ContentVariant,
        path: &Path,
    ) -> Result<u64>;

    /// Returns the name of this provider for display.
    fn name(&self) -> &str;
}
