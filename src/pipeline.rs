//! Submit → wait → download → upload.

use crate::config::Config;
use crate::error::Result;
use crate::poller::{wait_for_job, WaitOutcome, WaitStrategy};
use crate::telegram::TelegramUploader;
use crate::video::providers::{SoraModel, SoraProvider};
use crate::video::{Artifact, ContentVariant, Job, VideoGenerationRequest, VideoProvider};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::time::Instant;

/// File the artifact is written to when no path is given.
pub const DEFAULT_OUTPUT: &str = "sora_video.mp4";

/// Summary of a finished run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// Id of the generation job.
    pub job_id: String,
    /// The downloaded file.
    pub artifact: Artifact,
    /// Telegram message id, if the video was sent and the API reported one.
    pub message_id: Option<i64>,
    /// Whether the video was posted to the chat.
    pub delivered: bool,
    /// Wall-clock duration of the whole run in milliseconds.
    pub duration_ms: u64,
}

/// One generate-and-deliver run.
pub struct Pipeline<P> {
    provider: P,
    uploader: Option<TelegramUploader>,
    wait: WaitStrategy,
    output: PathBuf,
}

impl Pipeline<SoraProvider> {
    /// Builds a Sora + Telegram pipeline from resolved configuration.
    pub fn from_config(config: &Config, model: SoraModel) -> Result<Self> {
        let mut provider = SoraProvider::builder()
            .api_key(config.openai_api_key.clone())
            .model(model);
        if let Some(url) = &config.openai_base_url {
            provider = provider.base_url(url.clone());
        }

        let mut uploader = TelegramUploader::builder()
            .bot_token(config.telegram_bot_token.clone())
            .chat_id(config.telegram_chat_id.clone());
        if let Some(url) = &config.telegram_api_url {
            uploader = uploader.api_url(url.clone());
        }

        Ok(Self::new(provider.build()?, Some(uploader.build()?)))
    }
}

impl<P: VideoProvider> Pipeline<P> {
    /// Creates a pipeline; with no uploader the run stops after download.
    pub fn new(provider: P, uploader: Option<TelegramUploader>) -> Self {
        Self {
            provider,
            uploader,
            wait: WaitStrategy::default(),
            output: PathBuf::from(DEFAULT_OUTPUT),
        }
    }

    /// Sets how to wait for the job.
    pub fn with_wait(mut self, wait: WaitStrategy) -> Self {
        self.wait = wait;
        self
    }

    /// Sets where the artifact is written.
    pub fn with_output(mut self, path: impl Into<PathBuf>) -> Self {
        self.output = path.into();
        self
    }

    /// Drops the uploader so the run ends after download.
    pub fn without_upload(mut self) -> Self {
        self.uploader = None;
        self
    }

    /// Returns the underlying provider.
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Runs every stage in order, aborting on the first error.
    pub async fn run<F>(
        &self,
        request: &VideoGenerationRequest,
        caption: &str,
        observer: F,
    ) -> Result<RunReport>
    where
        F: FnMut(&Job),
    {
        let start = Instant::now();

        let job = self.provider.create(request).await?;
        tracing::info!(job_id = %job.id, provider = self.provider.name(), "video generation started");

        match wait_for_job(&self.provider, &job, self.wait, observer).await? {
            WaitOutcome::Completed(_) => {
                tracing::info!(job_id = %job.id, "video generation completed")
            }
            WaitOutcome::Elapsed => {
                tracing::info!(job_id = %job.id, "wait elapsed, downloading without status check")
            }
        }

        let artifact = download(&self.provider, &job.id, ContentVariant::Video, &self.output).await?;
        tracing::info!(
            path = %artifact.path.display(),
            bytes = artifact.size_bytes,
            "video saved"
        );

        let delivery = match &self.uploader {
            Some(uploader) => {
                let delivery = uploader.send_video(&artifact.path, caption).await?;
                tracing::info!(chat_id = uploader.chat_id(), "video sent to Telegram");
                Some(delivery)
            }
            None => None,
        };

        Ok(RunReport {
            job_id: job.id,
            artifact,
            delivered: delivery.is_some(),
            message_id: delivery.and_then(|d| d.message_id),
            duration_ms: start.elapsed().as_millis() as u64,
        })
    }
}

/// Downloads a job's content to `path`, replacing any existing file.
pub async fn download<P>(
    provider: &P,
    job_id: &str,
    variant: ContentVariant,
    path: &Path,
) -> Result<Artifact>
where
    P: VideoProvider + ?Sized,
{
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    let size_bytes = provider.download_content(job_id, variant, path).await?;
    Ok(Artifact {
        job_id: job_id.to_string(),
        path: path.to_path_buf(),
        size_bytes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::video::JobStatus;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Completes immediately and records calls.
    #[derive(Default)]
    struct InstantJob {
        calls: Mutex<Vec<&'static str>>,
    }

    #[async_trait]
    impl VideoProvider for InstantJob {
        async fn create(&self, _request: &VideoGenerationRequest) -> Result<Job> {
            self.calls.lock().unwrap().push("create");
            Ok(serde_json::from_value(serde_json::json!({
                "id": "abc123",
                "status": "queued"
            }))?)
        }

        async fn retrieve(&self, job_id: &str) -> Result<Job> {
            self.calls.lock().unwrap().push("retrieve");
            Ok(serde_json::from_value(serde_json::json!({
                "id": job_id,
                "status": "completed",
                "progress": 100
            }))?)
        }

        async fn download_content(
            &self,
            _job_id: &str,
            _variant: ContentVariant,
            path: &Path,
        ) -> Result<u64> {
            self.calls.lock().unwrap().push("download");
            tokio::fs::write(path, b"video").await?;
            Ok(5)
        }

        fn name(&self) -> &str {
            "instant"
        }
    }

    #[tokio::test]
    async fn test_run_without_upload() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("nested").join("out.mp4");
        let pipeline = Pipeline::new(InstantJob::default(), None)
            .with_wait(WaitStrategy::poll(Duration::from_millis(1)))
            .with_output(&out);

        let mut statuses = Vec::new();
        let report = pipeline
            .run(&VideoGenerationRequest::new("x"), "", |j| statuses.push(j.status))
            .await
            .unwrap();

        assert_eq!(report.job_id, "abc123");
        assert!(!report.delivered);
        assert_eq!(report.artifact.size_bytes, 5);
        assert_eq!(std::fs::read(&out).unwrap(), b"video");
        assert_eq!(statuses, vec![JobStatus::Completed]);
        assert_eq!(
            *pipeline.provider().calls.lock().unwrap(),
            vec!["create", "retrieve", "download"]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_fixed_delay_skips_retrieve() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = Pipeline::new(InstantJob::default(), None)
            .with_wait(WaitStrategy::fixed_delay(WaitStrategy::DEFAULT_DELAY))
            .with_output(dir.path().join("out.mp4"));

        pipeline
            .run(&VideoGenerationRequest::new("x"), "", |_| {})
            .await
            .unwrap();

        assert_eq!(
            *pipeline.provider().calls.lock().unwrap(),
            vec!["create", "download"]
        );
    }

    #[tokio::test]
    async fn test_download_overwrites_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out.mp4");
        std::fs::write(&out, b"an older and longer video file").unwrap();

        let artifact = download(&InstantJob::default(), "abc123", ContentVariant::Video, &out)
            .await
            .unwrap();

        assert_eq!(artifact.job_id, "abc123");
        assert_eq!(std::fs::read(&out).unwrap(), b"video");
    }

    #[test]
    fn test_from_config_builds_both_clients() {
        let config = Config::from_lookup(|key| match key {
            "OPENAI_API_KEY" => Some("sk-test".into()),
            "TELEGRAM_BOT_TOKEN" => Some("1:x".into()),
            "TELEGRAM_CHAT_ID" => Some("5".into()),
            _ => None,
        })
        .unwrap();
        let pipeline = Pipeline::from_config(&config, SoraModel::Sora2Pro).unwrap();
        assert_eq!(pipeline.provider().model(), SoraModel::Sora2Pro);
        assert!(pipeline.uploader.is_some());
        assert!(pipeline.without_upload().uploader.is_none());
    }
}
