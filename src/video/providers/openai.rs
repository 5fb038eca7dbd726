//! Sora (OpenAI) video generation provider.

use crate::error::{parse_retry_after, sanitize_error_message, ClipcastError, Result};
use crate::video::provider::VideoProvider;
use crate::video::types::{ContentVariant, Job, VideoGenerationRequest};
use async_trait::async_trait;
use serde::Serialize;
use std::path::Path;
use tokio::io::AsyncWriteExt;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Sora model variants.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SoraModel {
    /// Sora 2 - OpenAI's video generation model.
    #[default]
    Sora2,
    /// Sora 2 Pro - higher fidelity, larger sizes.
    Sora2Pro,
}

impl SoraModel {
    /// Returns the API model identifier string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sora2 => "sora-2",
            Self::Sora2Pro => "sora-2-pro",
        }
    }
}

impl std::str::FromStr for SoraModel {
    type Err = ClipcastError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "sora-2" => Ok(Self::Sora2),
            "sora-2-pro" => Ok(Self::Sora2Pro),
            other => Err(ClipcastError::InvalidRequest(format!(
                "unknown Sora model: {other}"
            ))),
        }
    }
}

/// Builder for SoraProvider.
#[derive(Debug, Clone, Default)]
pub struct SoraProviderBuilder {
    api_key: Option<String>,
    model: SoraModel,
    base_url: Option<String>,
}

impl SoraProviderBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the API key. Falls back to `OPENAI_API_KEY` env var.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Sets the Sora model variant.
    pub fn model(mut self, model: SoraModel) -> Self {
        self.model = model;
        self
    }

    /// Overrides the API base URL (defaults to `https://api.openai.com/v1`).
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Builds the provider, resolving the API key.
    pub fn build(self) -> Result<SoraProvider> {
        let api_key = self
            .api_key
            .or_else(|| std::env::var(crate::config::OPENAI_API_KEY).ok())
            .filter(|k| !k.is_empty())
            .ok_or(ClipcastError::MissingEnv(crate::config::OPENAI_API_KEY))?;

        let base_url = self
            .base_url
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        Ok(SoraProvider {
            client: reqwest::Client::new(),
            api_key,
            model: self.model,
            base_url,
        })
    }
}

/// Sora video generation provider.
pub struct SoraProvider {
    client: reqwest::Client,
    api_key: String,
    model: SoraModel,
    base_url: String,
}

impl SoraProvider {
    /// Creates a new `SoraProviderBuilder`.
    pub fn builder() -> SoraProviderBuilder {
        SoraProviderBuilder::new()
    }

    /// Returns the configured model.
    pub fn model(&self) -> SoraModel {
        self.model
    }

    fn videos_url(&self) -> String {
        format!("{}/videos", self.base_url)
    }

    async fn error_from_response(response: reqwest::Response) -> ClipcastError {
        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let text = response.text().await.unwrap_or_default();
        parse_error(status, &text, &headers)
    }
}

#[async_trait]
impl VideoProvider for SoraProvider {
    async fn create(&self, request: &VideoGenerationRequest) -> Result<Job> {
        if request.prompt.trim().is_empty() {
            return Err(ClipcastError::InvalidRequest("prompt is empty".into()));
        }

        let body = SoraRequest::from_request(request, &self.model);

        let response = self
            .client
            .post(self.videos_url())
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }

        let job: Job = response.json().await?;
        tracing::debug!(
            job_id = %job.id,
            status = %job.status,
            model = %body.model,
            "submitted Sora video generation request"
        );
        Ok(job)
    }

    async fn retrieve(&self, job_id: &str) -> Result<Job> {
        let url = format!("{}/{}", self.videos_url(), job_id);

        let response = self
            .client
            .get(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }

        Ok(response.json().await?)
    }

    async fn download_content(
        &self,
        job_id: &str,
        variant: ContentVariant,
        path: &Path,
    ) -> Result<u64> {
        let url = format!("{}/{}/content", self.videos_url(), job_id);

        let mut response = self
            .client
            .get(&url)
            .query(&[("variant", variant.as_str())])
            .header("Authorization", format!("Bearer {}", self.api_key))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ClipcastError::Api {
                status: status.as_u16(),
                message: format!(
                    "failed to download {}: {}",
                    variant.as_str(),
                    sanitize_error_message(&text)
                ),
            });
        }

        let mut file = tokio::fs::File::create(path).await?;
        let mut written = 0u64;
        while let Some(chunk) = response.chunk().await? {
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;

        tracing::debug!(job_id, bytes = written, path = %path.display(), "downloaded video content");
        Ok(written)
    }

    fn name(&self) -> &str {
        "Sora (OpenAI)"
    }
}

fn parse_error(status: u16, text: &str, headers: &reqwest::header::HeaderMap) -> ClipcastError {
    let text = sanitize_error_message(text);
    if status == 429 {
        // insufficient_quota will not clear by waiting
        if text.contains("insufficient_quota") || text.contains("exceeded your current quota") {
            return ClipcastError::Api {
                status,
                message: text,
            };
        }
        return ClipcastError::RateLimited {
            retry_after: parse_retry_after(headers),
        };
    }
    if status == 401 || status == 403 {
        return ClipcastError::Auth(text);
    }
    let lower = text.to_lowercase();
    if lower.contains("moderation") || lower.contains("safety") || lower.contains("content_policy")
    {
        return ClipcastError::ContentBlocked(text);
    }
    ClipcastError::Api {
        status,
        message: text,
    }
}

// Request types

#[derive(Debug, Serialize)]
struct SoraRequest {
    model: String,
    prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    size: Option<String>,
    /// Video duration: "4", "8", or "12" seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    seconds: Option<String>,
}

impl SoraRequest {
    /// Valid Sora duration values in seconds.
    const VALID_DURATIONS: [u32; 3] = [4, 8, 12];

    fn from_request(req: &VideoGenerationRequest, model: &SoraModel) -> Self {
        let size = req.resolution.clone().or_else(|| {
            req.aspect_ratio.as_ref().map(|ar| match ar.as_str() {
                "16:9" => "1280x720".to_string(),
                "9:16" => "720x1280".to_string(),
                other => other.to_string(),
            })
        });

        let seconds = req.duration_secs.map(|d| {
            let nearest = Self::nearest_duration(d);
            if nearest != d {
                tracing::warn!(
                    requested = d,
                    using = nearest,
                    "Sora accepts 4, 8 or 12 seconds; adjusting duration"
                );
            }
            nearest.to_string()
        });

        Self {
            model: model.as_str().to_string(),
            prompt: req.prompt.clone(),
            size,
            seconds,
        }
    }

    fn nearest_duration(requested: u32) -> u32 {
        Self::VALID_DURATIONS
            .iter()
            .min_by_key(|&&v| (v as i64 - requested as i64).unsigned_abs())
            .copied()
            .unwrap_or(4)
    }
}
