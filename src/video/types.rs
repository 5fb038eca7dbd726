//! Core types for video generation jobs.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Lifecycle state of a remote generation job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Queued,
    InProgress,
    Completed,
    Failed,
    /// Any status string the service adds later.
    #[serde(other)]
    Unknown,
}

impl JobStatus {
    /// Returns true once no further transition can occur.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Position along queued → in_progress → terminal, used to spot regressions.
    pub(crate) fn rank(&self) -> u8 {
        match self {
            Self::Queued => 0,
            Self::InProgress => 1,
            Self::Completed | Self::Failed => 2,
            Self::Unknown => 0,
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Queued => write!(f, "queued"),
            Self::InProgress => write!(f, "in_progress"),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// Error details attached to a failed job.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobError {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
}

/// A remote video generation job as last observed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    /// Opaque job identifier.
    pub id: String,
    /// Current status.
    pub status: JobStatus,
    /// Completion percentage, 0-100.
    #[serde(default)]
    pub progress: f32,
    /// Error details, present when the job failed.
    #[serde(default)]
    pub error: Option<JobError>,
    /// Free-form failure text some responses use instead of `error`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seconds: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<i64>,
}

impl Job {
    /// Message explaining a failure, falling back to a generic one.
    pub fn failure_message(&self) -> String {
        self.error
            .as_ref()
            .and_then(|e| e.message.clone())
            .or_else(|| self.failure_reason.clone())
            .unwrap_or_else(|| "Video generation failed".into())
    }

    /// Returns the error code when the job was blocked by moderation.
    pub fn moderation_code(&self) -> Option<&str> {
        self.error
            .as_ref()
            .and_then(|e| e.code.as_deref())
            .filter(|code| matches!(*code, "moderation_blocked" | "sentinel_block"))
    }
}

/// Which rendition of a finished job to download.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentVariant {
    #[default]
    Video,
    Thumbnail,
    Spritesheet,
}

impl ContentVariant {
    /// Returns the API query value.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Video => "video",
            Self::Thumbnail => "thumbnail",
            Self::Spritesheet => "spritesheet",
        }
    }
}

/// A request to generate a video.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoGenerationRequest {
    /// The text prompt describing the desired video.
    pub prompt: String,
    /// Desired video duration in seconds (4, 8 or 12 for Sora).
    pub duration_secs: Option<u32>,
    /// Resolution as `WIDTHxHEIGHT` (e.g., "720x1280").
    pub resolution: Option<String>,
    /// Aspect ratio (e.g., "9:16"), used when no resolution is set.
    pub aspect_ratio: Option<String>,
}

impl VideoGenerationRequest {
    /// Creates a new request with the given prompt.
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            duration_secs: None,
            resolution: None,
            aspect_ratio: None,
        }
    }

    /// Sets the desired video duration in seconds.
    pub fn with_duration(mut self, secs: u32) -> Self {
        self.duration_secs = Some(secs);
        self
    }

    /// Sets the resolution.
    pub fn with_resolution(mut self, resolution: impl Into<String>) -> Self {
        self.resolution = Some(resolution.into());
        self
    }

    /// Sets the aspect ratio.
    pub fn with_aspect_ratio(mut self, ratio: impl Into<String>) -> Self {
        self.aspect_ratio = Some(ratio.into());
        self
    }
}

/// A downloaded video file on local disk.
#[derive(Debug, Clone, Serialize)]
pub struct Artifact {
    /// Job that produced this file.
    pub job_id: String,
    /// Where the file was written.
    pub path: PathBuf,
    /// Bytes written.
    pub size_bytes: u64,
}
