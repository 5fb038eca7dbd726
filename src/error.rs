//! Error types for the generate-and-deliver pipeline.

use std::time::Duration;

/// Longest error body kept verbatim before truncation.
const MAX_ERROR_BODY: usize = 500;

/// Errors that can occur while generating or delivering a video.
#[derive(Debug, thiserror::Error)]
pub enum ClipcastError {
    /// A required environment variable is absent or empty.
    #[error("missing required environment variable: {0}")]
    MissingEnv(&'static str),

    /// API key missing or rejected.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Rate limit or quota exceeded.
    #[error("rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Option<Duration> },

    /// The job did not reach a terminal state within the configured timeout.
    #[error("operation timed out after {0:?}")]
    Timeout(Duration),

    /// Content was blocked by safety filters.
    #[error("content blocked: {0}")]
    ContentBlocked(String),

    /// The remote service reported the job as failed.
    #[error("video generation failed: {0}")]
    JobFailed(String),

    /// The job reported a status this crate does not know about.
    #[error("unexpected job status: {0}")]
    UnexpectedStatus(String),

    /// The chat endpoint rejected the upload.
    #[error("upload rejected: {status} - {body}")]
    Upload { status: u16, body: String },

    /// Invalid request parameters.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Network or HTTP error.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// I/O error (e.g., writing the artifact).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, ClipcastError>;

/// Reads a `Retry-After` header expressed in whole seconds.
pub(crate) fn parse_retry_after(headers: &reqwest::header::HeaderMap) -> Option<Duration> {
    headers
        .get(reqwest::header::RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}

/// Collapses whitespace, redacts credentials and truncates an error body.
pub(crate) fn sanitize_error_message(text: &str) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    let redacted = collapsed
        .split(' ')
        .map(redact_word)
        .collect::<Vec<_>>()
        .join(" ");

    if redacted.chars().count() > MAX_ERROR_BODY {
        let truncated: String = redacted.chars().take(MAX_ERROR_BODY).collect();
        format!("{truncated}...")
    } else {
        redacted
    }
}

fn redact_word(word: &str) -> String {
    if let Some(pos) = word.find("sk-") {
        let at_boundary = word[..pos]
            .chars()
            .last()
            .map_or(true, |c| !c.is_ascii_alphanumeric());
        if at_boundary {
            return format!("{}sk-[REDACTED]", &word[..pos]);
        }
    }
    // Bot tokens look like `bot<digits>:<secret>` inside URLs.
    if let Some(pos) = word.find("/bot") {
        let rest = &word[pos + 4..];
        if rest.split('/').next().is_some_and(|t| t.contains(':')) {
            let tail = rest.find('/').map(|i| &rest[i..]).unwrap_or("");
            return format!("{}/bot[REDACTED]{}", &word[..pos], tail);
        }
    }
    word.to_string()
}
