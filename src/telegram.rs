//! Telegram Bot API video upload.

use crate::error::{sanitize_error_message, ClipcastError, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

const DEFAULT_API_URL: &str = "https://api.telegram.org";

/// Longest caption the Bot API accepts for media messages.
pub const MAX_CAPTION_CHARS: usize = 1024;

/// Builder for TelegramUploader.
#[derive(Debug, Clone)]
pub struct TelegramUploaderBuilder {
    bot_token: Option<String>,
    chat_id: Option<String>,
    api_url: Option<String>,
    timeout: Duration,
}

impl Default for TelegramUploaderBuilder {
    fn default() -> Self {
        Self {
            bot_token: None,
            chat_id: None,
            api_url: None,
            timeout: Duration::from_secs(180),
        }
    }
}

impl TelegramUploaderBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the bot token. Falls back to `TELEGRAM_BOT_TOKEN` env var.
    pub fn bot_token(mut self, token: impl Into<String>) -> Self {
        self.bot_token = Some(token.into());
        self
    }

    /// Sets the target chat. Falls back to `TELEGRAM_CHAT_ID` env var.
    pub fn chat_id(mut self, chat_id: impl Into<String>) -> Self {
        self.chat_id = Some(chat_id.into());
        self
    }

    /// Overrides the Bot API base URL (defaults to `https://api.telegram.org`).
    pub fn api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = Some(url.into());
        self
    }

    /// Sets the request timeout for the upload.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Builds the uploader, resolving token and chat id.
    pub fn build(self) -> Result<TelegramUploader> {
        let bot_token = resolve(self.bot_token, crate::config::TELEGRAM_BOT_TOKEN)?;
        let chat_id = resolve(self.chat_id, crate::config::TELEGRAM_CHAT_ID)?;
        let api_url = self
            .api_url
            .unwrap_or_else(|| DEFAULT_API_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let client = reqwest::Client::builder().timeout(self.timeout).build()?;

        Ok(TelegramUploader {
            client,
            bot_token,
            chat_id,
            api_url,
        })
    }
}

fn resolve(explicit: Option<String>, var: &'static str) -> Result<String> {
    explicit
        .or_else(|| std::env::var(var).ok())
        .filter(|v| !v.trim().is_empty())
        .ok_or(ClipcastError::MissingEnv(var))
}

/// Posts video files to one Telegram chat.
pub struct TelegramUploader {
    client: reqwest::Client,
    bot_token: String,
    chat_id: String,
    api_url: String,
}

/// What the Bot API reported for a delivered video.
#[derive(Debug, Clone, Default)]
pub struct Delivery {
    /// Id of the message carrying the video, when reported.
    pub message_id: Option<i64>,
}

impl TelegramUploader {
    /// Creates a new `TelegramUploaderBuilder`.
    pub fn builder() -> TelegramUploaderBuilder {
        TelegramUploaderBuilder::new()
    }

    /// Returns the chat this uploader posts to.
    pub fn chat_id(&self) -> &str {
        &self.chat_id
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_url, self.bot_token, method)
    }

    /// Uploads the file at `path` as a video with `caption`.
    pub async fn send_video(&self, path: &Path, caption: &str) -> Result<Delivery> {
        if caption.chars().count() > MAX_CAPTION_CHARS {
            return Err(ClipcastError::InvalidRequest(format!(
                "caption exceeds {MAX_CAPTION_CHARS} characters"
            )));
        }

        let data = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("video.mp4")
            .to_string();
        let size = data.len();

        let video_part = reqwest::multipart::Part::bytes(data)
            .file_name(file_name)
            .mime_str("video/mp4")
            .map_err(|e| ClipcastError::InvalidRequest(e.to_string()))?;

        let form = reqwest::multipart::Form::new()
            .text("chat_id", self.chat_id.clone())
            .text("caption", caption.to_string())
            .part("video", video_part);

        tracing::debug!(chat_id = %self.chat_id, bytes = size, "uploading video to Telegram");

        let response = self
            .client
            .post(self.method_url("sendVideo"))
            .multipart(form)
            .send()
            .await
            .map_err(|e| e.without_url())?;

        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(ClipcastError::Upload {
                status: status.as_u16(),
                body: sanitize_error_message(&text),
            });
        }

        match serde_json::from_str::<BotResponse>(&text) {
            Ok(reply) if !reply.ok => Err(ClipcastError::Upload {
                status: status.as_u16(),
                body: sanitize_error_message(
                    reply.description.as_deref().unwrap_or("Bot API returned ok=false"),
                ),
            }),
            Ok(reply) => Ok(Delivery {
                message_id: reply.result.and_then(|m| m.message_id),
            }),
            // Some proxies answer with a bare 200; the HTTP status is authoritative.
            Err(_) => Ok(Delivery::default()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct BotResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    result: Option<BotMessage>,
}

#[derive(Debug, Deserialize)]
struct BotMessage {
    #[serde(default)]
    message_id: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn uploader(server: &MockServer) -> TelegramUploader {
        TelegramUploader::builder()
            .bot_token("123:abc")
            .chat_id("-100200")
            .api_url(server.uri())
            .build()
            .unwrap()
    }

    fn video_file(dir: &tempfile::TempDir) -> std::path::PathBuf {
        let p = dir.path().join("clip.mp4");
        std::fs::write(&p, b"fake-mp4-bytes").unwrap();
        p
    }

    #[test]
    fn test_method_url() {
        let uploader = TelegramUploader::builder()
            .bot_token("123:abc")
            .chat_id("1")
            .api_url("http://localhost:8081/")
            .build()
            .unwrap();
        assert_eq!(
            uploader.method_url("sendVideo"),
            "http://localhost:8081/bot123:abc/sendVideo"
        );
    }

    #[test]
    fn test_builder_rejects_blank_chat_id() {
        let err = TelegramUploader::builder()
            .bot_token("123:abc")
            .chat_id("  ")
            .build()
            .err()
            .unwrap();
        assert!(matches!(err, ClipcastError::MissingEnv("TELEGRAM_CHAT_ID")));
    }

    #[tokio::test]
    async fn test_send_video_form_fields() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/bot123:abc/sendVideo"))
            .and(body_string_contains("name=\"chat_id\""))
            .and(body_string_contains("-100200"))
            .and(body_string_contains("name=\"caption\""))
            .and(body_string_contains("hello there"))
            .and(body_string_contains("filename=\"clip.mp4\""))
            .and(body_string_contains("fake-mp4-bytes"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "ok": true,
                "result": {"message_id": 77}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let delivery = uploader(&server)
            .await
            .send_video(&video_file(&dir), "hello there")
            .await
            .unwrap();
        assert_eq!(delivery.message_id, Some(77));
    }

    #[tokio::test]
    async fn test_send_video_http_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "ok": false,
                "error_code": 400,
                "description": "Bad Request: chat not found"
            })))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let err = uploader(&server)
            .await
            .send_video(&video_file(&dir), "")
            .await
            .unwrap_err();

        assert!(matches!(err, ClipcastError::Upload { status: 400, .. }));
        let msg = err.to_string();
        assert!(msg.contains("400"));
        assert!(msg.contains("chat not found"));
    }

    #[tokio::test]
    async fn test_send_video_ok_false() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "ok": false,
                "description": "Forbidden: bot was kicked"
            })))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let err = uploader(&server)
            .await
            .send_video(&video_file(&dir), "")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("bot was kicked"));
    }

    #[tokio::test]
    async fn test_caption_too_long_is_rejected_locally() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let caption = "x".repeat(MAX_CAPTION_CHARS + 1);
        let err = uploader(&server)
            .await
            .send_video(&video_file(&dir), &caption)
            .await
            .unwrap_err();
        assert!(matches!(err, ClipcastError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn test_missing_file_is_io_error() {
        let server = MockServer::start().await;
        let dir = tempfile::tempdir().unwrap();
        let err = uploader(&server)
            .await
            .send_video(&dir.path().join("nope.mp4"), "")
            .await
            .unwrap_err();
        assert!(matches!(err, ClipcastError::Io(_)));
    }
}
