//! Runtime configuration resolved from the environment.

use crate::error::{ClipcastError, Result};

/// Environment variable holding the OpenAI API key.
pub const OPENAI_API_KEY: &str = "OPENAI_API_KEY";
/// Environment variable holding the Telegram bot token.
pub const TELEGRAM_BOT_TOKEN: &str = "TELEGRAM_BOT_TOKEN";
/// Environment variable holding the target chat id.
pub const TELEGRAM_CHAT_ID: &str = "TELEGRAM_CHAT_ID";
/// Optional override for the OpenAI API base URL.
pub const OPENAI_BASE_URL: &str = "OPENAI_BASE_URL";
/// Optional override for the Telegram Bot API base URL.
pub const TELEGRAM_API_URL: &str = "TELEGRAM_API_URL";

/// Credentials and endpoints needed by the pipeline.
///
/// All three secrets are required; resolution fails on the first one that
/// is absent so no client is ever built with partial credentials.
#[derive(Clone)]
pub struct Config {
    /// Bearer token for the video API.
    pub openai_api_key: String,
    /// Token embedded in the Bot API URL path.
    pub telegram_bot_token: String,
    /// Chat that receives the video.
    pub telegram_chat_id: String,
    /// Video API base URL override.
    pub openai_base_url: Option<String>,
    /// Bot API base URL override.
    pub telegram_api_url: Option<String>,
}

impl Config {
    /// Resolves configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolves configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &'static str| {
            non_empty(lookup(key)).ok_or(ClipcastError::MissingEnv(key))
        };

        let openai_api_key = required(OPENAI_API_KEY)?;
        let telegram_bot_token = required(TELEGRAM_BOT_TOKEN)?;
        let telegram_chat_id = required(TELEGRAM_CHAT_ID)?;

        Ok(Self {
            openai_api_key,
            telegram_bot_token,
            telegram_chat_id,
            openai_base_url: non_empty(lookup(OPENAI_BASE_URL)),
            telegram_api_url: non_empty(lookup(TELEGRAM_API_URL)),
        })
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("openai_api_key", &"[REDACTED]")
            .field("telegram_bot_token", &"[REDACTED]")
            .field("telegram_chat_id", &self.telegram_chat_id)
            .field("openai_base_url", &self.openai_base_url)
            .field("telegram_api_url", &self.telegram_api_url)
            .finish()
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_all_required_present() {
        let config = Config::from_lookup(lookup_from(&[
            (OPENAI_API_KEY, "sk-test"),
            (TELEGRAM_BOT_TOKEN, "123:abc"),
            (TELEGRAM_CHAT_ID, "-10042"),
        ]))
        .unwrap();

        assert_eq!(config.openai_api_key, "sk-test");
        assert_eq!(config.telegram_bot_token, "123:abc");
        assert_eq!(config.telegram_chat_id, "-10042");
        assert!(config.openai_base_url.is_none());
        assert!(config.telegram_api_url.is_none());
    }

    #[test]
    fn test_missing_chat_id() {
        let err = Config::from_lookup(lookup_from(&[
            (OPENAI_API_KEY, "sk-test"),
            (TELEGRAM_BOT_TOKEN, "123:abc"),
        ]))
        .unwrap_err();

        assert!(matches!(err, ClipcastError::MissingEnv(TELEGRAM_CHAT_ID)));
    }

    #[test]
    fn test_reports_first_missing_variable() {
        let err = Config::from_lookup(lookup_from(&[])).unwrap_err();
        assert!(matches!(err, ClipcastError::MissingEnv(OPENAI_API_KEY)));
    }

    #[test]
    fn test_empty_value_counts_as_missing() {
        let err = Config::from_lookup(lookup_from(&[
            (OPENAI_API_KEY, "sk-test"),
            (TELEGRAM_BOT_TOKEN, "   "),
            (TELEGRAM_CHAT_ID, "1"),
        ]))
        .unwrap_err();

        assert!(matches!(err, ClipcastError::MissingEnv(TELEGRAM_BOT_TOKEN)));
    }

    #[test]
    fn test_base_url_overrides() {
        let config = Config::from_lookup(lookup_from(&[
            (OPENAI_API_KEY, "sk-test"),
            (TELEGRAM_BOT_TOKEN, "123:abc"),
            (TELEGRAM_CHAT_ID, "1"),
            (OPENAI_BASE_URL, "http://localhost:9000/v1"),
            (TELEGRAM_API_URL, "http://localhost:9001"),
        ]))
        .unwrap();

        assert_eq!(
            config.openai_base_url.as_deref(),
            Some("http://localhost:9000/v1")
        );
        assert_eq!(
            config.telegram_api_url.as_deref(),
            Some("http://localhost:9001")
        );
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = Config::from_lookup(lookup_from(&[
            (OPENAI_API_KEY, "sk-supersecret"),
            (TELEGRAM_BOT_TOKEN, "123:hidden"),
            (TELEGRAM_CHAT_ID, "1"),
        ]))
        .unwrap();

        let debug = format!("{config:?}");
        assert!(!debug.contains("supersecret"));
        assert!(!debug.contains("hidden"));
    }
}
