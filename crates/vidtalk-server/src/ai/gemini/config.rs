use serde::{Deserialize, Serialize};
use std::time::Duration;
use vidtalk_common::VidtalkError;

use crate::config::env_or;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_FILE_POLL_INTERVAL_MS: u64 = 2_000;
pub const DEFAULT_FILE_POLL_ATTEMPTS: u32 = 60;

/// Fixed sampling parameters sent with every completion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenerationParams {
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: u32,
    pub max_output_tokens: u32,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            temperature: 1.0,
            top_p: 0.95,
            top_k: 64,
            max_output_tokens: 8192,
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct GeminiConfig {
    #[serde(skip_serializing)]
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub request_timeout_secs: u64,
    pub file_poll_interval_ms: u64,
    pub file_poll_attempts: u32,
    pub generation: GenerationParams,
}

impl std::fmt::Debug for GeminiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("file_poll_interval_ms", &self.file_poll_interval_ms)
            .field("file_poll_attempts", &self.file_poll_attempts)
            .field("generation", &self.generation)
            .finish()
    }
}

impl GeminiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            file_poll_interval_ms: DEFAULT_FILE_POLL_INTERVAL_MS,
            file_poll_attempts: DEFAULT_FILE_POLL_ATTEMPTS,
            generation: GenerationParams::default(),
        }
    }

    pub fn from_env() -> Result<Self, VidtalkError> {
        let api_key =
            std::env::var("GEMINI_API_KEY").map_err(|_| VidtalkError::MissingEnv("GEMINI_API_KEY"))?;

        Ok(Self {
            api_key,
            base_url: std::env::var("GEMINI_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
            model: std::env::var("GEMINI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
            request_timeout_secs: env_or("GEMINI_REQUEST_TIMEOUT", DEFAULT_REQUEST_TIMEOUT_SECS)?,
            file_poll_interval_ms: env_or(
                "GEMINI_FILE_POLL_INTERVAL_MS",
                DEFAULT_FILE_POLL_INTERVAL_MS,
            )?,
            file_poll_attempts: env_or("GEMINI_FILE_POLL_ATTEMPTS", DEFAULT_FILE_POLL_ATTEMPTS)?,
            generation: GenerationParams::default(),
        })
    }

    /// Point the client at a local mock server with fast polling.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.api_key.trim().is_empty() {
            anyhow::bail!("GEMINI_API_KEY cannot be empty");
        }
        if self.model.trim().is_empty() {
            anyhow::bail!("GEMINI_MODEL cannot be empty");
        }
        if self.request_timeout_secs == 0 {
            anyhow::bail!("GEMINI_REQUEST_TIMEOUT must be greater than 0");
        }
        if self.file_poll_attempts == 0 {
            anyhow::bail!("GEMINI_FILE_POLL_ATTEMPTS must be greater than 0");
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn file_poll_interval(&self) -> Duration {
        Duration::from_millis(self.file_poll_interval_ms)
    }

    pub(crate) fn base(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_api_key() {
        let config = GeminiConfig::new("super-secret");
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn test_defaults_match_generation_settings() {
        let config = GeminiConfig::new("k");
        assert_eq!(config.model, "gemini-1.5-flash");
        assert_eq!(config.generation.top_k, 64);
        assert_eq!(config.generation.max_output_tokens, 8192);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_base_trims_trailing_slash() {
        let config = GeminiConfig::new("k").with_base_url("http://127.0.0.1:8080/");
        assert_eq!(config.base(), "http://127.0.0.1:8080");
    }

    #[test]
    fn test_zero_poll_attempts_rejected() {
        let mut config = GeminiConfig::new("k");
        config.file_poll_attempts = 0;
        assert!(config.validate().is_err());
    }
}
