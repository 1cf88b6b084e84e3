//! Configuration for the model and speech clients.
//!
//! Values are resolved from environment variables once at startup by the binaries and passed
//! in here. A missing API key disables the feature instead of failing startup.

use crate::{LlmError, LlmResult};
use std::fmt;
use std::time::Duration;

pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_STT_BASE_URL: &str = "https://speech.googleapis.com";
pub const DEFAULT_STT_LANGUAGE: &str = "ko-KR";
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 60;

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parse the outbound HTTP timeout from an optional seconds value.
///
/// Unset or blank yields [`DEFAULT_HTTP_TIMEOUT_SECS`].
pub fn http_timeout_from_env_value(value: Option<String>) -> LlmResult<Duration> {
    match non_blank(value) {
        None => Ok(Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS)),
        Some(v) => match v.parse::<u64>() {
            Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
            _ => Err(LlmError::InvalidInput(format!(
                "RESQ_HTTP_TIMEOUT_SECS must be a positive integer, got '{v}'"
            ))),
        },
    }
}

/// Settings for the generative model gateway.
#[derive(Clone)]
pub struct LlmConfig {
    api_key: String,
    model: String,
    base_url: String,
    timeout: Duration,
}

impl LlmConfig {
    /// Builds the configuration, or `None` when no API key is set.
    pub fn from_env_values(
        api_key: Option<String>,
        model: Option<String>,
        base_url: Option<String>,
        timeout: Duration,
    ) -> Option<Self> {
        let api_key = non_blank(api_key)?;
        Some(Self {
            api_key,
            model: non_blank(model).unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            base_url: non_blank(base_url)
                .unwrap_or_else(|| DEFAULT_GEMINI_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            timeout,
        })
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LlmConfig")
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Settings for the speech-to-text client.
#[derive(Clone)]
pub struct SpeechConfig {
    api_key: String,
    base_url: String,
    language: String,
    timeout: Duration,
}

impl SpeechConfig {
    /// Builds the configuration, or `None` when no API key is set.
    pub fn from_env_values(
        api_key: Option<String>,
        base_url: Option<String>,
        language: Option<String>,
        timeout: Duration,
    ) -> Option<Self> {
        let api_key = non_blank(api_key)?;
        Some(Self {
            api_key,
            base_url: non_blank(base_url)
                .unwrap_or_else(|| DEFAULT_STT_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            language: non_blank(language).unwrap_or_else(|| DEFAULT_STT_LANGUAGE.to_string()),
            timeout,
        })
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl fmt::Debug for SpeechConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpeechConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("language", &self.language)
            .field("timeout", &self.timeout)
            .finish()
    }
}
