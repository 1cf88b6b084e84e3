//! Server configuration resolved from the environment at startup.
//!
//! # Environment Variables
//! - `RESQ_REST_ADDR`: server address (default: `0.0.0.0:3000`)
//! - `RESQ_DATA_DIR`: persisted state (default: `resq_data`)
//! - `RESQ_NOTIFICATION_CAPACITY`: notifications kept (default: 20)
//! - `RESQ_DIRECTORY_FILE`: optional hospital/ambulance directory YAML
//! - `RESQ_API_KEY`: when set, every route except `/health` and the docs requires it
//! - `RESQ_LLM_API_KEY`, `RESQ_LLM_MODEL`, `RESQ_LLM_BASE_URL`: Gemini access
//! - `RESQ_STT_API_KEY` (falls back to `RESQ_LLM_API_KEY`), `RESQ_STT_BASE_URL`,
//!   `RESQ_STT_LANGUAGE`: speech-to-text access
//! - `RESQ_HTTP_TIMEOUT_SECS`: timeout for outbound model calls (default: 60)

use api_shared::ApiKey;
use resq_core::config::notification_capacity_from_env_value;
use resq_core::constants::DEFAULT_DATA_DIR;
use resq_core::CoreConfig;
use resq_llm::{http_timeout_from_env_value, LlmConfig, SpeechConfig};
use std::path::PathBuf;

pub const DEFAULT_REST_ADDR: &str = "0.0.0.0:3000";

#[derive(Clone, Debug)]
pub struct RestConfig {
    pub addr: String,
    pub core: CoreConfig,
    pub llm: Option<LlmConfig>,
    pub speech: Option<SpeechConfig>,
    pub api_key: Option<ApiKey>,
}

impl RestConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Resolves the configuration through `lookup` instead of the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let addr = lookup("RESQ_REST_ADDR").unwrap_or_else(|| DEFAULT_REST_ADDR.into());

        let data_dir = lookup("RESQ_DATA_DIR")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_DATA_DIR.into());
        let capacity = notification_capacity_from_env_value(lookup("RESQ_NOTIFICATION_CAPACITY"))?;
        let directory_file = lookup("RESQ_DIRECTORY_FILE")
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from);
        let core = CoreConfig::new(PathBuf::from(data_dir), capacity, directory_file)?;

        let timeout = http_timeout_from_env_value(lookup("RESQ_HTTP_TIMEOUT_SECS"))?;
        let llm_key = lookup("RESQ_LLM_API_KEY");
        let llm = LlmConfig::from_env_values(
            llm_key.clone(),
            lookup("RESQ_LLM_MODEL"),
            lookup("RESQ_LLM_BASE_URL"),
            timeout,
        );
        let speech = SpeechConfig::from_env_values(
            lookup("RESQ_STT_API_KEY").or(llm_key),
            lookup("RESQ_STT_BASE_URL"),
            lookup("RESQ_STT_LANGUAGE"),
            timeout,
        );

        Ok(Self {
            addr,
            core,
            llm,
            speech,
            api_key: ApiKey::from_env_value(lookup("RESQ_API_KEY")),
        })
    }
}
