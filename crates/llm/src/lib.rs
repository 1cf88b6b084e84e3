//! Language-model and speech boundary for ResQ.
//!
//! This crate owns every call that leaves the process for an AI service:
//! - structured generation through an [`LlmGateway`] (Gemini in production)
//! - speech-to-text through a [`SpeechToText`] client (Google Cloud Speech in production)
//!
//! Each model call site is a [`Flow`]: a typed input, a prompt rendered from it, a JSON schema
//! for the structured output and a typed output. Gateway responses are decoded with
//! `serde_path_to_error`, so a response that does not match the output type fails with the
//! path of the offending field rather than a generic parse error.
//!
//! Numeric fields such as the KTAS level or suitability scores are passed through exactly as
//! the model returned them. Out-of-range values are reported by the flow's range check and
//! logged; they are never clamped.

pub mod config;
pub mod flow;
pub mod flows;
pub mod gateway;
pub mod gemini;
pub mod pipeline;
pub mod scripted;
pub mod speech;

pub use config::{http_timeout_from_env_value, LlmConfig, SpeechConfig};
pub use flow::{run_flow, Flow};
pub use flows::condition::{assess_condition, AssessConditionInput, AssessConditionOutput};
pub use flows::recommendation::{
    recommend_hospitals, HospitalData, HospitalRecommendation, HospitalRecommendationInput,
    HospitalRecommendationOutput,
};
pub use flows::triage::{
    advanced_triage, AdvancedTriageInput, AdvancedTriageOutput, PotentialCondition,
    TriageVitalSigns,
};
pub use gateway::{GenerationRequest, LlmGateway};
pub use gemini::GeminiGateway;
pub use pipeline::{analyze_voice, plan_dispatch, DispatchPlan, VoiceAnalysis};
pub use scripted::{ScriptedGateway, ScriptedSpeech};
pub use speech::{GoogleSpeechClient, SpeechToText};

/// Errors returned by the `resq-llm` crate.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("request to {service} failed: {source}")]
    Transport {
        service: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{service} returned HTTP {status}: {body}")]
    Upstream {
        service: &'static str,
        status: u16,
        body: String,
    },

    #[error("{service} returned an unusable response: {message}")]
    MalformedResponse {
        service: &'static str,
        message: String,
    },

    #[error("{flow} output schema mismatch at {path}: {message}")]
    SchemaMismatch {
        flow: &'static str,
        path: String,
        message: String,
    },
}

/// Upper bound on the upstream error body kept in [`LlmError::Upstream`].
const MAX_ERROR_BODY: usize = 512;

impl LlmError {
    /// An HTTP error from `service`, keeping at most the first 512 characters of its body.
    pub(crate) fn upstream(service: &'static str, status: u16, body: &str) -> Self {
        LlmError::Upstream {
            service,
            status,
            body: truncate(body, MAX_ERROR_BODY),
        }
    }
}

fn truncate(body: &str, max: usize) -> String {
    match body.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}

impl From<resq_types::TextError> for LlmError {
    fn from(err: resq_types::TextError) -> Self {
        LlmError::InvalidInput(err.to_string())
    }
}

/// Type alias for Results that can fail with an [`LlmError`].
pub type LlmResult<T> = Result<T, LlmError>;
