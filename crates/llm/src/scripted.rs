//! Canned gateways for tests and offline runs.

use crate::gateway::{GenerationRequest, LlmGateway};
use crate::speech::SpeechToText;
use crate::{LlmError, LlmResult};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;

/// Answers each flow with a fixed JSON value and records every request.
#[derive(Default)]
pub struct ScriptedGateway {
    responses: HashMap<String, Value>,
    requests: Mutex<Vec<GenerationRequest>>,
}

impl ScriptedGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_response(mut self, flow: &str, response: Value) -> Self {
        self.responses.insert(flow.to_string(), response);
        self
    }

    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl LlmGateway for ScriptedGateway {
    async fn generate(&self, request: &GenerationRequest) -> LlmResult<Value> {
        self.requests.lock().push(request.clone());
        self.responses
            .get(request.flow)
            .cloned()
            .ok_or_else(|| LlmError::Upstream {
                service: "scripted gateway",
                status: 404,
                body: format!("no response scripted for flow '{}'", request.flow),
            })
    }
}

/// Returns the same transcript for any audio.
pub struct ScriptedSpeech {
    transcript: String,
}

impl ScriptedSpeech {
    pub fn new(transcript: impl Into<String>) -> Self {
        Self {
            transcript: transcript.into(),
        }
    }
}

#[async_trait]
impl SpeechToText for ScriptedSpeech {
    async fn transcribe(&self, _audio: &[u8]) -> LlmResult<String> {
        Ok(self.transcript.clone())
    }
}
