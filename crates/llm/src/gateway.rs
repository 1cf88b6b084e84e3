use crate::LlmResult;
use async_trait::async_trait;
use serde_json::Value;

/// One structured-generation call.
#[derive(Clone, Debug, PartialEq)]
pub struct GenerationRequest {
    /// Flow name, used for logging and by scripted gateways to pick a response.
    pub flow: &'static str,
    pub prompt: String,
    /// JSON schema the response must follow.
    pub output_schema: Value,
}

/// A model that turns a prompt plus an output schema into a JSON value.
#[async_trait]
pub trait LlmGateway: Send + Sync {
    async fn generate(&self, request: &GenerationRequest) -> LlmResult<Value>;
}
