//! Gemini `generateContent` client.
//!
//! Requests ask for `application/json` output constrained by the flow's response schema; the
//! first candidate's first text part is parsed as the JSON result.

use crate::config::LlmConfig;
use crate::gateway::{GenerationRequest, LlmGateway};
use crate::{LlmError, LlmResult};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};

const SERVICE: &str = "Gemini";

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

pub struct GeminiGateway {
    client: Client,
    config: LlmConfig,
}

impl GeminiGateway {
    pub fn new(config: LlmConfig) -> LlmResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|source| LlmError::Transport {
                service: SERVICE,
                source,
            })?;
        Ok(Self { client, config })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.base_url(),
            self.config.model()
        )
    }
}

#[async_trait]
impl LlmGateway for GeminiGateway {
    async fn generate(&self, request: &GenerationRequest) -> LlmResult<Value> {
        tracing::debug!(flow = request.flow, model = self.config.model(), "calling Gemini");

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", self.config.api_key())
            .json(&request_body(request))
            .send()
            .await
            .map_err(|source| LlmError::Transport {
                service: SERVICE,
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::upstream(SERVICE, status.as_u16(), &body));
        }

        let parsed: GenerateContentResponse =
            response.json().await.map_err(|source| LlmError::Transport {
                service: SERVICE,
                source,
            })?;
        extract_json(parsed)
    }
}

fn request_body(request: &GenerationRequest) -> Value {
    json!({
        "contents": [
            { "role": "user", "parts": [{ "text": request.prompt }] }
        ],
        "generationConfig": {
            "responseMimeType": "application/json",
            "responseSchema": request.output_schema
        }
    })
}

fn extract_json(response: GenerateContentResponse) -> LlmResult<Value> {
    let text = response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .and_then(|c| c.parts.into_iter().find_map(|p| p.text))
        .ok_or_else(|| LlmError::MalformedResponse {
            service: SERVICE,
            message: "response contained no candidate text".into(),
        })?;

    serde_json::from_str(&text).map_err(|e| LlmError::MalformedResponse {
        service: SERVICE,
        message: format!("candidate text is not JSON: {e}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn parse(raw: Value) -> GenerateContentResponse {
        serde_json::from_value(raw).unwrap()
    }

    #[test]
    fn test_endpoint_uses_model() {
        let config = LlmConfig::from_env_values(
            Some("key".into()),
            Some("gemini-1.5-pro".into()),
            Some("http://localhost:9000".into()),
            Duration::from_secs(5),
        )
        .unwrap();
        let gateway = GeminiGateway::new(config).unwrap();
        assert_eq!(
            gateway.endpoint(),
            "http://localhost:9000/v1beta/models/gemini-1.5-pro:generateContent"
        );
    }

    #[test]
    fn test_request_body_carries_schema() {
        let request = GenerationRequest {
            flow: "assessCondition",
            prompt: "Voice Input: unconscious".into(),
            output_schema: json!({ "type": "OBJECT" }),
        };
        let body = request_body(&request);
        assert_eq!(body["contents"][0]["parts"][0]["text"], "Voice Input: unconscious");
        assert_eq!(
            body["generationConfig"]["responseMimeType"],
            "application/json"
        );
        assert_eq!(body["generationConfig"]["responseSchema"]["type"], "OBJECT");
    }

    #[test]
    fn test_extract_json_from_first_candidate() {
        let response = parse(json!({
            "candidates": [
                { "content": { "parts": [{ "text": "{\"patientState\":\"Stable\"}" }] } },
                { "content": { "parts": [{ "text": "{\"patientState\":\"Other\"}" }] } }
            ]
        }));
        assert_eq!(
            extract_json(response).unwrap(),
            json!({ "patientState": "Stable" })
        );
    }

    #[test]
    fn test_extract_json_failures() {
        assert!(matches!(
            extract_json(parse(json!({}))),
            Err(LlmError::MalformedResponse { .. })
        ));
        assert!(matches!(
            extract_json(parse(json!({
                "candidates": [{ "content": { "parts": [{ "text": "Stable" }] } }]
            }))),
            Err(LlmError::MalformedResponse { .. })
        ));
    }
}
