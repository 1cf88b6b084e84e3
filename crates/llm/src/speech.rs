//! Speech-to-text for recorded field reports.
//!
//! Audio arrives as WebM/Opus at 48 kHz (the browser `MediaRecorder` default). The transcript
//! is the first alternative of each recognised result, joined with single spaces.

use crate::config::SpeechConfig;
use crate::{LlmError, LlmResult};
use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};

const SERVICE: &str = "speech-to-text";
const ENCODING: &str = "WEBM_OPUS";
const SAMPLE_RATE_HERTZ: u32 = 48_000;

#[async_trait]
pub trait SpeechToText: Send + Sync {
    async fn transcribe(&self, audio: &[u8]) -> LlmResult<String>;
}

#[derive(Debug, Default, Deserialize)]
struct RecognizeResponse {
    #[serde(default)]
    results: Vec<RecognitionResult>,
}

#[derive(Debug, Deserialize)]
struct RecognitionResult {
    #[serde(default)]
    alternatives: Vec<Alternative>,
}

#[derive(Debug, Deserialize)]
struct Alternative {
    #[serde(default)]
    transcript: Option<String>,
}

/// Client for the Google Cloud Speech `speech:recognize` endpoint.
pub struct GoogleSpeechClient {
    client: Client,
    config: SpeechConfig,
}

impl GoogleSpeechClient {
    pub fn new(config: SpeechConfig) -> LlmResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|source| LlmError::Transport {
                service: SERVICE,
                source,
            })?;
        Ok(Self { client, config })
    }

    fn request_body(&self, audio: &[u8]) -> Value {
        json!({
            "config": {
                "encoding": ENCODING,
                "sampleRateHertz": SAMPLE_RATE_HERTZ,
                "languageCode": self.config.language()
            },
            "audio": { "content": general_purpose::STANDARD.encode(audio) }
        })
    }
}

#[async_trait]
impl SpeechToText for GoogleSpeechClient {
    async fn transcribe(&self, audio: &[u8]) -> LlmResult<String> {
        let response = self
            .client
            .post(format!("{}/v1/speech:recognize", self.config.base_url()))
            .header("x-goog-api-key", self.config.api_key())
            .json(&self.request_body(audio))
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

        let parsed: RecognizeResponse =
            response.json().await.map_err(|source| LlmError::Transport {
                service: SERVICE,
                source,
            })?;
        let transcript = join_transcript(parsed);
        tracing::debug!(chars = transcript.len(), "speech recognised");
        Ok(transcript)
    }
}

fn join_transcript(response: RecognizeResponse) -> String {
    response
        .results
        .into_iter()
        .filter_map(|r| r.alternatives.into_iter().next().and_then(|a| a.transcript))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_request_body_encodes_audio() {
        let config = SpeechConfig::from_env_values(
            Some("key".into()),
            None,
            None,
            Duration::from_secs(5),
        )
        .unwrap();
        let client = GoogleSpeechClient::new(config).unwrap();

        let body = client.request_body(b"abc");
        assert_eq!(body["audio"]["content"], "YWJj");
        assert_eq!(body["config"]["encoding"], "WEBM_OPUS");
        assert_eq!(body["config"]["sampleRateHertz"], 48000);
        assert_eq!(body["config"]["languageCode"], "ko-KR");
    }

    #[test]
    fn test_transcript_joins_first_alternatives() {
        let response: RecognizeResponse = serde_json::from_value(json!({
            "results": [
                { "alternatives": [{ "transcript": "patient is" }, { "transcript": "patients" }] },
                { "alternatives": [] },
                { "alternatives": [{ "transcript": "not breathing" }] }
            ]
        }))
        .unwrap();

        assert_eq!(join_transcript(response), "patient is not breathing");
        assert_eq!(join_transcript(RecognizeResponse::default()), "");
    }
}
