use crate::gateway::{GenerationRequest, LlmGateway};
use crate::{LlmError, LlmResult};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// A typed call site against an [`LlmGateway`].
pub trait Flow {
    const NAME: &'static str;

    type Input: Sync;
    type Output: DeserializeOwned;

    /// Rejects inputs that must not reach the model.
    fn validate(input: &Self::Input) -> LlmResult<()>;

    fn render_prompt(input: &Self::Input) -> String;

    /// Response schema in the gateway's schema dialect.
    fn output_schema() -> Value;

    /// Human-readable notes about values outside their documented ranges.
    fn range_warnings(_output: &Self::Output) -> Vec<String> {
        Vec::new()
    }
}

/// Validates `input`, calls the gateway and decodes the typed output.
pub async fn run_flow<F: Flow>(gateway: &dyn LlmGateway, input: &F::Input) -> LlmResult<F::Output> {
    F::validate(input)?;

    let request = GenerationRequest {
        flow: F::NAME,
        prompt: F::render_prompt(input),
        output_schema: F::output_schema(),
    };
    let value = gateway.generate(&request).await?;
    let output = decode_output::<F::Output>(F::NAME, value)?;

    for warning in F::range_warnings(&output) {
        tracing::warn!(flow = F::NAME, "{}", warning);
    }
    tracing::debug!(flow = F::NAME, "flow completed");
    Ok(output)
}

pub(crate) fn decode_output<T: DeserializeOwned>(flow: &'static str, value: Value) -> LlmResult<T> {
    serde_path_to_error::deserialize(value).map_err(|err| {
        let path = err.path().to_string();
        let path = if path.is_empty() || path == "." {
            "<root>".to_string()
        } else {
            path
        };
        LlmError::SchemaMismatch {
            flow,
            path,
            message: err.into_inner().to_string(),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize)]
    #[allow(dead_code)]
    struct Sample {
        items: Vec<Item>,
    }

    #[derive(Debug, Deserialize)]
    #[allow(dead_code)]
    struct Item {
        score: f64,
    }

    #[test]
    fn test_decode_reports_field_path() {
        let err = decode_output::<Sample>("sample", json!({ "items": [{ "score": 1 }, { "score": "high" }] }))
            .unwrap_err();
        match err {
            LlmError::SchemaMismatch { flow, path, .. } => {
                assert_eq!(flow, "sample");
                assert_eq!(path, "items[1].score");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_decode_missing_field() {
        let err = decode_output::<Sample>("sample", json!({})).unwrap_err();
        assert!(matches!(err, LlmError::SchemaMismatch { .. }));
        assert!(err.to_string().contains("items"));
    }
}
