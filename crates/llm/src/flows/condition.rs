//! Classify a patient's state from a spoken or typed field report.

use crate::flow::{run_flow, Flow};
use crate::gateway::LlmGateway;
use crate::LlmResult;
use resq_types::NonEmptyText;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssessConditionInput {
    /// Transcript or typed description of the patient's condition.
    pub voice_input: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssessConditionOutput {
    pub patient_state: String,
}

pub struct ConditionAssessment;

impl Flow for ConditionAssessment {
    const NAME: &'static str = "assessCondition";

    type Input = AssessConditionInput;
    type Output = AssessConditionOutput;

    fn validate(input: &Self::Input) -> LlmResult<()> {
        NonEmptyText::new(&input.voice_input)?;
        Ok(())
    }

    fn render_prompt(input: &Self::Input) -> String {
        format!(
            "You are an expert medical professional. Please analyze the following voice input \
             describing a patient's condition and classify the patient's state.\n\n\
             Voice Input: {}\n\nPatient State: ",
            input.voice_input.trim()
        )
    }

    fn output_schema() -> Value {
        json!({
            "type": "OBJECT",
            "properties": {
                "patientState": {
                    "type": "STRING",
                    "description": "The classification of the patient's condition/state based on the voice input."
                }
            },
            "required": ["patientState"]
        })
    }
}

pub async fn assess_condition(
    gateway: &dyn LlmGateway,
    input: &AssessConditionInput,
) -> LlmResult<AssessConditionOutput> {
    run_flow::<ConditionAssessment>(gateway, input).await
}
