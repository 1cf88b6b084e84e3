//! Rank receiving hospitals for a patient.
//!
//! The prompt asks for the five most suitable hospitals; the number actually returned is not
//! enforced.

use crate::flow::{run_flow, Flow};
use crate::gateway::LlmGateway;
use crate::{LlmError, LlmResult};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use utoipa::ToSchema;

/// A hospital as presented to the model.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HospitalData {
    pub hospital_name: String,
    pub hospital_location: String,
    pub capacity: u32,
    #[serde(default)]
    pub specialties: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HospitalRecommendationInput {
    pub patient_condition: String,
    pub ambulance_location: String,
    #[serde(default)]
    pub hospital_data: Vec<HospitalData>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HospitalRecommendation {
    pub hospital_name: String,
    pub estimated_arrival_time: String,
    /// Out of 100, higher is better.
    pub suitability_score: f64,
    pub reasoning: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HospitalRecommendationOutput {
    pub recommendations: Vec<HospitalRecommendation>,
}

impl HospitalRecommendationOutput {
    pub fn range_warnings(&self) -> Vec<String> {
        self.recommendations
            .iter()
            .filter(|r| !(0.0..=100.0).contains(&r.suitability_score))
            .map(|r| {
                format!(
                    "suitability score {} for '{}' is outside 0-100",
                    r.suitability_score, r.hospital_name
                )
            })
            .collect()
    }
}

pub struct SmartHospitalRecommendation;

impl Flow for SmartHospitalRecommendation {
    const NAME: &'static str = "smartHospitalRecommendation";

    type Input = HospitalRecommendationInput;
    type Output = HospitalRecommendationOutput;

    fn validate(input: &Self::Input) -> LlmResult<()> {
        if input.patient_condition.trim().is_empty() || input.ambulance_location.trim().is_empty() {
            return Err(LlmError::InvalidInput(
                "patientCondition and ambulanceLocation are required".into(),
            ));
        }
        Ok(())
    }

    fn render_prompt(input: &Self::Input) -> String {
        let hospitals = input
            .hospital_data
            .iter()
            .map(|h| {
                format!(
                    "{} (Location: {}, Capacity: {}, Specialties: {})",
                    h.hospital_name,
                    h.hospital_location,
                    h.capacity,
                    h.specialties.join(", ")
                )
            })
            .collect::<Vec<_>>()
            .join("\n");

        format!(
            "You are an expert medical dispatch assistant. Given the patient's condition, \
             ambulance location, and real-time hospital data, recommend the 5 most suitable \
             hospitals.\n\n\
             Patient Condition: {}\n\
             Ambulance Location: {}\n\
             Hospital Data: {}\n\n\
             For each recommended hospital, provide:\n\
             - hospitalName: The name of the hospital.\n\
             - estimatedArrivalTime: The estimated time of arrival at the hospital, considering \
             current traffic conditions (make up a reasonable time based on proximity).\n\
             - suitabilityScore: A numerical score (out of 100) indicating the suitability of \
             the hospital (higher is better), factoring in patient condition, hospital \
             specialties and capacity.\n\
             - reasoning: Explain why this hospital is recommended, including how the patient's \
             condition aligns with the hospital's specialties and capacity.",
            input.patient_condition.trim(),
            input.ambulance_location.trim(),
            hospitals
        )
    }

    fn output_schema() -> Value {
        json!({
            "type": "OBJECT",
            "properties": {
                "recommendations": {
                    "type": "ARRAY",
                    "items": {
                        "type": "OBJECT",
                        "properties": {
                            "hospitalName": { "type": "STRING" },
                            "estimatedArrivalTime": { "type": "STRING" },
                            "suitabilityScore": { "type": "NUMBER", "description": "Suitability out of 100" },
                            "reasoning": { "type": "STRING" }
                        },
                        "required": ["hospitalName", "estimatedArrivalTime", "suitabilityScore", "reasoning"]
                    }
                }
            },
            "required": ["recommendations"]
        })
    }

    fn range_warnings(output: &Self::Output) -> Vec<String> {
        output.range_warnings()
    }
}

pub async fn recommend_hospitals(
    gateway: &dyn LlmGateway,
    input: &HospitalRecommendationInput,
) -> LlmResult<HospitalRecommendationOutput> {
    run_flow::<SmartHospitalRecommendation>(gateway, input).await
}
