//! KTAS (Korean Triage and Acuity Scale) triage with candidate conditions.
//!
//! KTAS levels run from 1 (immediate resuscitation) to 5 (non-urgent). The model's level and
//! probabilities are returned unchanged; [`AdvancedTriageOutput::range_warnings`] lists any
//! value outside its documented range.

use crate::flow::{run_flow, Flow};
use crate::gateway::LlmGateway;
use crate::LlmResult;
use resq_types::NonEmptyText;
use serde::{Deserialize, Serialize};
use serde_json::{json, Number, Value};
use std::fmt::Write as _;
use utoipa::ToSchema;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TriageVitalSigns {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heart_rate: Option<f64>,
    /// Systolic/diastolic, e.g. `160/100`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blood_pressure: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub respiratory_rate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oxygen_saturation: Option<f64>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdvancedTriageInput {
    pub patient_description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vital_signs: Option<TriageVitalSigns>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PotentialCondition {
    pub condition: String,
    /// Percentage, nominally 0-100.
    pub probability: f64,
    pub key_indicators: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdvancedTriageOutput {
    /// Nominally a whole number 1-5. Kept in the form the model wrote it, so `2` and `2.0`
    /// both decode and are returned as written.
    #[schema(value_type = f64)]
    pub ktas_level: Number,
    pub ktas_reasoning: String,
    pub potential_conditions: Vec<PotentialCondition>,
    pub recommended_tests: Vec<String>,
    pub time_to_treatment_recommendation: String,
}

impl AdvancedTriageOutput {
    pub fn range_warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        match self.ktas_level.as_f64() {
            Some(level) if !(1.0..=5.0).contains(&level) => warnings.push(format!(
                "KTAS level {} is outside the 1-5 scale",
                self.ktas_level
            )),
            Some(level) if level.fract() != 0.0 => warnings.push(format!(
                "KTAS level {} is not a whole number",
                self.ktas_level
            )),
            _ => {}
        }
        for c in &self.potential_conditions {
            if !(0.0..=100.0).contains(&c.probability) {
                warnings.push(format!(
                    "probability {} for '{}' is outside 0-100",
                    c.probability, c.condition
                ));
            }
        }
        warnings
    }
}

pub struct AdvancedTriage;

impl Flow for AdvancedTriage {
    const NAME: &'static str = "advancedTriage";

    type Input = AdvancedTriageInput;
    type Output = AdvancedTriageOutput;

    fn validate(input: &Self::Input) -> LlmResult<()> {
        NonEmptyText::new(&input.patient_description)?;
        Ok(())
    }

    fn render_prompt(input: &Self::Input) -> String {
        let mut prompt = String::from(
            "You are an emergency medicine specialist skilled in KTAS (Korean Triage and Acuity \
             Scale) classification. Analyse the patient's condition and vital signs to produce an \
             accurate acuity level and a list of potential conditions.\n\n",
        );
        let _ = writeln!(prompt, "Patient condition: {}", input.patient_description.trim());

        if let Some(vitals) = &input.vital_signs {
            prompt.push_str("Vital signs:\n");
            if let Some(v) = vitals.heart_rate {
                let _ = writeln!(prompt, " - Heart rate: {v} bpm");
            }
            if let Some(v) = &vitals.blood_pressure {
                let _ = writeln!(prompt, " - Blood pressure: {v} mmHg");
            }
            if let Some(v) = vitals.respiratory_rate {
                let _ = writeln!(prompt, " - Respiratory rate: {v} breaths/min");
            }
            if let Some(v) = vitals.temperature {
                let _ = writeln!(prompt, " - Temperature: {v} °C");
            }
            if let Some(v) = vitals.oxygen_saturation {
                let _ = writeln!(prompt, " - Oxygen saturation: {v}%");
            }
        }
        if let Some(age) = input.age {
            let _ = writeln!(prompt, " - Age: {age}");
        }
        if let Some(gender) = &input.gender {
            let _ = writeln!(prompt, " - Gender: {gender}");
        }

        prompt.push_str(
            "\nKTAS levels:\n\
             1 (resuscitation): life or limb threatening, immediate intervention required\n\
             2 (emergent): potential threat to life, physician assessment within 10-15 minutes\n\
             3 (urgent): low threat to life, assessment within 30 minutes\n\
             4 (less urgent): potentially serious, assessment within 1 hour\n\
             5 (non-urgent): past the acute phase, assessment within 2 hours\n\n\
             Evaluate systematically:\n\
             1. The KTAS level (1-5) and the reasoning behind it\n\
             2. Potential conditions with a confidence percentage (0-100)\n\
             3. Tests recommended on arrival at hospital\n\
             4. The recommended time to start treatment\n\n\
             Put patient safety first: when uncertain, assign the more severe level.",
        );
        prompt
    }

    fn output_schema() -> Value {
        json!({
            "type": "OBJECT",
            "properties": {
                "ktasLevel": { "type": "INTEGER", "description": "KTAS level (1-5)" },
                "ktasReasoning": { "type": "STRING", "description": "Reasoning for the KTAS level" },
                "potentialConditions": {
                    "type": "ARRAY",
                    "items": {
                        "type": "OBJECT",
                        "properties": {
                            "condition": { "type": "STRING" },
                            "probability": { "type": "NUMBER", "description": "Probability (0-100%)" },
                            "keyIndicators": { "type": "ARRAY", "items": { "type": "STRING" } }
                        },
                        "required": ["condition", "probability", "keyIndicators"]
                    }
                },
                "recommendedTests": { "type": "ARRAY", "items": { "type": "STRING" } },
                "timeToTreatmentRecommendation": { "type": "STRING" }
            },
            "required": [
                "ktasLevel",
                "ktasReasoning",
                "potentialConditions",
                "recommendedTests",
                "timeToTreatmentRecommendation"
            ]
        })
    }

    fn range_warnings(output: &Self::Output) -> Vec<String> {
        output.range_warnings()
    }
}

pub async fn advanced_triage(
    gateway: &dyn LlmGateway,
    input: &AdvancedTriageInput,
) -> LlmResult<AdvancedTriageOutput> {
    run_flow::<AdvancedTriage>(gateway, input).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ScriptedGateway;

    fn response(ktas_level: Value, probability: f64) -> Value {
        json!({
            "ktasLevel": ktas_level,
            "ktasReasoning": "Chest pain with hypoxia",
            "potentialConditions": [
                {
                    "condition": "Acute coronary syndrome",
                    "probability": probability,
                    "keyIndicators": ["chest pain", "SpO2 92%"]
                }
            ],
            "recommendedTests": ["ECG", "Troponin"],
            "timeToTreatmentRecommendation": "Immediately"
        })
    }

    fn input() -> AdvancedTriageInput {
        AdvancedTriageInput {
            patient_description: "Severe chest pain, shortness of breath".into(),
            vital_signs: Some(TriageVitalSigns {
                heart_rate: Some(110.0),
                blood_pressure: Some("160/100".into()),
                oxygen_saturation: Some(92.0),
                ..Default::default()
            }),
            age: Some(58),
            gender: None,
        }
    }

    #[test]
    fn test_prompt_includes_only_present_vitals() {
        let prompt = AdvancedTriage::render_prompt(&input());
        assert!(prompt.contains("Heart rate: 110 bpm"));
        assert!(prompt.contains("Blood pressure: 160/100 mmHg"));
        assert!(prompt.contains("Age: 58"));
        assert!(!prompt.contains("Temperature"));
        assert!(!prompt.contains("Gender"));
    }

    #[tokio::test]
    async fn test_triage_decodes_output() {
        let gateway = ScriptedGateway::new().with_response(AdvancedTriage::NAME, response(json!(2), 75.0));
        let output = advanced_triage(&gateway, &input()).await.unwrap();

        assert_eq!(output.ktas_level, Number::from(2));
        assert_eq!(output.potential_conditions[0].key_indicators.len(), 2);
        assert!(output.range_warnings().is_empty());
    }

    #[tokio::test]
    async fn test_out_of_range_levels_pass_through() {
        for level in [0, 9] {
            let gateway = ScriptedGateway::new()
                .with_response(AdvancedTriage::NAME, response(json!(level), 140.0));
            let output = advanced_triage(&gateway, &input()).await.unwrap();

            assert_eq!(output.ktas_level, Number::from(level));
            assert_eq!(output.potential_conditions[0].probability, 140.0);
            assert_eq!(output.range_warnings().len(), 2);
        }
    }

    #[tokio::test]
    async fn test_fractional_level_form_is_kept() {
        let gateway =
            ScriptedGateway::new().with_response(AdvancedTriage::NAME, response(json!(2.0), 75.0));
        let output = advanced_triage(&gateway, &input()).await.unwrap();

        assert_eq!(output.ktas_level.as_f64(), Some(2.0));
        assert_eq!(serde_json::to_value(&output).unwrap()["ktasLevel"], json!(2.0));
        assert!(output.range_warnings().is_empty());

        let gateway =
            ScriptedGateway::new().with_response(AdvancedTriage::NAME, response(json!(2.5), 75.0));
        let output = advanced_triage(&gateway, &input()).await.unwrap();
        assert_eq!(output.range_warnings(), vec!["KTAS level 2.5 is not a whole number"]);
    }

    #[tokio::test]
    async fn test_wrong_type_reports_path() {
        let mut bad = response(json!(2), 50.0);
        bad["potentialConditions"][0]["keyIndicators"] = json!("chest pain");
        let gateway = ScriptedGateway::new().with_response(AdvancedTriage::NAME, bad);

        let err = advanced_triage(&gateway, &input()).await.unwrap_err();
        assert!(
            err.to_string().contains("potentialConditions[0].keyIndicators"),
            "{err}"
        );
    }
}
