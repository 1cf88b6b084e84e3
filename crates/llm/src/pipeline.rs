//! Multi-step dispatch pipelines built from the individual flows.

use crate::flows::condition::{assess_condition, AssessConditionInput};
use crate::flows::recommendation::{
    recommend_hospitals, HospitalData, HospitalRecommendation, HospitalRecommendationInput,
};
use crate::gateway::LlmGateway;
use crate::speech::SpeechToText;
use crate::{LlmError, LlmResult};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VoiceAnalysis {
    pub transcript: String,
    pub patient_state: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DispatchPlan {
    pub patient_state: String,
    pub recommendations: Vec<HospitalRecommendation>,
}

/// Transcribes a recorded field report and classifies the patient's state.
pub async fn analyze_voice(
    stt: &dyn SpeechToText,
    llm: &dyn LlmGateway,
    audio: &[u8],
) -> LlmResult<VoiceAnalysis> {
    if audio.is_empty() {
        return Err(LlmError::InvalidInput("audio file required".into()));
    }

    let transcript = stt.transcribe(audio).await?;
    if transcript.trim().is_empty() {
        return Err(LlmError::InvalidInput(
            "no speech was recognised in the audio".into(),
        ));
    }

    let assessment = assess_condition(
        llm,
        &AssessConditionInput {
            voice_input: transcript.clone(),
        },
    )
    .await?;

    Ok(VoiceAnalysis {
        transcript,
        patient_state: assessment.patient_state,
    })
}

/// Assesses the patient from the crew's report, then ranks hospitals for that state.
pub async fn plan_dispatch(
    llm: &dyn LlmGateway,
    voice_input: &str,
    ambulance_location: &str,
    hospitals: Vec<HospitalData>,
) -> LlmResult<DispatchPlan> {
    if voice_input.trim().is_empty() || ambulance_location.trim().is_empty() {
        return Err(LlmError::InvalidInput(
            "Patient condition and ambulance location cannot be empty.".into(),
        ));
    }

    let assessment = assess_condition(
        llm,
        &AssessConditionInput {
            voice_input: voice_input.to_string(),
        },
    )
    .await?;

    let ranked = recommend_hospitals(
        llm,
        &HospitalRecommendationInput {
            patient_condition: assessment.patient_state.clone(),
            ambulance_location: ambulance_location.to_string(),
            hospital_data: hospitals,
        },
    )
    .await?;

    tracing::info!(
        recommendations = ranked.recommendations.len(),
        "dispatch plan ready"
    );
    Ok(DispatchPlan {
        patient_state: assessment.patient_state,
        recommendations: ranked.recommendations,
    })
}
