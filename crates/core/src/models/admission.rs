use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Lifecycle state of an admission request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AdmissionStatus {
    Pending,
    Accepted,
    Rejected,
    Diverted,
}

impl AdmissionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdmissionStatus::Pending => "pending",
            AdmissionStatus::Accepted => "accepted",
            AdmissionStatus::Rejected => "rejected",
            AdmissionStatus::Diverted => "diverted",
        }
    }
}

impl std::str::FromStr for AdmissionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(AdmissionStatus::Pending),
            "accepted" => Ok(AdmissionStatus::Accepted),
            "rejected" => Ok(AdmissionStatus::Rejected),
            "diverted" => Ok(AdmissionStatus::Diverted),
            other => Err(format!("unknown admission status '{other}'")),
        }
    }
}

impl std::fmt::Display for AdmissionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PatientInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brief_history: Option<String>,
}

/// A dispatcher's request for a hospital to accept an incoming patient.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdmissionRequest {
    /// Empty on submission means "allocate one".
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub patient_info: PatientInfo,
    pub primary_symptoms: String,
    /// Free text, e.g. `BP: 120/80, HR: 70, SpO2: 98%`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vital_signs: Option<String>,
    pub assessed_condition: String,
    pub incident_location: String,
    pub ambulance_id: String,
    pub eta_to_hospital: String,
    pub request_timestamp: DateTime<Utc>,
    pub status: AdmissionStatus,
    pub hospital_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,
}

impl AdmissionRequest {
    pub fn is_pending(&self) -> bool {
        self.status == AdmissionStatus::Pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_serialises_lowercase() {
        let json = serde_json::to_string(&AdmissionStatus::Diverted).unwrap();
        assert_eq!(json, "\"diverted\"");
        assert_eq!("diverted".parse::<AdmissionStatus>(), Ok(AdmissionStatus::Diverted));
        assert!("Pending".parse::<AdmissionStatus>().is_err());
    }

    #[test]
    fn test_request_reads_camel_case_layout() {
        let raw = r#"{
            "id": "REQ001",
            "patientInfo": { "age": 58, "gender": "Male", "briefHistory": "Known cardiac issues" },
            "primarySymptoms": "Severe chest pain, shortness of breath",
            "vitalSigns": "BP: 160/100, HR: 110, SpO2: 92%",
            "assessedCondition": "Suspected Myocardial Infarction",
            "incidentLocation": "Near Gangnam Station",
            "ambulanceId": "AMB012",
            "etaToHospital": "12 minutes",
            "requestTimestamp": "2024-06-10T09:30:00Z",
            "status": "pending",
            "hospitalId": "HOS001"
        }"#;

        let request: AdmissionRequest = serde_json::from_str(raw).unwrap();
        assert_eq!(request.patient_info.age, Some(58));
        assert_eq!(
            request.patient_info.brief_history.as_deref(),
            Some("Known cardiac issues")
        );
        assert!(request.is_pending());
        assert!(request.rejection_reason.is_none());
    }

    #[test]
    fn test_optional_fields_are_omitted() {
        let raw = r#"{
            "id": "REQ002",
            "primarySymptoms": "Abdominal pain",
            "assessedCondition": "Suspected Appendicitis",
            "incidentLocation": "Sector 5",
            "ambulanceId": "AMB007",
            "etaToHospital": "8 minutes",
            "requestTimestamp": "2024-06-10T09:30:00Z",
            "status": "accepted",
            "hospitalId": "HOS001"
        }"#;

        let request: AdmissionRequest = serde_json::from_str(raw).unwrap();
        let rendered = serde_json::to_value(&request).unwrap();
        assert!(rendered.get("vitalSigns").is_none());
        assert!(rendered.get("rejectionReason").is_none());
        assert_eq!(rendered["patientInfo"], serde_json::json!({}));
    }
}
