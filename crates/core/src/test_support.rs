use crate::models::{
    AdmissionRequest, AdmissionStatus, Notification, NotificationType, PatientInfo,
};
use chrono::{TimeZone, Utc};

pub(crate) fn sample_request(id: &str) -> AdmissionRequest {
    AdmissionRequest {
        id: id.to_string(),
        patient_info: PatientInfo {
            age: Some(58),
            gender: Some("Male".into()),
            brief_history: Some("Known cardiac issues".into()),
        },
        primary_symptoms: "Severe chest pain, shortness of breath".into(),
        vital_signs: Some("BP: 160/100, HR: 110, SpO2: 92%".into()),
        assessed_condition: "Suspected Myocardial Infarction".into(),
        incident_location: "Near Gangnam Station".into(),
        ambulance_id: "AMB012".into(),
        eta_to_hospital: "12 minutes".into(),
        request_timestamp: Utc.with_ymd_and_hms(2024, 6, 10, 9, 30, 0).unwrap(),
        status: AdmissionStatus::Pending,
        hospital_id: "HOS001".into(),
        rejection_reason: None,
    }
}

pub(crate) fn sample_notification(request_id: &str, kind: NotificationType) -> Notification {
    Notification::new(kind, sample_request(request_id), None)
}
