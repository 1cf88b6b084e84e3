//! Request and response bodies of the ResQ HTTP API.
//!
//! Domain records (`Notification`, `AdmissionRequest`, `Hospital`, flow inputs and outputs) are
//! served as-is; the types here only cover API-specific envelopes.

use chrono::{DateTime, Utc};
use resq_core::{Ambulance, AmbulanceStatus, Decision, Notification};
use resq_llm::HospitalData;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorRes {
    pub error: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NotificationListRes {
    pub notifications: Vec<Notification>,
    pub unread_count: usize,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UnreadCountRes {
    pub unread_count: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum DecisionKind {
    Accept,
    Reject,
    Divert,
}

/// Body of `POST /admission-requests/{id}/decision`.
///
/// `reason` is required for `reject` and optional for `divert`.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct DecisionReq {
    pub decision: DecisionKind,
    #[serde(default)]
    pub reason: Option<String>,
}

impl From<DecisionReq> for Decision {
    fn from(req: DecisionReq) -> Self {
        match req.decision {
            DecisionKind::Accept => Decision::Accept,
            DecisionKind::Reject => Decision::Reject {
                reason: req.reason.unwrap_or_default(),
            },
            DecisionKind::Divert => Decision::Divert { reason: req.reason },
        }
    }
}

/// Body of `POST /dispatch`. Hospitals default to the directory when omitted.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DispatchReq {
    pub voice_input: String,
    pub ambulance_location: String,
    #[serde(default)]
    pub hospital_data: Option<Vec<HospitalData>>,
}

/// An ambulance with its display label.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AmbulanceView {
    pub id: String,
    pub call_sign: String,
    pub current_location: String,
    pub status: AmbulanceStatus,
    /// e.g. `En Route To Hospital`.
    pub status_label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_patient_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination_hospital_id: Option<String>,
    pub crew: Vec<String>,
}

impl From<&Ambulance> for AmbulanceView {
    fn from(a: &Ambulance) -> Self {
        Self {
            id: a.id.clone(),
            call_sign: a.call_sign.clone(),
            current_location: a.current_location.clone(),
            status: a.status,
            status_label: a.status.label(),
            assigned_patient_id: a.assigned_patient_id.clone(),
            destination_hospital_id: a.destination_hospital_id.clone(),
            crew: a.crew.clone(),
        }
    }
}

/// Frames sent on the notification WebSocket.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamMessage {
    Notification { notification: Notification },
    Heartbeat { timestamp: DateTime<Utc> },
    Error { code: String, message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decision_req_maps_to_decision() {
        let req: DecisionReq =
            serde_json::from_str(r#"{"decision":"reject","reason":"No ICU beds"}"#).unwrap();
        assert_eq!(
            Decision::from(req),
            Decision::Reject {
                reason: "No ICU beds".into()
            }
        );

        let req: DecisionReq = serde_json::from_str(r#"{"decision":"divert"}"#).unwrap();
        assert_eq!(Decision::from(req), Decision::Divert { reason: None });

        assert!(serde_json::from_str::<DecisionReq>(r#"{"decision":"maybe"}"#).is_err());
    }

    #[test]
    fn test_stream_message_is_tagged() {
        let msg = StreamMessage::Error {
            code: "MESSAGES_DROPPED".into(),
            message: "3 notifications were dropped".into(),
        };
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "error");
        assert_eq!(json["code"], "MESSAGES_DROPPED");
    }
}
