use super::AdmissionRequest;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum NotificationType {
    Accepted,
    Rejected,
    Diverted,
}

/// A hospital decision relayed back to the dispatch console.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    /// Assigned by the relay when empty.
    #[serde(default)]
    pub id: String,
    #[serde(rename = "type")]
    pub kind: NotificationType,
    pub request: AdmissionRequest,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_read: Option<bool>,
}

impl Notification {
    pub fn new(kind: NotificationType, request: AdmissionRequest, message: Option<String>) -> Self {
        Self {
            id: String::new(),
            kind,
            request,
            timestamp: Utc::now(),
            message,
            is_read: None,
        }
    }

    pub fn is_read(&self) -> bool {
        self.is_read.unwrap_or(false)
    }
}
