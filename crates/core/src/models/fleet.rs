use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AmbulanceStatus {
    Available,
    EnRouteToIncident,
    AtIncident,
    EnRouteToHospital,
    AtHospital,
    Unavailable,
}

impl AmbulanceStatus {
    pub const ALL: [AmbulanceStatus; 6] = [
        AmbulanceStatus::Available,
        AmbulanceStatus::EnRouteToIncident,
        AmbulanceStatus::AtIncident,
        AmbulanceStatus::EnRouteToHospital,
        AmbulanceStatus::AtHospital,
        AmbulanceStatus::Unavailable,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AmbulanceStatus::Available => "available",
            AmbulanceStatus::EnRouteToIncident => "en_route_to_incident",
            AmbulanceStatus::AtIncident => "at_incident",
            AmbulanceStatus::EnRouteToHospital => "en_route_to_hospital",
            AmbulanceStatus::AtHospital => "at_hospital",
            AmbulanceStatus::Unavailable => "unavailable",
        }
    }

    /// Title-cased label for display, e.g. `En Route To Hospital`.
    pub fn label(&self) -> String {
        self.as_str()
            .split('_')
            .map(|word| {
                let mut chars = word.chars();
                match chars.next() {
                    Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                    None => String::new(),
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn is_en_route(&self) -> bool {
        matches!(
            self,
            AmbulanceStatus::EnRouteToIncident | AmbulanceStatus::EnRouteToHospital
        )
    }
}

impl std::str::FromStr for AmbulanceStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AmbulanceStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("unknown ambulance status '{s}'"))
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Ambulance {
    pub id: String,
    pub call_sign: String,
    /// `lat,lng` or a free-text landmark.
    pub current_location: String,
    pub status: AmbulanceStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_patient_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination_hospital_id: Option<String>,
    #[serde(default)]
    pub crew: Vec<String>,
}

/// A receiving hospital as listed in the directory.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Hospital {
    pub id: String,
    pub name: String,
    pub location: String,
    /// Available beds or a general capacity score.
    pub capacity: u32,
    #[serde(default)]
    pub specialties: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact: Option<String>,
}
