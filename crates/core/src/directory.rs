//! Read-only catalogue of receiving hospitals and the ambulance fleet.
//!
//! The directory is loaded once at startup from a YAML file of the form:
//!
//! ```yaml
//! hospitals:
//!   - id: HOS001
//!     name: Seoul National University Hospital
//!     location: "37.5796,126.9990"
//!     capacity: 12
//!     specialties: [Cardiology, Trauma]
//! ambulances:
//!   - id: AMB012
//!     callSign: Medic 12
//!     currentLocation: Near Gangnam Station
//!     status: en_route_to_hospital
//!     crew: [Kim, Lee]
//! ```
//!
//! Unknown keys are rejected so that typos surface at startup instead of silently dropping
//! data.

use crate::models::{Ambulance, AmbulanceStatus, Hospital};
use crate::{CoreError, CoreResult};
use resq_llm::HospitalData;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct DirectoryFile {
    #[serde(default)]
    hospitals: Vec<Hospital>,
    #[serde(default)]
    ambulances: Vec<Ambulance>,
}

#[derive(Clone, Debug, Default)]
pub struct Directory {
    hospitals: Vec<Hospital>,
    ambulances: Vec<Ambulance>,
}

impl Directory {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Loads a directory from a YAML file.
    ///
    /// # Errors
    ///
    /// - [`CoreError::DirectoryRead`] if the file cannot be read.
    /// - [`CoreError::DirectorySchema`] if the YAML does not match the expected layout; the
    ///   error carries the path of the offending field (e.g. `hospitals[1].capacity`).
    /// - [`CoreError::InvalidInput`] on duplicate ids.
    pub fn load(path: &Path) -> CoreResult<Self> {
        let text = std::fs::read_to_string(path).map_err(CoreError::DirectoryRead)?;
        let directory = Self::parse(&text)?;
        tracing::info!(
            path = %path.display(),
            hospitals = directory.hospitals.len(),
            ambulances = directory.ambulances.len(),
            "directory loaded"
        );
        Ok(directory)
    }

    pub fn parse(yaml_text: &str) -> CoreResult<Self> {
        let deserializer = serde_yaml::Deserializer::from_str(yaml_text);
        let file: DirectoryFile = match serde_path_to_error::deserialize(deserializer) {
            Ok(parsed) => parsed,
            Err(err) => {
                let path = err.path().to_string();
                let path = if path.is_empty() || path == "." {
                    "<root>".to_string()
                } else {
                    path
                };
                return Err(CoreError::DirectorySchema {
                    path,
                    message: err.into_inner().to_string(),
                });
            }
        };

        ensure_unique("hospital", file.hospitals.iter().map(|h| h.id.as_str()))?;
        ensure_unique("ambulance", file.ambulances.iter().map(|a| a.id.as_str()))?;

        Ok(Self {
            hospitals: file.hospitals,
            ambulances: file.ambulances,
        })
    }

    pub fn hospitals(&self) -> &[Hospital] {
        &self.hospitals
    }

    pub fn ambulances(&self) -> &[Ambulance] {
        &self.ambulances
    }

    pub fn hospital(&self, id: &str) -> Option<&Hospital> {
        self.hospitals.iter().find(|h| h.id == id)
    }

    /// Ambulances whose status is in `filter`. An empty filter returns the whole fleet.
    pub fn ambulances_with_status(&self, filter: &[AmbulanceStatus]) -> Vec<&Ambulance> {
        self.ambulances
            .iter()
            .filter(|a| filter.is_empty() || filter.contains(&a.status))
            .collect()
    }

    /// Hospitals in the shape consumed by the recommendation flow.
    pub fn hospital_data_for_ai(&self) -> Vec<HospitalData> {
        self.hospitals
            .iter()
            .map(|h| HospitalData {
                hospital_name: h.name.clone(),
                hospital_location: h.location.clone(),
                capacity: h.capacity,
                specialties: h.specialties.clone(),
            })
            .collect()
    }
}

fn ensure_unique<'a>(kind: &str, ids: impl Iterator<Item = &'a str>) -> CoreResult<()> {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(CoreError::InvalidInput(format!(
                "duplicate {kind} id '{id}' in directory"
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const SAMPLE: &str = r#"
hospitals:
  - id: HOS001
    name: Seoul National University Hospital
    location: "37.5796,126.9990"
    capacity: 12
    specialties: [Cardiology, Trauma]
  - id: HOS002
    name: Severance Hospital
    location: Sinchon
    capacity: 4
ambulances:
  - id: AMB012
    callSign: Medic 12
    currentLocation: Near Gangnam Station
    status: en_route_to_hospital
    destinationHospitalId: HOS001
    crew: [Kim, Lee]
  - id: AMB007
    callSign: Medic 7
    currentLocation: Sector 5
    status: available
"#;

    #[test]
    fn test_parse_sample() {
        let directory = Directory::parse(SAMPLE).unwrap();
        assert_eq!(directory.hospitals().len(), 2);
        assert_eq!(directory.ambulances().len(), 2);
        assert_eq!(
            directory.hospital("HOS002").map(|h| h.name.as_str()),
            Some("Severance Hospital")
        );
        assert!(directory.hospital("HOS404").is_none());
    }

    #[test]
    fn test_filter_by_status() {
        let directory = Directory::parse(SAMPLE).unwrap();

        let available = directory.ambulances_with_status(&[AmbulanceStatus::Available]);
        assert_eq!(available.len(), 1);
        assert_eq!(available[0].id, "AMB007");

        assert_eq!(directory.ambulances_with_status(&[]).len(), 2);
        assert!(directory
            .ambulances_with_status(&[AmbulanceStatus::AtIncident])
            .is_empty());
    }

    #[test]
    fn test_hospital_data_projection() {
        let directory = Directory::parse(SAMPLE).unwrap();
        let data = directory.hospital_data_for_ai();
        assert_eq!(data[0].hospital_name, "Seoul National University Hospital");
        assert_eq!(data[0].hospital_location, "37.5796,126.9990");
        assert_eq!(data[0].capacity, 12);
        assert_eq!(data[0].specialties, vec!["Cardiology", "Trauma"]);
        assert!(data[1].specialties.is_empty());
    }

    #[test]
    fn test_unknown_key_reports_path() {
        let yaml = r#"
hospitals:
  - id: HOS001
    name: A
    location: B
    capacity: 1
    beds: 3
"#;
        match Directory::parse(yaml) {
            Err(CoreError::DirectorySchema { path, message }) => {
                assert!(path.starts_with("hospitals[0]"), "path was {path}");
                assert!(message.contains("beds"), "message was {message}");
            }
            other => panic!("expected schema error, got {other:?}"),
        }
    }

    #[test]
    fn test_bad_status_reports_path() {
        let yaml = r#"
ambulances:
  - id: AMB001
    callSign: Medic 1
    currentLocation: Depot
    status: parked
"#;
        match Directory::parse(yaml) {
            Err(CoreError::DirectorySchema { path, .. }) => {
                assert_eq!(path, "ambulances[0].status");
            }
            other => panic!("expected schema error, got {other:?}"),
        }
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let yaml = r#"
hospitals:
  - { id: HOS001, name: A, location: X, capacity: 1 }
  - { id: HOS001, name: B, location: Y, capacity: 2 }
"#;
        assert!(matches!(
            Directory::parse(yaml),
            Err(CoreError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("directory.yaml");
        std::fs::write(&path, SAMPLE).unwrap();

        let directory = Directory::load(&path).unwrap();
        assert_eq!(directory.hospitals().len(), 2);

        assert!(matches!(
            Directory::load(&temp.path().join("missing.yaml")),
            Err(CoreError::DirectoryRead(_))
        ));
    }

    #[test]
    fn test_empty_document_is_empty_directory() {
        let directory = Directory::parse("{}").unwrap();
        assert!(directory.hospitals().is_empty());
        assert!(Directory::empty().ambulances().is_empty());
    }
}
