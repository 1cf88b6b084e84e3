//! Domain records shared by dispatch, the hospital portal and the relay.
//!
//! All records serialise with camelCase field names; this is the persisted layout of the
//! key-value store as well as the JSON shape of the HTTP API.

pub mod admission;
pub mod fleet;
pub mod notification;

pub use admission::{AdmissionRequest, AdmissionStatus, PatientInfo};
pub use fleet::{Ambulance, AmbulanceStatus, Hospital};
pub use notification::{Notification, NotificationType};
