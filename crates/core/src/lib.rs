//! # ResQ Core
//!
//! Core services shared by the ResQ dispatch console and the hospital portal:
//! - Key-value persistence with cross-context change events ([`store`])
//! - The hospital-to-dispatch notification relay ([`relay`])
//! - Admission request storage and hospital decisions ([`admission`])
//! - The hospital and ambulance directory ([`directory`])
//!
//! **No API concerns**: HTTP servers, WebSocket streaming and authentication belong in
//! `api-rest` or `api-shared`. Calls to external language and speech models live in
//! `resq-llm`.

pub mod admission;
pub mod config;
pub mod constants;
pub mod directory;
pub mod error;
pub mod models;
pub mod relay;
pub mod store;

#[cfg(test)]
mod test_support;

pub use admission::{AdmissionDesk, Decision};
pub use config::CoreConfig;
pub use directory::Directory;
pub use error::{CoreError, CoreResult};
pub use models::{
    AdmissionRequest, AdmissionStatus, Ambulance, AmbulanceStatus, Hospital, Notification,
    NotificationType, PatientInfo,
};
pub use relay::{Listener, NotificationRelay, Subscription};
pub use store::{
    BroadcastStore, ContextId, FileStore, KeyValueStore, MemoryStore, StorageBus, StorageEvent,
    StoreError, UnavailableStore,
};
