//! Constants used throughout the ResQ core crate.
//!
//! Storage keys and default limits live here so the relay, the admission desk and the
//! persisted layout stay consistent.

/// Storage key holding the JSON array of notifications (newest first).
pub const NOTIFICATIONS_STORAGE_KEY: &str = "resq_notifications";

/// Prefix of the per-request storage keys written by dispatch.
pub const ADMISSION_REQUEST_KEY_PREFIX: &str = "hospital_request_";

/// Number of notifications retained in the stored list.
pub const DEFAULT_NOTIFICATION_CAPACITY: usize = 20;

/// Default directory for persisted state when no explicit directory is configured.
pub const DEFAULT_DATA_DIR: &str = "resq_data";

/// Sub-directory of the data dir used by the file-backed key-value store.
pub const STORE_DIR_NAME: &str = "store";

/// Capacity of the in-process storage event bus.
pub const STORAGE_BUS_CAPACITY: usize = 256;
