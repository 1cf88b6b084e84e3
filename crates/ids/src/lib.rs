//! Identifier generation for ResQ records.
//!
//! Two identifier shapes are in circulation:
//!
//! ## Notification identifiers
//! `notification_<unix-millis>_<suffix>` where `suffix` is 1-9 lowercase base36 characters.
//!
//! Example: `notification_1718000000000_k3j9x0a2b`
//!
//! Lists written by existing clients use this exact shape. The random suffix separates ids
//! generated within the same millisecond.
//!
//! ## Admission request identifiers
//! `REQ<12 uppercase hex>` derived from a v4 UUID.
//!
//! Example: `REQ550E8400E29B`
//!
//! Request identifiers end up inside storage keys (`hospital_request_<id>`), so both shapes
//! only ever contain `[0-9A-Za-z_]`.

mod service;

pub use service::{NotificationId, RequestId, Uuid};

/// Error type for identifier parsing.
#[derive(Debug, thiserror::Error)]
pub enum IdError {
    /// Invalid input provided
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type for identifier operations.
pub type IdResult<T> = Result<T, IdError>;
