//! # API Shared
//!
//! Shared utilities and definitions for the ResQ APIs.
//!
//! Contains:
//! - Request/response types for the HTTP and WebSocket surfaces (`dto` module)
//! - Shared services like `HealthService`
//! - API key authentication
//!
//! Used by `api-rest`.

pub mod auth;
pub mod dto;
pub mod health;

pub use auth::{ApiKey, AuthError, API_KEY_HEADER, API_KEY_QUERY_PARAM};
pub use dto::*;
pub use health::{HealthRes, HealthService};
