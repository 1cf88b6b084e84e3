//! API error type and its JSON rendering.
//!
//! Every error response has the body `{ "error": "<message>" }`.

use api_shared::{AuthError, ErrorRes};
use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use resq_core::CoreError;
use resq_llm::LlmError;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Upstream(String),
    #[error("{0} is not configured on this server")]
    FeatureDisabled(&'static str),
    #[error("Internal error")]
    Internal,
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Upstream(_) => StatusCode::BAD_GATEWAY,
            ApiError::FeatureDisabled(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::InvalidInput(msg) => ApiError::BadRequest(msg),
            CoreError::RequestNotFound(id) => {
                ApiError::NotFound(format!("admission request not found: {id}"))
            }
            e @ CoreError::RequestNotPending { .. } => ApiError::Conflict(e.to_string()),
            e => {
                tracing::error!("core error: {}", e);
                ApiError::Internal
            }
        }
    }
}

impl From<LlmError> for ApiError {
    fn from(err: LlmError) -> Self {
        match err {
            LlmError::InvalidInput(msg) => ApiError::BadRequest(msg),
            e => {
                tracing::error!("model call failed: {}", e);
                ApiError::Upstream(e.to_string())
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        ApiError::Unauthorized(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorRes {
            error: self.to_string(),
        };
        (self.status_code(), Json(body)).into_response()
    }
}
