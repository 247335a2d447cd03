//! Error responses.
//!
//! Every failure renders as `{"error": <code>, "message": <text>}`. Internal
//! detail is logged, never returned.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;
use thiserror::Error;

use evently_auth::{AuthError, AuthzError};
use evently_core::DomainError;
use evently_infra::StoreError;

pub const PARSE_BODY_FAILED: &str = "Failed to parse request body";
pub const INVALID_EVENT_ID: &str = "Invalid event id";
pub const EVENT_NOT_FOUND: &str = "Event not found";
pub const NOT_REGISTERED: &str = "User is not registered for this event";
pub const ALREADY_REGISTERED: &str = "User is already registered for this event";
pub const EMAIL_TAKEN: &str = "Email is already registered";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Unauthorized(AuthError),

    #[error("Forbidden")]
    Forbidden,

    #[error("{0}")]
    NotFound(&'static str),

    #[error("{0}")]
    Conflict(&'static str),

    #[error("Internal server error")]
    Internal,
}

impl ApiError {
    pub fn validation(msg: impl Into<String>) -> Self {
        ApiError::Validation(msg.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "validation_error",
            ApiError::Unauthorized(_) => "unauthorized",
            ApiError::Forbidden => "forbidden",
            ApiError::NotFound(_) => "not_found",
            ApiError::Conflict(_) => "conflict",
            ApiError::Internal => "internal_error",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        json_error(self.status(), self.code(), self.to_string())
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        ApiError::Unauthorized(err)
    }
}

impl From<AuthzError> for ApiError {
    fn from(_: AuthzError) -> Self {
        ApiError::Forbidden
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Validation(msg) => ApiError::Validation(msg),
            DomainError::InvalidId(_) => ApiError::validation(INVALID_EVENT_ID),
        }
    }
}

/// Default mapping for storage failures. Conflicts are mapped per route.
impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => ApiError::NotFound(EVENT_NOT_FOUND),
            StoreError::NotRegistered => ApiError::NotFound(NOT_REGISTERED),
            // The token outlived its user.
            StoreError::UnknownUser => ApiError::Unauthorized(AuthError::InvalidToken),
            StoreError::Forbidden(_) => ApiError::Forbidden,
            StoreError::Conflict(detail) => {
                tracing::debug!(%detail, "storage conflict");
                ApiError::Conflict(ALREADY_REGISTERED)
            }
            StoreError::Backend(detail) => {
                tracing::error!(%detail, "storage failure");
                ApiError::Internal
            }
        }
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
