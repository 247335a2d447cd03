use axum::Json;
use axum::extract::rejection::JsonRejection;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use evently_core::{DomainResult, EventId};
use evently_events::{Event, EventDetails};

use crate::app::errors::{ApiError, INVALID_EVENT_ID, PARSE_BODY_FAILED};

// -------------------------
// Request DTOs
// -------------------------

#[derive(Deserialize)]
pub struct CredentialsRequest {
    pub email: String,
    pub password: String,
}

impl core::fmt::Debug for CredentialsRequest {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CredentialsRequest")
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

/// Body of create and full update. Every field is required.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRequest {
    pub name: String,
    pub description: String,
    pub location: String,
    pub date_time: DateTime<Utc>,
}

impl EventRequest {
    pub fn into_details(self) -> DomainResult<EventDetails> {
        EventDetails::new(self.name, self.description, self.location, self.date_time)
    }
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct EventResponse {
    pub message: &'static str,
    pub event: Event,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub message: &'static str,
    pub token: String,
}

// -------------------------
// Extraction helpers
// -------------------------

/// Any body that fails to decode is a 400 with one fixed message.
pub fn body<T>(extracted: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    match extracted {
        Ok(Json(value)) => Ok(value),
        Err(rejection) => {
            tracing::debug!(reason = %rejection.body_text(), "request body rejected");
            Err(ApiError::validation(PARSE_BODY_FAILED))
        }
    }
}

pub fn event_id(raw: &str) -> Result<EventId, ApiError> {
    raw.parse::<EventId>()
        .map_err(|_| ApiError::validation(INVALID_EVENT_ID))
}
