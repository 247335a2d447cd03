use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::Utc;

use evently_core::Email;
use evently_infra::{NewUser, StoreError};

use crate::app::dto::{self, CredentialsRequest, LoginResponse, MessageResponse};
use crate::app::errors::{ApiError, EMAIL_TAKEN};
use crate::app::services::AppServices;

pub async fn signup(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<CredentialsRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let body = dto::body(body)?;

    let email = Email::parse(body.email)?;
    if body.password.is_empty() {
        return Err(ApiError::validation("password must not be empty"));
    }

    let hasher = Arc::clone(&services.hasher);
    let password = body.password;
    let password_digest = tokio::task::spawn_blocking(move || hasher.hash(&password))
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "password hashing task failed");
            ApiError::Internal
        })?
        .map_err(|e| {
            tracing::error!(error = %e, "password hashing failed");
            ApiError::Internal
        })?;

    let user_id = services
        .users
        .create_user(NewUser {
            email,
            password_digest,
        })
        .await
        .map_err(|e| match e {
            StoreError::Conflict(_) => ApiError::Conflict(EMAIL_TAKEN),
            other => other.into(),
        })?;

    tracing::info!(user_id = %user_id, "user signed up");

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse {
            message: "Successfully created user",
        }),
    )
        .into_response())
}

pub async fn login(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<CredentialsRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let body = dto::body(body)?;

    let user_id = services.credentials.validate(&body.email, &body.password).await?;

    let token = services
        .tokens
        .issue(user_id, body.email.trim(), Utc::now())
        .map_err(|e| {
            tracing::error!(error = %e, "token issue failed");
            ApiError::Internal
        })?;

    Ok(Json(LoginResponse {
        message: "Successfully logged in",
        token,
    })
    .into_response())
}
