use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
};

use evently_infra::StoreError;

use crate::app::dto::{self, MessageResponse};
use crate::app::errors::{ALREADY_REGISTERED, ApiError};
use crate::app::services::AppServices;
use crate::context::PrincipalContext;

pub async fn register(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let id = dto::event_id(&id)?;

    services
        .registrations
        .register(id, principal.user_id())
        .await
        .map_err(|e| match e {
            StoreError::Conflict(_) => ApiError::Conflict(ALREADY_REGISTERED),
            other => other.into(),
        })?;

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse {
            message: "Successfully registered",
        }),
    )
        .into_response())
}

pub async fn cancel(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let id = dto::event_id(&id)?;

    services
        .registrations
        .cancel(id, principal.user_id())
        .await?;

    Ok(Json(MessageResponse {
        message: "Registration canceled",
    }))
}
