use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, Path, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::{Map, Value};

use evently_auth::authorize_owner_action;
use evently_core::EventId;
use evently_events::{Event, EventPatch};

use crate::app::dto::{self, EventRequest, EventResponse, MessageResponse};
use crate::app::errors::ApiError;
use crate::app::services::AppServices;
use crate::context::PrincipalContext;

pub async fn list_events(
    Extension(services): Extension<Arc<AppServices>>,
) -> Result<Json<Vec<Event>>, ApiError> {
    Ok(Json(services.events.list_all().await?))
}

pub async fn get_event(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> Result<Json<Event>, ApiError> {
    let id = dto::event_id(&id)?;
    Ok(Json(services.events.get_by_id(id).await?))
}

pub async fn create_event(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    body: Result<Json<EventRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let details = dto::body(body)?.into_details()?;

    let event = services
        .events
        .create(principal.user_id(), details)
        .await?;

    tracing::info!(event_id = %event.id, owner = %event.owner_user_id, "event created");

    Ok((
        StatusCode::CREATED,
        Json(EventResponse {
            message: "Successfully created event",
            event,
        }),
    )
        .into_response())
}

/// Missing event (404) and non-owner (403) win over body errors. The store
/// checks ownership again inside the write.
async fn ensure_owner(
    services: &AppServices,
    id: EventId,
    principal: &PrincipalContext,
) -> Result<(), ApiError> {
    let event = services.events.get_by_id(id).await?;
    authorize_owner_action(principal.user_id(), event.owner_user_id)?;
    Ok(())
}

pub async fn update_event(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    body: Result<Json<EventRequest>, JsonRejection>,
) -> Result<Json<EventResponse>, ApiError> {
    let id = dto::event_id(&id)?;
    ensure_owner(&services, id, &principal).await?;
    let details = dto::body(body)?.into_details()?;

    let event = services
        .events
        .update(id, principal.user_id(), details)
        .await?;

    Ok(Json(EventResponse {
        message: "Successfully updated event",
        event,
    }))
}

pub async fn patch_event(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    body: Result<Json<Map<String, Value>>, JsonRejection>,
) -> Result<Json<EventResponse>, ApiError> {
    let id = dto::event_id(&id)?;
    ensure_owner(&services, id, &principal).await?;
    let patch = EventPatch::from_json(&dto::body(body)?)?;

    let event = services
        .events
        .patch(id, principal.user_id(), patch)
        .await?;

    Ok(Json(EventResponse {
        message: "Successfully updated event",
        event,
    }))
}

pub async fn delete_event(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let id = dto::event_id(&id)?;

    services.events.delete(id, principal.user_id()).await?;

    tracing::info!(event_id = %id, "event deleted");

    Ok(Json(MessageResponse {
        message: "Successfully deleted event",
    }))
}
