use axum::extract::{Path, Query, State};
use axum::response::Response;

use crate::auth::AdminUser;
use crate::models::{EventQuery, NewEvent};
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::json::ApiJson;
use crate::utils::response::{created, success};

pub async fn list_events(
    State(state): State<AppState>,
    Query(query): Query<EventQuery>,
) -> Result<Response, AppError> {
    let events = state.store.list_events(&query).await?;
    Ok(success(events))
}

pub async fn get_event(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Response, AppError> {
    let event = state
        .store
        .get_event(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Event not found".to_string()))?;
    Ok(success(event))
}

pub async fn create_event(
    State(state): State<AppState>,
    AdminUser(claims): AdminUser,
    ApiJson(body): ApiJson<NewEvent>,
) -> Result<Response, AppError> {
    body.validate()?;

    let event = state.store.create_event(body, claims.user_id).await?;
    tracing::info!(event_id = event.id, admin = claims.user_id, "Event created");

    Ok(created(event))
}
