use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::response::Response;

use crate::auth::AuthUser;
use crate::models::registration::RegisterRequest;
use crate::models::FeedbackRequest;
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::json::ApiJson;
use crate::utils::response::{created, success};

/// An empty body means a single ticket; anything else must be valid JSON.
fn register_request(body: &[u8]) -> Result<RegisterRequest, AppError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(RegisterRequest::default());
    }
    serde_json::from_slice(body).map_err(|e| {
        AppError::ValidationError(format!("Failed to deserialize the JSON body: {e}"))
    })
}

pub async fn register_for_event(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path(event_id): Path<i32>,
    body: Bytes,
) -> Result<Response, AppError> {
    let RegisterRequest { quantity } = register_request(&body)?;
    if quantity < 1 {
        return Err(AppError::ValidationError(
            "Quantity must be at least 1".to_string(),
        ));
    }

    let registration = state
        .store
        .register_for_event(event_id, claims.user_id, quantity)
        .await?;

    tracing::info!(
        event_id,
        user_id = claims.user_id,
        quantity,
        "Registration confirmed"
    );

    Ok(created(registration))
}

pub async fn user_registrations(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
) -> Result<Response, AppError> {
    let rows = state.store.user_registrations(claims.user_id).await?;
    Ok(success(rows))
}

pub async fn submit_feedback(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path(event_id): Path<i32>,
    ApiJson(body): ApiJson<FeedbackRequest>,
) -> Result<Response, AppError> {
    body.validate()?;

    let feedback = state
        .store
        .submit_feedback(event_id, claims.user_id, body)
        .await?;

    Ok(created(feedback))
}
