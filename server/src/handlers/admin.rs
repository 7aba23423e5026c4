use axum::extract::{Path, State};
use axum::response::Response;

use crate::auth::AdminUser;
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::response::success;

pub async fn event_registrations(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    Path(event_id): Path<i32>,
) -> Result<Response, AppError> {
    let rows = state.store.event_registrations(event_id).await?;
    Ok(success(rows))
}

pub async fn dashboard(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
) -> Result<Response, AppError> {
    let stats = state.store.dashboard_stats().await?;
    Ok(success(stats))
}
