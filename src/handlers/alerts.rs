//! Alert HTTP handlers

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use crate::error::ApiResult;
use crate::middleware::AuthenticatedUser;
use crate::models::Alert;
use crate::state::AppState;

/// GET /alerts/:user_id - Most recent alerts for a user
pub async fn list_alerts(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(user_id): Path<Uuid>,
) -> ApiResult<Json<Vec<Alert>>> {
    let alerts = state.alert_service.list_for(user_id).await?;

    Ok(Json(alerts))
}

/// PATCH /alerts/:id/read - Mark an alert as read
pub async fn mark_alert_read(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(alert_id): Path<Uuid>,
) -> ApiResult<Json<Alert>> {
    let alert = state.alert_service.mark_read(alert_id).await?;

    Ok(Json(alert))
}
