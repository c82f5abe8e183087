//! Authentication HTTP handlers

use axum::{extract::State, http::StatusCode, Json};
use validator::Validate;

use crate::error::{ApiError, ApiResult};
use crate::middleware::AuthenticatedUser;
use crate::models::{AuthTokensResponse, LoginRequest, RegisterRequest, UserResponse};
use crate::state::AppState;

/// POST /auth/register - Create an account and issue a token
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<AuthTokensResponse>)> {
    req.validate()?;

    let tokens = state.auth_service.register(req).await?;

    Ok((StatusCode::CREATED, Json(tokens)))
}

/// POST /auth/login - Authenticate and issue a token
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<AuthTokensResponse>> {
    let tokens = state.auth_service.login(req).await?;

    Ok(Json(tokens))
}

/// GET /auth/me - Get the current authenticated user
pub async fn get_current_user(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> ApiResult<Json<UserResponse>> {
    let user = state
        .auth_service
        .get_user_by_id(user.user_id)
        .await
        .map_err(|e| ApiError::NotFound(e.to_string()))?;

    Ok(Json(user.into()))
}
