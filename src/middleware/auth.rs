//! Authentication middleware
//!
//! Extractor that verifies the bearer token and re-fetches the user record,
//! so tokens for deleted users stop working without a revocation list.

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::{get_user_id_from_claims, verify_token, AuthService};
use crate::models::UserRole;

/// Authenticated user extracted from a verified bearer token
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
    pub name: String,
    pub role: UserRole,
}

/// Error response for authentication failures
#[derive(Debug, Serialize)]
struct AuthRejection {
    error: AuthRejectionDetails,
}

#[derive(Debug, Serialize)]
struct AuthRejectionDetails {
    code: String,
    message: String,
}

impl AuthRejection {
    fn new(code: &str, message: &str) -> Self {
        Self {
            error: AuthRejectionDetails {
                code: code.to_string(),
                message: message.to_string(),
            },
        }
    }
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        (StatusCode::UNAUTHORIZED, Json(self)).into_response()
    }
}

/// Extractor for authenticated users
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(user: AuthenticatedUser) -> impl IntoResponse {
///     format!("Hello, user {}", user.user_id)
/// }
/// ```
#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    Arc<AuthService>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| {
                    AuthRejection::new("MISSING_TOKEN", "Authorization token missing")
                        .into_response()
                })?;

        let auth_service = Arc::<AuthService>::from_ref(state);

        let claims = verify_token(bearer.token(), auth_service.jwt_secret()).map_err(|e| {
            let (code, message) = if e.to_string().contains("expired") {
                ("TOKEN_EXPIRED", "Token has expired")
            } else {
                ("INVALID_TOKEN", "Invalid or expired token")
            };
            AuthRejection::new(code, message).into_response()
        })?;

        let user_id = get_user_id_from_claims(&claims).map_err(|_| {
            AuthRejection::new("INVALID_TOKEN", "Invalid user ID in token").into_response()
        })?;

        // The token is only as good as the user row behind it
        let user = auth_service.get_user_by_id(user_id).await.map_err(|_| {
            AuthRejection::new("USER_NOT_FOUND", "User not found").into_response()
        })?;

        Ok(AuthenticatedUser {
            user_id: user.id,
            name: user.name,
            role: user.role,
        })
    }
}
