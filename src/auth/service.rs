//! Authentication service
//!
//! Core business logic for registration, login, and user lookup.

use sqlx::PgPool;
use uuid::Uuid;

use crate::error::ApiError;
use crate::models::{AuthTokensResponse, LoginRequest, RegisterRequest, User, UserRole};

use super::jwt::{generate_token, JwtError};
use super::password::{hash_password, verify_password, PasswordError};

/// Auth service errors
#[derive(thiserror::Error, Debug)]
pub enum AuthError {
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Role must be either \"lender\" or \"borrower\"")]
    InvalidRole,

    #[error("Either email or phone is required")]
    MissingIdentity,

    #[error("User already exists with this {0}")]
    DuplicateIdentity(&'static str),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("User not found")]
    UserNotFound,

    #[error("Token error: {0}")]
    TokenError(String),

    #[error("Password error: {0}")]
    PasswordError(String),
}

impl From<sqlx::Error> for AuthError {
    fn from(e: sqlx::Error) -> Self {
        AuthError::DatabaseError(e.to_string())
    }
}

impl From<JwtError> for AuthError {
    fn from(e: JwtError) -> Self {
        AuthError::TokenError(e.to_string())
    }
}

impl From<PasswordError> for AuthError {
    fn from(e: PasswordError) -> Self {
        AuthError::PasswordError(e.to_string())
    }
}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::InvalidRole | AuthError::MissingIdentity => {
                ApiError::ValidationError(e.to_string())
            }
            AuthError::DuplicateIdentity(_) => ApiError::Conflict(e.to_string()),
            AuthError::InvalidCredentials => ApiError::Unauthorized(e.to_string()),
            AuthError::UserNotFound => ApiError::NotFound(e.to_string()),
            AuthError::DatabaseError(d) => ApiError::DatabaseError(d),
            AuthError::TokenError(d) | AuthError::PasswordError(d) => ApiError::InternalError(d),
        }
    }
}

/// Authentication service
#[derive(Clone)]
pub struct AuthService {
    db_pool: PgPool,
    jwt_secret: String,
    token_ttl_days: i64,
}

impl AuthService {
    /// Create a new AuthService
    pub fn new(db_pool: PgPool, jwt_secret: String, token_ttl_days: i64) -> Self {
        Self {
            db_pool,
            jwt_secret,
            token_ttl_days,
        }
    }

    /// Signing secret, exposed for the request extractor
    pub fn jwt_secret(&self) -> &str {
        &self.jwt_secret
    }

    /// Register a new user and issue a token
    pub async fn register(&self, req: RegisterRequest) -> Result<AuthTokensResponse, AuthError> {
        let role = UserRole::from_str(&req.role).ok_or(AuthError::InvalidRole)?;

        let email = normalize_optional(req.email);
        let phone = normalize_optional(req.phone);
        if email.is_none() && phone.is_none() {
            return Err(AuthError::MissingIdentity);
        }

        if let Some(email) = &email {
            let existing: Option<(Uuid,)> =
                sqlx::query_as("SELECT id FROM users WHERE email = $1")
                    .bind(email)
                    .fetch_optional(&self.db_pool)
                    .await?;
            if existing.is_some() {
                return Err(AuthError::DuplicateIdentity("email address"));
            }
        }

        if let Some(phone) = &phone {
            let existing: Option<(Uuid,)> =
                sqlx::query_as("SELECT id FROM users WHERE phone = $1")
                    .bind(phone)
                    .fetch_optional(&self.db_pool)
                    .await?;
            if existing.is_some() {
                return Err(AuthError::DuplicateIdentity("phone number"));
            }
        }

        let password_hash = hash_password(&req.password)?;

        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, name, email, phone, password_hash, role, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, NOW(), NOW())
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(req.name.trim())
        .bind(&email)
        .bind(&phone)
        .bind(&password_hash)
        .bind(role)
        .fetch_one(&self.db_pool)
        .await
        .map_err(|e| match &e {
            // Unique-violation race between the pre-check and the insert
            sqlx::Error::Database(db) if db.constraint() == Some("users_email_key") => {
                AuthError::DuplicateIdentity("email address")
            }
            sqlx::Error::Database(db) if db.constraint() == Some("users_phone_key") => {
                AuthError::DuplicateIdentity("phone number")
            }
            _ => AuthError::DatabaseError(e.to_string()),
        })?;

        tracing::info!(user_id = %user.id, role = %user.role.as_str(), "User registered");

        self.issue_tokens(user)
    }

    /// Authenticate with email or phone plus password
    ///
    /// Unknown identifier and wrong password produce the same error, so a
    /// caller cannot probe which accounts exist.
    pub async fn login(&self, req: LoginRequest) -> Result<AuthTokensResponse, AuthError> {
        let email = normalize_optional(req.email);
        let phone = normalize_optional(req.phone);

        let user: Option<User> = match (&email, &phone) {
            (Some(email), _) => {
                sqlx::query_as("SELECT * FROM users WHERE email = $1")
                    .bind(email)
                    .fetch_optional(&self.db_pool)
                    .await?
            }
            (None, Some(phone)) => {
                sqlx::query_as("SELECT * FROM users WHERE phone = $1")
                    .bind(phone)
                    .fetch_optional(&self.db_pool)
                    .await?
            }
            (None, None) => return Err(AuthError::InvalidCredentials),
        };

        let user = user.ok_or(AuthError::InvalidCredentials)?;

        if !verify_password(&req.password, &user.password_hash)? {
            return Err(AuthError::InvalidCredentials);
        }

        tracing::info!(user_id = %user.id, "User logged in");

        self.issue_tokens(user)
    }

    /// Fetch a user by id
    pub async fn get_user_by_id(&self, id: Uuid) -> Result<User, AuthError> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.db_pool)
            .await?
            .ok_or(AuthError::UserNotFound)
    }

    fn issue_tokens(&self, user: User) -> Result<AuthTokensResponse, AuthError> {
        let token = generate_token(&user, &self.jwt_secret, self.token_ttl_days)?;

        Ok(AuthTokensResponse {
            token,
            token_type: "Bearer".to_string(),
            expires_in: self.token_ttl_days * 24 * 60 * 60,
            user: user.into(),
        })
    }
}

/// Trim and lowercase-normalize an optional identifier, dropping empties
fn normalize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_lowercase())
        .filter(|v| !v.is_empty())
}
