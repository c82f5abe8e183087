//! Alert service layer - persisted in-app notifications
//!
//! Alerts are written as a side effect of loan mutations. Emission is
//! best-effort: a failed write is logged and swallowed so it can never fail
//! or roll back the ledger operation that triggered it.

use sqlx::PgPool;
use uuid::Uuid;

use crate::error::ApiError;
use crate::models::{Alert, AlertType};

/// How many alerts a single listing returns
const ALERT_PAGE_SIZE: i64 = 50;

/// Alert service errors
#[derive(thiserror::Error, Debug)]
pub enum AlertError {
    #[error("Alert not found")]
    NotFound,

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<sqlx::Error> for AlertError {
    fn from(e: sqlx::Error) -> Self {
        AlertError::DatabaseError(e.to_string())
    }
}

impl From<AlertError> for ApiError {
    fn from(e: AlertError) -> Self {
        match e {
            AlertError::NotFound => ApiError::NotFound(e.to_string()),
            AlertError::DatabaseError(d) => ApiError::DatabaseError(d),
        }
    }
}

/// Alert service
#[derive(Clone)]
pub struct AlertService {
    db_pool: PgPool,
}

impl AlertService {
    /// Create a new alert service instance
    pub fn new(db_pool: PgPool) -> Self {
        Self { db_pool }
    }

    /// Append an alert for a user about a loan event. Never fails the caller.
    pub async fn emit(&self, user_id: Uuid, loan_id: Uuid, alert_type: AlertType, message: &str) {
        let result = sqlx::query(
            r#"
            INSERT INTO alerts (id, user_id, loan_id, alert_type, message, read, created_at)
            VALUES ($1, $2, $3, $4, $5, FALSE, NOW())
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(loan_id)
        .bind(alert_type)
        .bind(message)
        .execute(&self.db_pool)
        .await;

        match result {
            Ok(_) => {
                tracing::debug!(user_id = %user_id, loan_id = %loan_id, ?alert_type, "Alert created");
            }
            Err(e) => {
                tracing::warn!(user_id = %user_id, loan_id = %loan_id, error = %e, "Failed to create alert");
            }
        }
    }

    /// Most recent alerts for a user, newest first
    pub async fn list_for(&self, user_id: Uuid) -> Result<Vec<Alert>, AlertError> {
        let alerts = sqlx::query_as::<_, Alert>(
            r#"
            SELECT * FROM alerts
            WHERE user_id = $1
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(user_id)
        .bind(ALERT_PAGE_SIZE)
        .fetch_all(&self.db_pool)
        .await?;

        Ok(alerts)
    }

    /// Flip an alert's read flag. Idempotent.
    pub async fn mark_read(&self, alert_id: Uuid) -> Result<Alert, AlertError> {
        let alert = sqlx::query_as::<_, Alert>(
            r#"
            UPDATE alerts
            SET read = TRUE
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(alert_id)
        .fetch_optional(&self.db_pool)
        .await?
        .ok_or(AlertError::NotFound)?;

        Ok(alert)
    }
}
