//! Data models for the PeerLend backend

use serde::{Deserialize, Serialize};
use sqlx::types::chrono::{DateTime, Utc};
use uuid::Uuid;

pub mod auth;
pub use auth::*;

/// User model
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// User roles
#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Lender,
    Borrower,
}

impl UserRole {
    /// Parse a role from its wire representation
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "lender" => Some(UserRole::Lender),
            "borrower" => Some(UserRole::Borrower),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Lender => "lender",
            UserRole::Borrower => "borrower",
        }
    }
}

/// Loan model
///
/// A loan starts life as an unassigned marketplace offer (borrower null) and
/// is assigned exactly once when a borrower applies.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct Loan {
    pub id: Uuid,
    pub lender_id: Uuid,
    pub borrower_id: Option<Uuid>,
    pub aadhar_number: Option<String>,
    pub pan_card_number: Option<String>,
    pub document_image: Option<String>,
    pub principal_amount: f64,
    pub interest_rate: f64,
    pub interest_type: InterestType,
    pub total_repayable_amount: f64,
    pub amount_repaid: f64,
    pub due_date: DateTime<Utc>,
    pub status: LoanStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Loan status
#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq)]
#[sqlx(type_name = "loan_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum LoanStatus {
    Pending,
    Active,
    Completed,
    Defaulted,
}

impl LoanStatus {
    /// Legal status transitions.
    ///
    /// Completed and defaulted are terminal; a pending loan can only be
    /// activated. Re-application keeps an unassigned loan pending, which is
    /// handled as part of loan assignment rather than here.
    pub fn can_transition_to(self, next: LoanStatus) -> bool {
        matches!(
            (self, next),
            (LoanStatus::Pending, LoanStatus::Active)
                | (LoanStatus::Active, LoanStatus::Completed)
                | (LoanStatus::Active, LoanStatus::Defaulted)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LoanStatus::Pending => "pending",
            LoanStatus::Active => "active",
            LoanStatus::Completed => "completed",
            LoanStatus::Defaulted => "defaulted",
        }
    }
}

/// Interest accrual type
#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq)]
#[sqlx(type_name = "interest_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum InterestType {
    Simple,
    Compound,
}

/// Payment record, append-only per loan
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct Payment {
    pub id: Uuid,
    pub loan_id: Uuid,
    pub amount: f64,
    pub payment_date: DateTime<Utc>,
}

/// Loan together with its payment history, as returned by the API
#[derive(Debug, Serialize)]
pub struct LoanWithPayments {
    #[serde(flatten)]
    pub loan: Loan,
    pub payments: Vec<Payment>,
}

/// Alert model
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct Alert {
    pub id: Uuid,
    pub user_id: Uuid,
    pub loan_id: Uuid,
    #[serde(rename = "type")]
    pub alert_type: AlertType,
    pub message: String,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

/// Alert types emitted on loan events
#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq)]
#[sqlx(type_name = "alert_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AlertType {
    LoanCreated,
    LoanUpdated,
    PaymentReceived,
    LoanCompleted,
    LoanDefaulted,
    LoanApplied,
}
