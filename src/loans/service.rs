//! Loan service layer - Business logic for the loan lifecycle
//!
//! All mutations of a loan row run inside a transaction that takes a row
//! lock first, so concurrent callers serialize per loan and the repayment
//! invariant (`amount_repaid <= total_repayable_amount`) holds.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::alerts::AlertService;
use crate::error::ApiError;
use crate::models::{AlertType, Loan, LoanStatus, LoanWithPayments, Payment, UserRole};

use super::interest::{day_count, total_repayable, InterestError};
use super::model::{is_valid_aadhar, normalize_pan, CreateLoanRequest, LoanApplication};

/// Loan service errors
#[derive(thiserror::Error, Debug)]
pub enum LoanError {
    #[error("Loan not found")]
    NotFound,

    #[error("Loan is already assigned to a borrower")]
    AlreadyAssigned,

    #[error("Invalid payment amount")]
    InvalidAmount,

    #[error("Payment would exceed the total loan amount. Maximum remaining payment: ₹{remaining}")]
    Overpayment { remaining: f64 },

    #[error("Cannot change loan status from {from} to {to}")]
    IllegalTransition { from: &'static str, to: &'static str },

    #[error("Only the lender can delete this loan")]
    NotLender,

    #[error("Cannot delete a loan that has been assigned to a borrower")]
    AssignedBorrower,

    #[error("Aadhar number must be exactly 12 digits")]
    InvalidAadhar,

    #[error("PAN card number must be in the format ABCDE1234F (5 letters, 4 numbers, 1 letter)")]
    InvalidPan,

    #[error("Invalid loan terms: {0}")]
    InvalidTerms(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<sqlx::Error> for LoanError {
    fn from(e: sqlx::Error) -> Self {
        LoanError::DatabaseError(e.to_string())
    }
}

impl From<InterestError> for LoanError {
    fn from(e: InterestError) -> Self {
        LoanError::InvalidTerms(e.to_string())
    }
}

impl From<LoanError> for ApiError {
    fn from(e: LoanError) -> Self {
        match e {
            LoanError::NotFound => ApiError::NotFound(e.to_string()),
            LoanError::AlreadyAssigned
            | LoanError::Overpayment { .. }
            | LoanError::IllegalTransition { .. }
            | LoanError::AssignedBorrower => ApiError::Conflict(e.to_string()),
            LoanError::NotLender => ApiError::Forbidden(e.to_string()),
            LoanError::InvalidAmount
            | LoanError::InvalidAadhar
            | LoanError::InvalidPan
            | LoanError::InvalidTerms(_) => ApiError::ValidationError(e.to_string()),
            LoanError::DatabaseError(d) => ApiError::DatabaseError(d),
        }
    }
}

/// Loan service for managing the loan lifecycle
#[derive(Clone)]
pub struct LoanService {
    db_pool: PgPool,
    alert_service: AlertService,
}

impl LoanService {
    /// Create a new loan service instance
    pub fn new(db_pool: PgPool, alert_service: AlertService) -> Self {
        Self {
            db_pool,
            alert_service,
        }
    }

    /// Create a marketplace loan offer
    ///
    /// The total repayable amount is fixed here from the terms and the day
    /// count between `now` and the due date.
    pub async fn create_loan(
        &self,
        lender_id: Uuid,
        request: CreateLoanRequest,
        now: DateTime<Utc>,
    ) -> Result<Loan, LoanError> {
        let days = day_count(now, request.due_date);
        let total = total_repayable(
            request.principal_amount,
            request.interest_rate,
            request.interest_type,
            days,
        )?;

        let loan = sqlx::query_as::<_, Loan>(
            r#"
            INSERT INTO loans (
                id, lender_id, borrower_id, principal_amount, interest_rate,
                interest_type, total_repayable_amount, amount_repaid,
                due_date, status, created_at, updated_at
            )
            VALUES ($1, $2, NULL, $3, $4, $5, $6, 0, $7, $8, $9, $9)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(lender_id)
        .bind(request.principal_amount)
        .bind(request.interest_rate)
        .bind(request.interest_type)
        .bind(total)
        .bind(request.due_date)
        .bind(LoanStatus::Pending)
        .bind(now)
        .fetch_one(&self.db_pool)
        .await?;

        tracing::info!(loan_id = %loan.id, lender_id = %lender_id, "Loan created");

        self.alert_service
            .emit(
                lender_id,
                loan.id,
                AlertType::LoanCreated,
                &format!("You have created a new loan of ₹{}", loan.principal_amount),
            )
            .await;

        // Marketplace broadcast: every borrower hears about the new offer
        match self.list_borrower_ids().await {
            Ok(borrower_ids) => {
                for borrower_id in borrower_ids {
                    self.alert_service
                        .emit(
                            borrower_id,
                            loan.id,
                            AlertType::LoanCreated,
                            &format!(
                                "A new loan of ₹{} is available for application",
                                loan.principal_amount
                            ),
                        )
                        .await;
                }
            }
            Err(e) => {
                tracing::warn!(loan_id = %loan.id, error = %e, "Failed to broadcast loan offer");
            }
        }

        Ok(loan)
    }

    /// Assign a borrower to an unassigned loan
    ///
    /// Compliance fields are validated before anything is written; the
    /// borrower slot is filled exactly once.
    pub async fn apply_for_loan(
        &self,
        borrower_id: Uuid,
        application: LoanApplication,
    ) -> Result<Loan, LoanError> {
        if !is_valid_aadhar(&application.aadhar_number) {
            return Err(LoanError::InvalidAadhar);
        }
        let pan = normalize_pan(&application.pan_card_number).ok_or(LoanError::InvalidPan)?;

        let mut tx = self.db_pool.begin().await?;

        let loan = sqlx::query_as::<_, Loan>("SELECT * FROM loans WHERE id = $1 FOR UPDATE")
            .bind(application.loan_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(LoanError::NotFound)?;

        if loan.borrower_id.is_some() {
            return Err(LoanError::AlreadyAssigned);
        }

        let loan = sqlx::query_as::<_, Loan>(
            r#"
            UPDATE loans
            SET borrower_id = $1, aadhar_number = $2, pan_card_number = $3,
                document_image = $4, status = $5, updated_at = NOW()
            WHERE id = $6
            RETURNING *
            "#,
        )
        .bind(borrower_id)
        .bind(&application.aadhar_number)
        .bind(&pan)
        .bind(&application.document_image)
        .bind(LoanStatus::Pending)
        .bind(application.loan_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(loan_id = %loan.id, borrower_id = %borrower_id, "Borrower applied for loan");

        self.alert_service
            .emit(
                loan.lender_id,
                loan.id,
                AlertType::LoanApplied,
                &format!(
                    "A borrower has applied for your loan of ₹{}",
                    loan.principal_amount
                ),
            )
            .await;
        self.alert_service
            .emit(
                borrower_id,
                loan.id,
                AlertType::LoanApplied,
                &format!(
                    "You have successfully applied for the loan of ₹{}",
                    loan.principal_amount
                ),
            )
            .await;

        Ok(loan)
    }

    /// Record a payment against a loan
    ///
    /// The overpayment check and the increment run under a row lock so two
    /// concurrent payments cannot both pass against a stale total. When the
    /// running total reaches the repayable amount the loan completes.
    pub async fn record_payment(&self, loan_id: Uuid, amount: f64) -> Result<Loan, LoanError> {
        if !amount.is_finite() || amount <= 0.0 {
            return Err(LoanError::InvalidAmount);
        }

        let mut tx = self.db_pool.begin().await?;

        let loan = sqlx::query_as::<_, Loan>("SELECT * FROM loans WHERE id = $1 FOR UPDATE")
            .bind(loan_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(LoanError::NotFound)?;

        if loan.amount_repaid + amount > loan.total_repayable_amount {
            return Err(LoanError::Overpayment {
                remaining: loan.total_repayable_amount - loan.amount_repaid,
            });
        }

        sqlx::query(
            r#"
            INSERT INTO payments (id, loan_id, amount, payment_date)
            VALUES ($1, $2, $3, NOW())
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(loan_id)
        .bind(amount)
        .execute(&mut *tx)
        .await?;

        let new_repaid = loan.amount_repaid + amount;
        let new_status = if new_repaid >= loan.total_repayable_amount {
            LoanStatus::Completed
        } else {
            loan.status
        };

        let loan = sqlx::query_as::<_, Loan>(
            r#"
            UPDATE loans
            SET amount_repaid = $1, status = $2, updated_at = NOW()
            WHERE id = $3
            RETURNING *
            "#,
        )
        .bind(new_repaid)
        .bind(new_status)
        .bind(loan_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(loan_id = %loan.id, amount, "Payment recorded");

        self.alert_service
            .emit(
                loan.lender_id,
                loan.id,
                AlertType::PaymentReceived,
                &format!("Payment of ₹{} received for loan", amount),
            )
            .await;
        if let Some(borrower_id) = loan.borrower_id {
            self.alert_service
                .emit(
                    borrower_id,
                    loan.id,
                    AlertType::PaymentReceived,
                    &format!("Your payment of ₹{} has been recorded", amount),
                )
                .await;
        }

        if new_status == LoanStatus::Completed {
            self.emit_status_alerts(&loan, LoanStatus::Completed).await;
        }

        Ok(loan)
    }

    /// Change a loan's status, enforcing the lifecycle transition table
    pub async fn set_status(
        &self,
        loan_id: Uuid,
        new_status: LoanStatus,
    ) -> Result<Loan, LoanError> {
        let mut tx = self.db_pool.begin().await?;

        let loan = sqlx::query_as::<_, Loan>("SELECT * FROM loans WHERE id = $1 FOR UPDATE")
            .bind(loan_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(LoanError::NotFound)?;

        if !loan.status.can_transition_to(new_status) {
            return Err(LoanError::IllegalTransition {
                from: loan.status.as_str(),
                to: new_status.as_str(),
            });
        }

        let loan = sqlx::query_as::<_, Loan>(
            r#"
            UPDATE loans
            SET status = $1, updated_at = NOW()
            WHERE id = $2
            RETURNING *
            "#,
        )
        .bind(new_status)
        .bind(loan_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(loan_id = %loan.id, status = %new_status.as_str(), "Loan status changed");

        self.emit_status_alerts(&loan, new_status).await;

        Ok(loan)
    }

    /// Delete an unassigned loan offer; only its lender may do so
    pub async fn delete_loan(&self, loan_id: Uuid, requester: Uuid) -> Result<(), LoanError> {
        let loan = sqlx::query_as::<_, Loan>("SELECT * FROM loans WHERE id = $1")
            .bind(loan_id)
            .fetch_optional(&self.db_pool)
            .await?
            .ok_or(LoanError::NotFound)?;

        if loan.lender_id != requester {
            return Err(LoanError::NotLender);
        }
        if loan.borrower_id.is_some() {
            return Err(LoanError::AssignedBorrower);
        }

        sqlx::query("DELETE FROM loans WHERE id = $1")
            .bind(loan_id)
            .execute(&self.db_pool)
            .await?;

        tracing::info!(loan_id = %loan_id, "Loan deleted");

        Ok(())
    }

    /// Get a loan with its payment history
    pub async fn get_loan(&self, id: Uuid) -> Result<LoanWithPayments, LoanError> {
        let loan = sqlx::query_as::<_, Loan>("SELECT * FROM loans WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.db_pool)
            .await?
            .ok_or(LoanError::NotFound)?;

        let mut loans = self.attach_payments(vec![loan]).await?;
        Ok(loans.remove(0))
    }

    /// All loans where the user is lender or borrower
    pub async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<LoanWithPayments>, LoanError> {
        let loans = sqlx::query_as::<_, Loan>(
            r#"
            SELECT * FROM loans
            WHERE lender_id = $1 OR borrower_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.db_pool)
        .await?;

        self.attach_payments(loans).await
    }

    /// Unassigned loans, i.e. the open marketplace
    pub async fn list_unassigned(&self) -> Result<Vec<LoanWithPayments>, LoanError> {
        let loans = sqlx::query_as::<_, Loan>(
            r#"
            SELECT * FROM loans
            WHERE borrower_id IS NULL
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.db_pool)
        .await?;

        self.attach_payments(loans).await
    }

    /// All loans
    pub async fn list_all(&self) -> Result<Vec<LoanWithPayments>, LoanError> {
        let loans = sqlx::query_as::<_, Loan>("SELECT * FROM loans ORDER BY created_at DESC")
            .fetch_all(&self.db_pool)
            .await?;

        self.attach_payments(loans).await
    }

    /// Flip overdue active loans to defaulted; returns the affected loans
    ///
    /// Called periodically by the scheduler.
    pub async fn sweep_overdue(&self, now: DateTime<Utc>) -> Result<Vec<Loan>, LoanError> {
        let defaulted = sqlx::query_as::<_, Loan>(
            r#"
            UPDATE loans
            SET status = 'defaulted', updated_at = $1
            WHERE status = 'active' AND due_date < $1
            RETURNING *
            "#,
        )
        .bind(now)
        .fetch_all(&self.db_pool)
        .await?;

        for loan in &defaulted {
            tracing::info!(loan_id = %loan.id, "Loan past due date marked defaulted");
            self.emit_status_alerts(loan, LoanStatus::Defaulted).await;
        }

        Ok(defaulted)
    }

    async fn emit_status_alerts(&self, loan: &Loan, new_status: LoanStatus) {
        let (alert_type, message) = match new_status {
            LoanStatus::Active => (AlertType::LoanUpdated, "Loan has been activated"),
            LoanStatus::Completed => (AlertType::LoanCompleted, "Loan has been marked as completed"),
            LoanStatus::Defaulted => (AlertType::LoanDefaulted, "Loan has been marked as defaulted"),
            // No transition leads back to pending
            LoanStatus::Pending => return,
        };

        self.alert_service
            .emit(loan.lender_id, loan.id, alert_type, message)
            .await;
        if let Some(borrower_id) = loan.borrower_id {
            self.alert_service
                .emit(borrower_id, loan.id, alert_type, message)
                .await;
        }
    }

    async fn list_borrower_ids(&self) -> Result<Vec<Uuid>, LoanError> {
        let rows: Vec<(Uuid,)> = sqlx::query_as("SELECT id FROM users WHERE role = $1")
            .bind(UserRole::Borrower)
            .fetch_all(&self.db_pool)
            .await?;

        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    async fn attach_payments(&self, loans: Vec<Loan>) -> Result<Vec<LoanWithPayments>, LoanError> {
        if loans.is_empty() {
            return Ok(Vec::new());
        }

        let loan_ids: Vec<Uuid> = loans.iter().map(|l| l.id).collect();
        let payments = sqlx::query_as::<_, Payment>(
            r#"
            SELECT * FROM payments
            WHERE loan_id = ANY($1)
            ORDER BY payment_date ASC
            "#,
        )
        .bind(&loan_ids)
        .fetch_all(&self.db_pool)
        .await?;

        let mut result: Vec<LoanWithPayments> = loans
            .into_iter()
            .map(|loan| LoanWithPayments {
                loan,
                payments: Vec::new(),
            })
            .collect();

        for payment in payments {
            if let Some(entry) = result.iter_mut().find(|l| l.loan.id == payment.loan_id) {
                entry.payments.push(payment);
            }
        }

        Ok(result)
    }
}
