//! Loan HTTP handlers

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::error::{ApiError, ApiResult};
use crate::loans::model::{is_valid_aadhar, normalize_pan};
use crate::loans::{CreateLoanRequest, LoanApplication, RecordPaymentRequest, UpdateStatusRequest};
use crate::middleware::AuthenticatedUser;
use crate::models::{Loan, LoanWithPayments};
use crate::state::AppState;

/// POST /loans/create - Create a new marketplace loan offer
pub async fn create_loan(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(req): Json<CreateLoanRequest>,
) -> ApiResult<(StatusCode, Json<Loan>)> {
    req.validate()?;

    let loan = state
        .loan_service
        .create_loan(user.user_id, req, Utc::now())
        .await?;

    Ok((StatusCode::CREATED, Json(loan)))
}

/// GET /loans/unassigned - Open marketplace offers
pub async fn list_unassigned(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<LoanWithPayments>>> {
    let loans = state.loan_service.list_unassigned().await?;

    Ok(Json(loans))
}

/// GET /loans/my/:user_id - Loans where the user is lender or borrower
pub async fn list_my_loans(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(user_id): Path<Uuid>,
) -> ApiResult<Json<Vec<LoanWithPayments>>> {
    let loans = state.loan_service.list_for_user(user_id).await?;

    Ok(Json(loans))
}

/// GET /loans - All loans
pub async fn list_loans(State(state): State<AppState>) -> ApiResult<Json<Vec<LoanWithPayments>>> {
    let loans = state.loan_service.list_all().await?;

    Ok(Json(loans))
}

/// GET /loans/:id - A single loan with its payment history
pub async fn get_loan(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<LoanWithPayments>> {
    let loan = state.loan_service.get_loan(id).await?;

    Ok(Json(loan))
}

/// POST /loans/apply - Apply for an unassigned loan (multipart form)
///
/// Fields: `loan_id`, `aadhar_number`, `pan_card_number`, and an optional
/// `document_image` file. The document is persisted before the loan row is
/// touched; an upload failure aborts the application.
pub async fn apply_for_loan(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    mut multipart: Multipart,
) -> ApiResult<Json<Loan>> {
    let mut loan_id: Option<Uuid> = None;
    let mut aadhar_number: Option<String> = None;
    let mut pan_card_number: Option<String> = None;
    let mut document: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Malformed multipart body: {}", e)))?
    {
        let name = field.name().map(|n| n.to_string());
        match name.as_deref() {
            Some("loan_id") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ApiError::BadRequest(e.to_string()))?;
                loan_id = Some(
                    Uuid::parse_str(text.trim())
                        .map_err(|_| ApiError::ValidationError("Invalid loan id".to_string()))?,
                );
            }
            Some("aadhar_number") => {
                aadhar_number = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| ApiError::BadRequest(e.to_string()))?,
                );
            }
            Some("pan_card_number") => {
                pan_card_number = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| ApiError::BadRequest(e.to_string()))?,
                );
            }
            Some("document_image") => {
                let file_name = field.file_name().unwrap_or("document").to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(e.to_string()))?;
                document = Some((file_name, bytes.to_vec()));
            }
            _ => {}
        }
    }

    let loan_id =
        loan_id.ok_or_else(|| ApiError::ValidationError("loan_id is required".to_string()))?;
    let aadhar_number = aadhar_number
        .ok_or_else(|| ApiError::ValidationError("Aadhar number is required".to_string()))?;
    let pan_card_number = pan_card_number
        .ok_or_else(|| ApiError::ValidationError("PAN card number is required".to_string()))?;

    // Reject bad compliance fields before the document hits storage
    if !is_valid_aadhar(aadhar_number.trim()) {
        return Err(ApiError::ValidationError(
            "Aadhar number must be exactly 12 digits".to_string(),
        ));
    }
    if normalize_pan(pan_card_number.trim()).is_none() {
        return Err(ApiError::ValidationError(
            "PAN card number must be in the format ABCDE1234F (5 letters, 4 numbers, 1 letter)"
                .to_string(),
        ));
    }

    let document_image = match document {
        Some((file_name, bytes)) => Some(
            state
                .document_store
                .save("documentImage", &file_name, &bytes)
                .await
                .map_err(|e| ApiError::InternalError(e.to_string()))?,
        ),
        None => None,
    };

    let loan = state
        .loan_service
        .apply_for_loan(
            user.user_id,
            LoanApplication {
                loan_id,
                aadhar_number: aadhar_number.trim().to_string(),
                pan_card_number: pan_card_number.trim().to_string(),
                document_image,
            },
        )
        .await?;

    Ok(Json(loan))
}

/// POST /loans/:id/payments - Record a payment against a loan
pub async fn record_payment(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(req): Json<RecordPaymentRequest>,
) -> ApiResult<Json<Loan>> {
    let loan = state.loan_service.record_payment(id, req.amount).await?;

    Ok(Json(loan))
}

/// PATCH /loans/:id/status - Change a loan's lifecycle status
pub async fn update_status(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateStatusRequest>,
) -> ApiResult<Json<Loan>> {
    let loan = state.loan_service.set_status(id, req.status).await?;

    Ok(Json(loan))
}

/// DELETE /loans/:id - Delete an unassigned loan offer
pub async fn delete_loan(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<serde_json::Value>> {
    state.loan_service.delete_loan(id, user.user_id).await?;

    Ok(Json(json!({ "message": "Loan deleted successfully" })))
}
