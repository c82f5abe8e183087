//! Loan route definitions

use axum::{
    routing::{get, patch, post},
    Router,
};

use crate::handlers::loans;
use crate::state::AppState;

/// Create loan routes
pub fn loan_routes() -> Router<AppState> {
    Router::new()
        .route("/loans", get(loans::list_loans))
        .route("/loans/create", post(loans::create_loan))
        .route("/loans/unassigned", get(loans::list_unassigned))
        .route("/loans/my/:user_id", get(loans::list_my_loans))
        .route("/loans/apply", post(loans::apply_for_loan))
        .route(
            "/loans/:id",
            get(loans::get_loan).delete(loans::delete_loan),
        )
        .route("/loans/:id/payments", post(loans::record_payment))
        .route("/loans/:id/status", patch(loans::update_status))
}
