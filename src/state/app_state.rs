//! Application state shared across handlers

use std::sync::Arc;

use crate::alerts::AlertService;
use crate::auth::AuthService;
use crate::loans::LoanService;
use crate::storage::DocumentStore;

use axum::extract::FromRef;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub auth_service: Arc<AuthService>,
    pub loan_service: Arc<LoanService>,
    pub alert_service: Arc<AlertService>,
    pub document_store: DocumentStore,
}

impl AppState {
    pub fn new(
        auth_service: Arc<AuthService>,
        loan_service: Arc<LoanService>,
        alert_service: Arc<AlertService>,
        document_store: DocumentStore,
    ) -> Self {
        Self {
            auth_service,
            loan_service,
            alert_service,
            document_store,
        }
    }
}

impl FromRef<AppState> for Arc<AuthService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.auth_service.clone()
    }
}

impl FromRef<AppState> for Arc<LoanService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.loan_service.clone()
    }
}

impl FromRef<AppState> for Arc<AlertService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.alert_service.clone()
    }
}

impl FromRef<AppState> for DocumentStore {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.document_store.clone()
    }
}
