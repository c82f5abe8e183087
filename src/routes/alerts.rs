//! Alert route definitions

use axum::{routing::get, routing::patch, Router};

use crate::handlers::alerts;
use crate::state::AppState;

/// Create alert routes
pub fn alert_routes() -> Router<AppState> {
    Router::new()
        .route("/alerts/:user_id", get(alerts::list_alerts))
        .route("/alerts/:id/read", patch(alerts::mark_alert_read))
}
