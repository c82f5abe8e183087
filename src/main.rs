//! PeerLend Backend Server
//!
//! Rust backend for the PeerLend peer-to-peer lending marketplace: lenders
//! publish loan offers, borrowers apply for and repay them, and both sides
//! get in-app alerts as the loan moves through its lifecycle.

use axum::http::{HeaderValue, Method};
use axum::{routing::get, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::timeout::TimeoutLayer;

use peerlend_server::alerts::AlertService;
use peerlend_server::auth::AuthService;
use peerlend_server::config::Config;
use peerlend_server::db;
use peerlend_server::loans::{start_overdue_sweeper, LoanService};
use peerlend_server::middleware;
use peerlend_server::routes;
use peerlend_server::state::AppState;
use peerlend_server::storage::DocumentStore;

#[tokio::main]
async fn main() {
    // Load configuration
    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level)),
        )
        .with_target(true)
        .init();

    tracing::info!(environment = %config.environment.as_str(), "Starting PeerLend server");

    // Database pool and migrations
    let db_pool = match db::create_pool(&config).await {
        Ok(pool) => pool,
        Err(e) => {
            tracing::error!(error = %e, "Database connection failed");
            std::process::exit(1);
        }
    };
    if let Err(e) = db::run_migrations(&db_pool).await {
        tracing::error!(error = %e, "Database migration failed");
        std::process::exit(1);
    }

    // Document storage for uploaded identity documents
    let document_store = match DocumentStore::new(&config.upload_dir) {
        Ok(store) => store,
        Err(e) => {
            tracing::error!(error = %e, "Failed to initialize document storage");
            std::process::exit(1);
        }
    };

    // Services
    let alert_service = AlertService::new(db_pool.clone());
    let auth_service = Arc::new(AuthService::new(
        db_pool.clone(),
        config.jwt_secret.clone(),
        config.token_ttl_days,
    ));
    let loan_service = Arc::new(LoanService::new(db_pool.clone(), alert_service.clone()));
    let alert_service = Arc::new(alert_service);

    // Shared app state
    let app_state = AppState::new(
        auth_service,
        loan_service.clone(),
        alert_service,
        document_store.clone(),
    );

    // Background sweep that defaults overdue loans
    let mut scheduler = match start_overdue_sweeper(loan_service).await {
        Ok(scheduler) => scheduler,
        Err(e) => {
            tracing::error!(error = %e, "Failed to start overdue loan sweeper");
            std::process::exit(1);
        }
    };

    // Clone db_pool for health check
    let health_db_pool = db_pool.clone();

    // Create the app router
    let app = Router::new()
        .route("/", get(root))
        .route("/health", get(move || health_check(health_db_pool.clone())))
        .merge(routes::auth_routes())
        .merge(routes::loan_routes())
        .merge(routes::alert_routes())
        .nest_service("/uploads", ServeDir::new(document_store.root()))
        .with_state(app_state)
        .layer(axum::middleware::from_fn(middleware::security_headers))
        .layer(axum::middleware::from_fn(middleware::request_tracing))
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.request_timeout_seconds,
        )))
        .layer(configure_cors(&config));

    let addr = SocketAddr::from(([127, 0, 0, 1], config.port));

    tracing::info!("Server listening on {}", addr);
    tracing::info!("Health check at http://{}/health", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind server address");

    // Serve with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    if let Err(e) = scheduler.shutdown().await {
        tracing::warn!(error = %e, "Scheduler shutdown failed");
    }

    tracing::info!("Server shutdown complete");
}

async fn root() -> &'static str {
    "PeerLend API Server"
}

/// Health check response
#[derive(serde::Serialize)]
struct HealthResponse {
    status: String,
    database: String,
    version: String,
}

/// Health check endpoint
async fn health_check(pool: sqlx::PgPool) -> axum::Json<HealthResponse> {
    let db_status = match db::check_health(&pool).await {
        Ok(_) => "connected".to_string(),
        Err(e) => format!("error: {}", e),
    };

    let status = if db_status == "connected" {
        "healthy"
    } else {
        "unhealthy"
    };

    axum::Json(HealthResponse {
        status: status.to_string(),
        database: db_status,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

fn configure_cors(config: &Config) -> CorsLayer {
    let allowed_origins_str = config.cors_allowed_origins.clone().unwrap_or_default();

    if allowed_origins_str.is_empty() {
        tracing::warn!("CORS_ALLOWED_ORIGINS not set, allowing all origins (permissive)");
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = allowed_origins_str
        .split(',')
        .filter_map(|s| s.trim().parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers(Any)
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown...");
        }
    }
}
