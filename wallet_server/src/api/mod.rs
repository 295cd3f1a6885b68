//! HTTP API for the wallet service.
//!
//! # Modules
//!
//! - [`wallets`]: Deposit/withdraw and balance lookup
//! - [`request_id`]: Request correlation, access logging and HTTP metrics
//!
//! # Endpoints Overview
//!
//! - `POST /api/v1/wallet` - Deposit into or withdraw from a wallet
//! - `GET /api/v1/wallets/{wallet_id}` - Current balance
//! - `GET /health` - Server health status
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use wallet_ledger::db::InMemoryWalletStore;
//! use wallet_ledger::wallet::LedgerFacade;
//! use wallet_server::api::{AppState, create_router};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let ledger = LedgerFacade::new(Arc::new(InMemoryWalletStore::new()));
//! let state = AppState {
//!     ledger: Arc::new(ledger),
//! };
//!
//! let app = create_router(state);
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```
//!
//! # CORS
//!
//! CORS is configured permissively for development. In production, configure
//! appropriate origins, methods, and headers.

pub mod request_id;
pub mod wallets;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
};
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use wallet_ledger::wallet::WalletService;

/// Application state shared across all HTTP handlers.
///
/// Cloned per request; the ledger sits behind an `Arc` so this is cheap.
#[derive(Clone)]
pub struct AppState {
    /// Ledger backing every wallet endpoint, storage engine erased
    pub ledger: Arc<dyn WalletService>,
}

/// Create the complete API router with all endpoints and middleware.
///
/// # Endpoint Summary
///
/// ```text
/// GET  /health                         - Health check
/// POST /api/v1/wallet                  - Deposit or withdraw
/// GET  /api/v1/wallets/{wallet_id}     - Balance lookup
/// ```
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", create_v1_router())
        .layer(axum::middleware::from_fn(request_id::request_id_middleware))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Create API v1 router with all versioned endpoints.
fn create_v1_router() -> Router<AppState> {
    Router::new()
        .route("/wallet", post(wallets::update_wallet_balance))
        .route("/wallets/{wallet_id}", get(wallets::get_wallet_balance))
}

/// Health check endpoint for monitoring and load balancers.
///
/// Pings the wallet store.
///
/// # Response
///
/// Returns `200 OK` if the store answers, or `503 Service Unavailable` otherwise.
///
/// # Example
///
/// ```bash
/// curl http://localhost:8080/health
/// # {"status":"healthy","version":"0.1.0","storage":true,"timestamp":"2026-10-19T10:30:00Z"}
/// ```
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let storage_healthy = match state.ledger.health_check().await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(error = %e, "Health check failed");
            false
        }
    };

    let status_code = if storage_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let response = json!({
        "status": if storage_healthy { "healthy" } else { "unhealthy" },
        "version": env!("CARGO_PKG_VERSION"),
        "storage": storage_healthy,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });

    (status_code, Json(response))
}
