//! Wallet API handlers.
//!
//! This module maps the two ledger operations onto HTTP:
//! - Deposit or withdraw against a wallet
//! - Read a wallet's balance
//!
//! # Examples
//!
//! Deposit:
//! ```bash
//! curl -X POST http://localhost:8080/api/v1/wallet \
//!   -H "Content-Type: application/json" \
//!   -d '{"walletId": "6f1c2a8e-5b7d-4f3e-9a10-2c4b6d8e0f12", "operationType": "DEPOSIT", "amount": 1000}'
//! ```
//!
//! Balance:
//! ```bash
//! curl http://localhost:8080/api/v1/wallets/6f1c2a8e-5b7d-4f3e-9a10-2c4b6d8e0f12
//! ```

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use wallet_ledger::wallet::{ErrorKind, OperationRequest, WalletError, WalletId, WalletResult};

use super::AppState;
use super::request_id::RequestId;
use crate::{logging, metrics};

#[derive(Debug, Serialize, Deserialize)]
pub struct OperationResponse {
    pub status: String,
    pub balance: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BalanceResponse {
    pub balance: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

/// Status for a failed deposit/withdraw
fn mutation_status(err: &WalletError) -> StatusCode {
    match err.kind() {
        ErrorKind::InvalidAmount => StatusCode::BAD_REQUEST,
        ErrorKind::InsufficientFunds | ErrorKind::WalletNotFound | ErrorKind::BalanceOverflow => {
            StatusCode::CONFLICT
        }
        ErrorKind::Cancelled | ErrorKind::Timeout | ErrorKind::StorageUnavailable => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

/// Status for a failed balance lookup
fn query_status(err: &WalletError) -> StatusCode {
    match err.kind() {
        ErrorKind::WalletNotFound => StatusCode::NOT_FOUND,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn record_outcome(
    operation: &str,
    wallet_id: WalletId,
    result: &WalletResult<i64>,
    started: Instant,
    request_id: &RequestId,
) {
    let outcome = match result {
        Ok(_) => "ok",
        Err(e) => e.kind().as_str(),
    };
    let elapsed = started.elapsed();

    metrics::wallet_operations_total(operation, outcome);
    metrics::wallet_operation_duration_ms(operation, elapsed.as_secs_f64() * 1000.0);
    logging::log_wallet_operation(
        operation,
        &wallet_id.to_string(),
        outcome,
        elapsed.as_millis() as u64,
    );

    if let Err(WalletError::StorageUnavailable(cause)) = result {
        tracing::error!(request_id = %request_id.as_str(), error = %cause, "Wallet store failure");
    }
}

/// Deposit into or withdraw from a wallet.
///
/// A deposit against an unknown wallet creates it.
///
/// # Request Body
///
/// ```json
/// {"walletId": "<uuid>", "operationType": "DEPOSIT", "amount": 1000}
/// ```
///
/// # Response
///
/// Returns `200 OK` with the resulting balance:
/// ```json
/// {"status": "success", "balance": 1000}
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Malformed body or non-positive amount
/// - `409 Conflict`: Insufficient funds, or withdrawal from an unknown wallet
/// - `500 Internal Server Error`: Storage failure or deadline expired
pub async fn update_wallet_balance(
    State(state): State<AppState>,
    request_id: RequestId,
    payload: Result<Json<OperationRequest>, JsonRejection>,
) -> Result<Json<OperationResponse>, ApiError> {
    let Json(request) =
        payload.map_err(|rejection| api_error(StatusCode::BAD_REQUEST, rejection.body_text()))?;

    let operation = request.operation_type.to_string();
    let started = Instant::now();
    let result = state.ledger.apply(&request).await;
    record_outcome(&operation, request.wallet_id, &result, started, &request_id);

    match result {
        Ok(balance) => Ok(Json(OperationResponse {
            status: "success".to_string(),
            balance,
        })),
        Err(e) => Err(api_error(mutation_status(&e), e.client_message())),
    }
}

/// Get the current balance of a wallet.
///
/// # Path Parameters
///
/// - `wallet_id`: Wallet UUID
///
/// # Response
///
/// Returns `200 OK`:
/// ```json
/// {"balance": 1200}
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Path segment is not a UUID
/// - `404 Not Found`: Wallet has never received a deposit
/// - `500 Internal Server Error`: Storage failure
pub async fn get_wallet_balance(
    State(state): State<AppState>,
    request_id: RequestId,
    Path(raw_id): Path<String>,
) -> Result<Json<BalanceResponse>, ApiError> {
    let wallet_id: WalletId = raw_id
        .parse()
        .map_err(|_| api_error(StatusCode::BAD_REQUEST, "invalid wallet ID"))?;

    let started = Instant::now();
    let result = state.ledger.query(wallet_id).await;
    record_outcome("query", wallet_id, &result, started, &request_id);

    match result {
        Ok(balance) => Ok(Json(BalanceResponse { balance })),
        Err(e) => Err(api_error(query_status(&e), e.client_message())),
    }
}
