//! Structured logging configuration.
//!
//! This module provides structured logging with request correlation and
//! per-operation outcome records. Records emitted by the ledger through the
//! `log` facade are captured by the same subscriber.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Filter applied when `RUST_LOG` is not set
pub const DEFAULT_FILTER: &str = "info,sqlx=warn,hyper=warn";

/// Initialize structured logging
///
/// Features:
/// - Request ID correlation
/// - Configurable log levels via RUST_LOG env var
/// - `log` records bridged into `tracing`
///
/// # Example
///
/// ```no_run
/// use wallet_server::logging;
///
/// #[tokio::main]
/// async fn main() {
///     logging::init();
///     tracing::info!("Server starting");
/// }
/// ```
pub fn init() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();

    tracing::info!("Structured logging initialized");
}

/// Log the outcome of a wallet operation
///
/// Rejections the caller can act on (bad amount, unknown wallet, overdraft)
/// go to `info`; storage faults and expired deadlines go to `warn`.
///
/// # Arguments
///
/// * `operation` - `deposit`, `withdraw` or `query`
/// * `wallet_id` - Wallet the operation targeted
/// * `outcome` - `ok` or an error kind label
/// * `duration_ms` - Time spent in the ledger
pub fn log_wallet_operation(operation: &str, wallet_id: &str, outcome: &str, duration_ms: u64) {
    match outcome {
        "ok" => tracing::debug!(
            operation = operation,
            wallet_id = wallet_id,
            duration_ms = duration_ms,
            "Wallet operation completed"
        ),
        "storage_unavailable" | "timeout" | "cancelled" => tracing::warn!(
            operation = operation,
            wallet_id = wallet_id,
            outcome = outcome,
            duration_ms = duration_ms,
            "Wallet operation failed"
        ),
        _ => tracing::info!(
            operation = operation,
            wallet_id = wallet_id,
            outcome = outcome,
            duration_ms = duration_ms,
            "Wallet operation rejected"
        ),
    }

    if duration_ms > 1000 {
        tracing::warn!(
            operation = operation,
            duration_ms = duration_ms,
            "PERFORMANCE: Slow wallet operation"
        );
    }
}

/// Log API request/response
///
/// # Arguments
///
/// * `request_id` - Correlation ID
/// * `method` - HTTP method
/// * `path` - Request path
/// * `status_code` - Response status code
/// * `duration_ms` - Request duration in milliseconds
pub fn log_api_request(
    request_id: &str,
    method: &str,
    path: &str,
    status_code: u16,
    duration_ms: u64,
) {
    tracing::info!(
        request_id = request_id,
        http_method = method,
        http_path = path,
        http_status = status_code,
        duration_ms = duration_ms,
        "API request completed"
    );
}
