//! Wallet error types.

use std::time::Duration;

use thiserror::Error;

use super::models::WalletId;

/// Wallet errors
#[derive(Debug, Error)]
pub enum WalletError {
    /// Invalid amount (must be positive)
    #[error("Invalid amount: {0}")]
    InvalidAmount(i64),

    /// Wallet not found
    #[error("Wallet not found: {0}")]
    WalletNotFound(WalletId),

    /// Insufficient balance
    #[error("Insufficient funds: available {available}, required {required}")]
    InsufficientFunds { available: i64, required: i64 },

    /// Applying the delta would overflow the balance
    #[error("Balance overflow")]
    BalanceOverflow,

    /// Caller cancelled the operation before it completed
    #[error("Operation cancelled")]
    Cancelled,

    /// Deadline expired while waiting for the wallet lock or for storage
    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),

    /// Storage engine unreachable or returned an unexpected fault
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(#[from] sqlx::Error),
}

/// Flat classification of [`WalletError`], one per distinguishable outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidAmount,
    WalletNotFound,
    InsufficientFunds,
    BalanceOverflow,
    Cancelled,
    Timeout,
    StorageUnavailable,
}

impl ErrorKind {
    /// Stable lowercase label, suitable for metrics and log fields
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::InvalidAmount => "invalid_amount",
            ErrorKind::WalletNotFound => "wallet_not_found",
            ErrorKind::InsufficientFunds => "insufficient_funds",
            ErrorKind::BalanceOverflow => "balance_overflow",
            ErrorKind::Cancelled => "cancelled",
            ErrorKind::Timeout => "timeout",
            ErrorKind::StorageUnavailable => "storage_unavailable",
        }
    }
}

impl WalletError {
    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            WalletError::InvalidAmount(_) => ErrorKind::InvalidAmount,
            WalletError::WalletNotFound(_) => ErrorKind::WalletNotFound,
            WalletError::InsufficientFunds { .. } => ErrorKind::InsufficientFunds,
            WalletError::BalanceOverflow => ErrorKind::BalanceOverflow,
            WalletError::Cancelled => ErrorKind::Cancelled,
            WalletError::Timeout(_) => ErrorKind::Timeout,
            WalletError::StorageUnavailable(_) => ErrorKind::StorageUnavailable,
        }
    }

    /// Get a client-safe error message that doesn't leak sensitive information
    ///
    /// Storage errors are sanitized to prevent information disclosure about
    /// the internal system structure, and wallet IDs are redacted.
    pub fn client_message(&self) -> String {
        match self {
            // Sanitize storage errors - don't expose SQL details
            WalletError::StorageUnavailable(_) => "Internal server error".to_string(),
            WalletError::WalletNotFound(_) => "Wallet not found".to_string(),
            WalletError::InsufficientFunds { .. } => "Insufficient funds".to_string(),
            _ => self.to_string(),
        }
    }
}

/// Result type for wallet operations
pub type WalletResult<T> = Result<T, WalletError>;
