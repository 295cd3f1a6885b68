//! Wallet data models.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::errors::{WalletError, WalletResult};

/// Caller-supplied wallet identifier.
///
/// The store never generates one implicitly; a wallet row exists only after
/// the first accepted deposit against its id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WalletId(Uuid);

impl WalletId {
    /// Fresh random (v4) identifier
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn into_uuid(self) -> Uuid {
        self.0
    }
}

impl Default for WalletId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for WalletId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl FromStr for WalletId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

impl fmt::Display for WalletId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Direction of a balance operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OperationKind {
    Deposit,
    Withdraw,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationKind::Deposit => write!(f, "deposit"),
            OperationKind::Withdraw => write!(f, "withdraw"),
        }
    }
}

/// A single deposit or withdrawal request.
///
/// `amount` is always a positive magnitude; direction is carried by
/// `operation_type`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationRequest {
    pub wallet_id: WalletId,
    pub operation_type: OperationKind,
    pub amount: i64,
}

impl OperationRequest {
    pub fn deposit(wallet_id: WalletId, amount: i64) -> Self {
        Self {
            wallet_id,
            operation_type: OperationKind::Deposit,
            amount,
        }
    }

    pub fn withdraw(wallet_id: WalletId, amount: i64) -> Self {
        Self {
            wallet_id,
            operation_type: OperationKind::Withdraw,
            amount,
        }
    }

    /// Reject non-positive amounts regardless of operation kind
    pub fn validate(&self) -> WalletResult<()> {
        if self.amount <= 0 {
            return Err(WalletError::InvalidAmount(self.amount));
        }
        Ok(())
    }

    /// Signed delta for this request. Only meaningful after [`validate`](Self::validate).
    pub fn delta(&self) -> i64 {
        match self.operation_type {
            OperationKind::Deposit => self.amount,
            OperationKind::Withdraw => -self.amount,
        }
    }
}
