//! Request-level entry point: validation, sign translation and balance queries.

use async_trait::async_trait;
use std::sync::Arc;

use super::errors::{WalletError, WalletResult};
use super::models::{OperationRequest, WalletId};
use super::mutator::{BalanceMutator, CallBudget};
use crate::db::repository::WalletStore;
use crate::db::timeouts::with_default_timeout;

/// The two operations exposed to the transport layer.
///
/// Object-safe so that handlers can hold an `Arc<dyn WalletService>` without
/// knowing which storage engine backs it.
#[async_trait]
pub trait WalletService: Send + Sync {
    /// Deposit or withdraw; returns the new balance
    async fn apply(&self, request: &OperationRequest) -> WalletResult<i64>;

    /// Current committed balance
    async fn query(&self, wallet_id: WalletId) -> WalletResult<i64>;

    /// Readiness of the backing store
    async fn health_check(&self) -> WalletResult<()>;
}

/// Validates requests and routes them to the [`BalanceMutator`]
pub struct LedgerFacade<S> {
    store: Arc<S>,
    mutator: BalanceMutator<S>,
}

impl<S: WalletStore> LedgerFacade<S> {
    /// Create a facade with the mutator's default transaction timeout
    pub fn new(store: Arc<S>) -> Self {
        let mutator = BalanceMutator::new(Arc::clone(&store));
        Self { store, mutator }
    }

    /// Create a facade whose adjustments use `budget` unless told otherwise
    pub fn with_default_budget(store: Arc<S>, budget: CallBudget) -> Self {
        let mutator = BalanceMutator::with_default_budget(Arc::clone(&store), budget);
        Self { store, mutator }
    }

    /// Validate, translate into a signed delta and apply
    ///
    /// # Errors
    ///
    /// * `WalletError::InvalidAmount` - `amount <= 0`; storage is never touched
    /// * `WalletError::WalletNotFound` - Withdrawal from an unknown wallet
    /// * `WalletError::InsufficientFunds` - Withdrawal exceeds the balance
    pub async fn apply(&self, request: &OperationRequest) -> WalletResult<i64> {
        request.validate()?;
        self.mutator
            .adjust_balance(request.wallet_id, request.delta())
            .await
    }

    /// Same as [`apply`](Self::apply) with an explicit deadline/cancellation budget
    pub async fn apply_within(
        &self,
        request: &OperationRequest,
        budget: &CallBudget,
    ) -> WalletResult<i64> {
        request.validate()?;
        self.mutator
            .adjust_balance_within(request.wallet_id, request.delta(), budget)
            .await
    }

    /// Committed balance of `wallet_id`
    ///
    /// # Errors
    ///
    /// * `WalletError::WalletNotFound` - No deposit has ever been accepted for this id
    pub async fn query(&self, wallet_id: WalletId) -> WalletResult<i64> {
        with_default_timeout(self.store.read_balance(wallet_id))
            .await?
            .ok_or(WalletError::WalletNotFound(wallet_id))
    }
}

#[async_trait]
impl<S: WalletStore> WalletService for LedgerFacade<S> {
    async fn apply(&self, request: &OperationRequest) -> WalletResult<i64> {
        LedgerFacade::apply(self, request).await
    }

    async fn query(&self, wallet_id: WalletId) -> WalletResult<i64> {
        LedgerFacade::query(self, wallet_id).await
    }

    async fn health_check(&self) -> WalletResult<()> {
        with_default_timeout(self.store.ping()).await
    }
}
