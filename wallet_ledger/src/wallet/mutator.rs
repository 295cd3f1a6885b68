//! Atomic per-wallet balance adjustment.
//!
//! Every adjustment runs lock-then-check inside one exclusive store
//! transaction:
//!
//! 1. `begin_exclusive` on the wallet (the serialization point)
//! 2. absent wallet: reject debits with `WalletNotFound`, treat credits as
//!    starting from zero
//! 3. compute `current + delta`; reject a debit that would go negative with
//!    `InsufficientFunds`
//! 4. commit the new balance
//!
//! The balance is read and judged while the lock is held, so two withdrawals
//! that are each affordable but jointly overdraw the wallet can never both
//! succeed. There is no retry loop. Adjustments are not idempotent.

use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use super::errors::{WalletError, WalletResult};
use super::models::WalletId;
use crate::db::repository::{WalletStore, WalletTxn};
use crate::db::timeouts::{DEFAULT_TRANSACTION_TIMEOUT, with_timeout};

/// Caller-imposed bounds on a single adjustment.
///
/// On expiry or cancellation the in-flight transaction is dropped, which
/// releases the wallet lock without writing.
#[derive(Debug, Clone, Default)]
pub struct CallBudget {
    pub timeout: Option<Duration>,
    pub cancel: Option<CancellationToken>,
}

impl CallBudget {
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout: Some(timeout),
            cancel: None,
        }
    }

    pub fn with_cancel(token: CancellationToken) -> Self {
        Self {
            timeout: None,
            cancel: Some(token),
        }
    }
}

/// Applies signed deltas to wallet balances
pub struct BalanceMutator<S> {
    store: Arc<S>,
    default_budget: CallBudget,
}

impl<S> Clone for BalanceMutator<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            default_budget: self.default_budget.clone(),
        }
    }
}

impl<S: WalletStore> BalanceMutator<S> {
    /// Create a mutator with the default 10 second transaction timeout
    pub fn new(store: Arc<S>) -> Self {
        Self::with_default_budget(store, CallBudget::with_timeout(DEFAULT_TRANSACTION_TIMEOUT))
    }

    /// Create a mutator that applies `budget` when the caller supplies none
    pub fn with_default_budget(store: Arc<S>, budget: CallBudget) -> Self {
        Self {
            store,
            default_budget: budget,
        }
    }

    /// Apply `delta` to the wallet under the default budget
    ///
    /// # Returns
    ///
    /// * `WalletResult<i64>` - Balance after the adjustment
    ///
    /// # Errors
    ///
    /// * `WalletError::WalletNotFound` - Debit against a wallet that was never credited
    /// * `WalletError::InsufficientFunds` - Debit would make the balance negative
    /// * `WalletError::BalanceOverflow` - Credit would overflow `i64`
    /// * `WalletError::Timeout` - Default deadline expired
    /// * `WalletError::StorageUnavailable` - Storage fault
    pub async fn adjust_balance(&self, wallet_id: WalletId, delta: i64) -> WalletResult<i64> {
        self.adjust_balance_within(wallet_id, delta, &self.default_budget)
            .await
    }

    /// Apply `delta` to the wallet, bounded by `budget`
    pub async fn adjust_balance_within(
        &self,
        wallet_id: WalletId,
        delta: i64,
        budget: &CallBudget,
    ) -> WalletResult<i64> {
        let bounded = async {
            match budget.timeout {
                Some(limit) => with_timeout(limit, self.adjust_locked(wallet_id, delta)).await,
                None => self.adjust_locked(wallet_id, delta).await,
            }
        };

        match &budget.cancel {
            Some(token) => {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => Err(WalletError::Cancelled),
                    result = bounded => result,
                }
            }
            None => bounded.await,
        }
    }

    async fn adjust_locked(&self, wallet_id: WalletId, delta: i64) -> WalletResult<i64> {
        let (current, txn) = self.store.begin_exclusive(wallet_id).await?;

        let current = match current {
            Some(balance) => balance,
            None if delta < 0 => return reject(txn, WalletError::WalletNotFound(wallet_id)).await,
            None => 0,
        };

        let Some(proposed) = current.checked_add(delta) else {
            return reject(txn, WalletError::BalanceOverflow).await;
        };

        if delta < 0 && proposed < 0 {
            let err = WalletError::InsufficientFunds {
                available: current,
                required: delta.saturating_neg(),
            };
            return reject(txn, err).await;
        }

        txn.commit(proposed).await?;
        Ok(proposed)
    }
}

/// Abort `txn` and return `err`.
///
/// A failed abort is not reported over the rejection; the store releases the
/// lock when the handle is dropped either way.
async fn reject<T: WalletTxn>(txn: T, err: WalletError) -> WalletResult<i64> {
    if let Err(abort_err) = txn.abort().await {
        log::debug!("Abort after rejected adjustment failed: {abort_err}");
    }
    Err(err)
}
