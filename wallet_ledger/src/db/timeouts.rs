//! Deadline helpers for wallet store operations.
//!
//! Wraps store futures so that an expired deadline surfaces as
//! [`WalletError::Timeout`]. The wrapped future is dropped on expiry, which
//! releases any transaction handle it owned.

use std::future::Future;
use std::time::Duration;
use tokio::time::timeout;

use crate::wallet::{WalletError, WalletResult};

/// Default timeout for plain balance reads (5 seconds)
pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(5);

/// Default timeout for a full adjustment, lock wait included (10 seconds)
pub const DEFAULT_TRANSACTION_TIMEOUT: Duration = Duration::from_secs(10);

/// Execute a store operation with a timeout
///
/// # Arguments
///
/// * `duration` - Timeout duration
/// * `future` - Async operation to execute
///
/// # Returns
///
/// * `WalletResult<T>` - The operation's own result, or `WalletError::Timeout`
///
/// # Example
///
/// ```no_run
/// use wallet_ledger::db::timeouts::{with_timeout, DEFAULT_QUERY_TIMEOUT};
/// use wallet_ledger::db::{InMemoryWalletStore, WalletStore};
/// use wallet_ledger::wallet::WalletId;
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = InMemoryWalletStore::new();
/// let balance = with_timeout(DEFAULT_QUERY_TIMEOUT, store.read_balance(WalletId::new())).await?;
/// # Ok(())
/// # }
/// ```
pub async fn with_timeout<F, T>(duration: Duration, future: F) -> WalletResult<T>
where
    F: Future<Output = WalletResult<T>>,
{
    match timeout(duration, future).await {
        Ok(result) => result,
        Err(_) => Err(WalletError::Timeout(duration)),
    }
}

/// Execute a balance read with the default query timeout (5 seconds)
pub async fn with_default_timeout<F, T>(future: F) -> WalletResult<T>
where
    F: Future<Output = WalletResult<T>>,
{
    with_timeout(DEFAULT_QUERY_TIMEOUT, future).await
}
