//! In-process [`WalletStore`] backed by a map of committed balances.
//!
//! Each wallet id gets its own `tokio::sync::Mutex`, which plays the part of
//! the row lock: waiters are served in FIFO order and a dropped guard releases
//! the lock. A lock entry only lives while some transaction holds or waits on
//! it. Committed balances live in a separate map so that plain reads never
//! wait on an in-flight adjustment.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use tokio::sync::OwnedMutexGuard;

type RowLock = Arc<tokio::sync::Mutex<()>>;

use super::repository::{WalletStore, WalletTxn};
use crate::wallet::{WalletId, WalletResult};

#[derive(Default)]
struct Inner {
    balances: RwLock<HashMap<WalletId, i64>>,
    row_locks: Mutex<HashMap<WalletId, RowLock>>,
}

impl Inner {
    fn committed(&self, wallet_id: WalletId) -> Option<i64> {
        self.balances
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&wallet_id)
            .copied()
    }

    /// Clones are only handed out under the table mutex, so a count can't
    /// grow while [`release_row_lock`](Self::release_row_lock) holds it.
    fn row_lock(&self, wallet_id: WalletId) -> RowLock {
        let mut locks = self.row_locks.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(locks.entry(wallet_id).or_default())
    }

    /// Drop the table entry if `held` is the last reference besides the table
    fn release_row_lock(&self, wallet_id: WalletId, held: &RowLock) {
        let mut locks = self.row_locks.lock().unwrap_or_else(PoisonError::into_inner);
        let idle = locks
            .get(&wallet_id)
            .is_some_and(|entry| Arc::ptr_eq(entry, held) && Arc::strong_count(entry) == 2);
        if idle {
            locks.remove(&wallet_id);
        }
    }

    #[cfg(test)]
    fn row_lock_count(&self) -> usize {
        self.row_locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

/// In-memory wallet store
#[derive(Clone, Default)]
pub struct InMemoryWalletStore {
    inner: Arc<Inner>,
}

impl InMemoryWalletStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of wallets that have been materialized by a deposit
    pub fn wallet_count(&self) -> usize {
        self.inner
            .balances
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

/// Lock guard plus the pending write target
pub struct InMemoryWalletTxn {
    inner: Arc<Inner>,
    wallet_id: WalletId,
    _guard: OwnedMutexGuard<()>,
}

#[async_trait]
impl WalletStore for InMemoryWalletStore {
    type Txn = InMemoryWalletTxn;

    async fn read_balance(&self, wallet_id: WalletId) -> WalletResult<Option<i64>> {
        Ok(self.inner.committed(wallet_id))
    }

    async fn begin_exclusive(
        &self,
        wallet_id: WalletId,
    ) -> WalletResult<(Option<i64>, Self::Txn)> {
        let guard = self.inner.row_lock(wallet_id).lock_owned().await;
        let balance = self.inner.committed(wallet_id);

        Ok((
            balance,
            InMemoryWalletTxn {
                inner: Arc::clone(&self.inner),
                wallet_id,
                _guard: guard,
            },
        ))
    }

    async fn ping(&self) -> WalletResult<()> {
        Ok(())
    }
}

impl Drop for InMemoryWalletTxn {
    fn drop(&mut self) {
        self.inner
            .release_row_lock(self.wallet_id, OwnedMutexGuard::mutex(&self._guard));
    }
}

#[async_trait]
impl WalletTxn for InMemoryWalletTxn {
    async fn commit(self, new_balance: i64) -> WalletResult<()> {
        let created = self
            .inner
            .balances
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(self.wallet_id, new_balance)
            .is_none();

        if created {
            log::debug!("Created wallet {}", self.wallet_id);
        }
        Ok(())
    }

    async fn abort(self) -> WalletResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_absent_wallet_reads_none() {
        let store = InMemoryWalletStore::new();
        assert_eq!(store.read_balance(WalletId::new()).await.unwrap(), None);
        assert_eq!(store.wallet_count(), 0);
    }

    #[tokio::test]
    async fn test_commit_creates_then_updates() {
        let store = InMemoryWalletStore::new();
        let id = WalletId::new();

        let (balance, txn) = store.begin_exclusive(id).await.unwrap();
        assert_eq!(balance, None);
        txn.commit(100).await.unwrap();

        let (balance, txn) = store.begin_exclusive(id).await.unwrap();
        assert_eq!(balance, Some(100));
        txn.commit(40).await.unwrap();

        assert_eq!(store.read_balance(id).await.unwrap(), Some(40));
        assert_eq!(store.wallet_count(), 1);
    }

    #[tokio::test]
    async fn test_abort_leaves_state_untouched() {
        let store = InMemoryWalletStore::new();
        let id = WalletId::new();

        let (_, txn) = store.begin_exclusive(id).await.unwrap();
        txn.abort().await.unwrap();

        assert_eq!(store.read_balance(id).await.unwrap(), None);
        // Lock must be free again
        let (_, txn) = tokio::time::timeout(Duration::from_secs(1), store.begin_exclusive(id))
            .await
            .expect("lock should have been released")
            .unwrap();
        txn.abort().await.unwrap();
    }

    #[tokio::test]
    async fn test_second_holder_waits_for_first() {
        let store = InMemoryWalletStore::new();
        let id = WalletId::new();

        let (_, first) = store.begin_exclusive(id).await.unwrap();

        let blocked =
            tokio::time::timeout(Duration::from_millis(50), store.begin_exclusive(id)).await;
        assert!(blocked.is_err(), "second begin_exclusive must wait");

        first.commit(5).await.unwrap();

        let (balance, second) = store.begin_exclusive(id).await.unwrap();
        assert_eq!(balance, Some(5));
        second.abort().await.unwrap();
    }

    #[tokio::test]
    async fn test_distinct_wallets_do_not_block() {
        let store = InMemoryWalletStore::new();
        let (_, held) = store.begin_exclusive(WalletId::new()).await.unwrap();

        let other = tokio::time::timeout(
            Duration::from_secs(1),
            store.begin_exclusive(WalletId::new()),
        )
        .await
        .expect("unrelated wallet must not wait");
        other.unwrap().1.abort().await.unwrap();
        held.abort().await.unwrap();
    }

    #[tokio::test]
    async fn test_reads_do_not_wait_on_lock() {
        let store = InMemoryWalletStore::new();
        let id = WalletId::new();
        let (_, txn) = store.begin_exclusive(id).await.unwrap();
        txn.commit(10).await.unwrap();

        let (_, held) = store.begin_exclusive(id).await.unwrap();
        let read = tokio::time::timeout(Duration::from_millis(100), store.read_balance(id))
            .await
            .expect("plain reads must not block");
        assert_eq!(read.unwrap(), Some(10));
        drop(held);
    }

    #[tokio::test]
    async fn test_dropped_txn_releases_lock_without_write() {
        let store = InMemoryWalletStore::new();
        let id = WalletId::new();

        let (_, txn) = store.begin_exclusive(id).await.unwrap();
        drop(txn);

        let (balance, txn) = tokio::time::timeout(Duration::from_secs(1), store.begin_exclusive(id))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(balance, None);
        txn.abort().await.unwrap();
    }

    #[tokio::test]
    async fn test_lock_table_empty_after_rejected_withdrawals() {
        let store = Arc::new(InMemoryWalletStore::new());
        let mutator = crate::wallet::BalanceMutator::new(Arc::clone(&store));

        for _ in 0..1000 {
            let err = mutator.adjust_balance(WalletId::new(), -1).await.unwrap_err();
            assert!(matches!(err, crate::wallet::WalletError::WalletNotFound(_)));
        }

        assert_eq!(store.wallet_count(), 0);
        assert_eq!(store.inner.row_lock_count(), 0);
    }

    #[tokio::test]
    async fn test_lock_entry_released_after_commit() {
        let store = InMemoryWalletStore::new();
        let id = WalletId::new();

        let (_, txn) = store.begin_exclusive(id).await.unwrap();
        assert_eq!(store.inner.row_lock_count(), 1);
        txn.commit(25).await.unwrap();

        assert_eq!(store.inner.row_lock_count(), 0);
        assert_eq!(store.read_balance(id).await.unwrap(), Some(25));
    }

    #[tokio::test]
    async fn test_lock_entry_kept_while_waiters_queue() {
        let store = InMemoryWalletStore::new();
        let id = WalletId::new();

        let (_, first) = store.begin_exclusive(id).await.unwrap();
        let waiter = {
            let store = store.clone();
            tokio::spawn(async move { store.begin_exclusive(id).await.unwrap().1 })
        };
        // Let the waiter queue on the row lock
        tokio::time::sleep(Duration::from_millis(20)).await;

        drop(first);
        let second = waiter.await.unwrap();
        assert_eq!(store.inner.row_lock_count(), 1);

        // A newcomer must still contend with the current holder
        let blocked =
            tokio::time::timeout(Duration::from_millis(50), store.begin_exclusive(id)).await;
        assert!(blocked.is_err(), "newcomer must wait on the same lock");

        drop(second);
        assert_eq!(store.inner.row_lock_count(), 0);
    }
}
