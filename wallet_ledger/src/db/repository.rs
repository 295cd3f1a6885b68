//! Wallet store abstractions and the PostgreSQL implementation.
//!
//! A [`WalletStore`] offers two paths into the `wallets` table:
//!
//! - a plain, non-locking [`read_balance`](WalletStore::read_balance) that
//!   observes committed state only, and
//! - [`begin_exclusive`](WalletStore::begin_exclusive), which holds the
//!   wallet's write-intent lock until the returned [`WalletTxn`] is committed,
//!   aborted or dropped.
//!
//! Dropping an unfinished [`WalletTxn`] releases the lock and discards the
//! write. Deadline expiry and caller cancellation rely on this.

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Row, Transaction};

use crate::wallet::{WalletId, WalletResult};

/// Exclusive transaction over a single wallet row
#[async_trait]
pub trait WalletTxn: Send {
    /// Write `new_balance` and release the lock.
    ///
    /// Creates the row when the wallet was absent at `begin_exclusive` time.
    async fn commit(self, new_balance: i64) -> WalletResult<()>;

    /// Release the lock without writing anything
    async fn abort(self) -> WalletResult<()>;
}

/// Durable `wallet_id -> balance` storage with a per-wallet exclusive lock
#[async_trait]
pub trait WalletStore: Send + Sync {
    type Txn: WalletTxn + 'static;

    /// Committed balance, or `None` if the wallet has never been credited
    async fn read_balance(&self, wallet_id: WalletId) -> WalletResult<Option<i64>>;

    /// Acquire the wallet's write-intent lock and read the balance under it.
    ///
    /// Blocks while another transaction holds the lock for the same wallet.
    /// Transactions on distinct wallets never wait on each other.
    async fn begin_exclusive(&self, wallet_id: WalletId) -> WalletResult<(Option<i64>, Self::Txn)>;

    /// Check that the storage engine is reachable
    async fn ping(&self) -> WalletResult<()>;
}

/// PostgreSQL implementation of [`WalletStore`]
#[derive(Clone)]
pub struct PgWalletStore {
    pool: PgPool,
}

impl PgWalletStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Open PostgreSQL transaction holding a wallet's lock
pub struct PgWalletTxn {
    tx: Transaction<'static, Postgres>,
    wallet_id: WalletId,
    exists: bool,
}

#[async_trait]
impl WalletStore for PgWalletStore {
    type Txn = PgWalletTxn;

    async fn read_balance(&self, wallet_id: WalletId) -> WalletResult<Option<i64>> {
        let row = sqlx::query("SELECT balance FROM wallets WHERE id = $1")
            .bind(wallet_id.into_uuid())
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|r| r.get("balance")))
    }

    async fn begin_exclusive(
        &self,
        wallet_id: WalletId,
    ) -> WalletResult<(Option<i64>, Self::Txn)> {
        let mut tx = self.pool.begin().await?;

        // FOR UPDATE locks nothing while the row is absent, so two first
        // deposits would both insert. The advisory lock covers that case.
        sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1, 0))")
            .bind(wallet_id.to_string())
            .execute(&mut *tx)
            .await?;

        let row = sqlx::query("SELECT balance FROM wallets WHERE id = $1 FOR UPDATE")
            .bind(wallet_id.into_uuid())
            .fetch_optional(&mut *tx)
            .await?;

        let balance: Option<i64> = row.map(|r| r.get("balance"));
        log::debug!("Acquired lock on wallet {wallet_id} (exists: {})", balance.is_some());

        Ok((
            balance,
            PgWalletTxn {
                tx,
                wallet_id,
                exists: balance.is_some(),
            },
        ))
    }

    async fn ping(&self) -> WalletResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl WalletTxn for PgWalletTxn {
    async fn commit(mut self, new_balance: i64) -> WalletResult<()> {
        if self.exists {
            sqlx::query("UPDATE wallets SET balance = $1, updated_at = NOW() WHERE id = $2")
                .bind(new_balance)
                .bind(self.wallet_id.into_uuid())
                .execute(&mut *self.tx)
                .await?;
        } else {
            sqlx::query("INSERT INTO wallets (id, balance) VALUES ($1, $2)")
                .bind(self.wallet_id.into_uuid())
                .bind(new_balance)
                .execute(&mut *self.tx)
                .await?;
            log::debug!("Created wallet {}", self.wallet_id);
        }

        self.tx.commit().await?;
        Ok(())
    }

    async fn abort(self) -> WalletResult<()> {
        self.tx.rollback().await?;
        Ok(())
    }
}
