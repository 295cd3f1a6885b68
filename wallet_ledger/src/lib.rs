//! # Wallet Ledger
//!
//! Per-wallet integer balances that many callers can credit and debit
//! concurrently without lost updates or negative balances.
//!
//! ## Architecture
//!
//! Three layers, leaves first:
//!
//! - **WalletStore** ([`db`]): durable `wallet_id -> balance` storage with an
//!   exclusive per-wallet transaction. PostgreSQL in production, an in-memory
//!   engine for tests and local runs.
//! - **BalanceMutator** ([`wallet::BalanceMutator`]): reads the balance under
//!   the wallet lock, checks the delta against it and commits, as one unit.
//! - **LedgerFacade** ([`wallet::LedgerFacade`]): validates a request and turns
//!   it into a signed delta.
//!
//! Adjustments on the same wallet are totally ordered by commit time.
//! Adjustments on different wallets never wait on each other.
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use wallet_ledger::db::InMemoryWalletStore;
//! use wallet_ledger::wallet::{LedgerFacade, OperationRequest, WalletId};
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let ledger = LedgerFacade::new(Arc::new(InMemoryWalletStore::new()));
//! let wallet = WalletId::new();
//!
//! assert_eq!(ledger.apply(&OperationRequest::deposit(wallet, 1000)).await.unwrap(), 1000);
//! assert_eq!(ledger.query(wallet).await.unwrap(), 1000);
//! # });
//! ```

/// Storage engines, connection pool lifecycle and deadline helpers.
pub mod db;

/// Mutation protocol, request model and error taxonomy.
pub mod wallet;

pub use wallet::{
    LedgerFacade, OperationKind, OperationRequest, WalletError, WalletId, WalletResult,
    WalletService,
};
