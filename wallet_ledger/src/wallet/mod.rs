//! Wallet module: per-wallet integer balances with a lock-then-check mutation protocol.
//!
//! This module implements:
//! - [`LedgerFacade`]: request validation and deposit/withdraw sign translation
//! - [`BalanceMutator`]: one exclusive store transaction per adjustment
//! - The error taxonomy shared by every layer ([`WalletError`], [`ErrorKind`])
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use wallet_ledger::db::{Database, DatabaseConfig};
//! use wallet_ledger::wallet::{LedgerFacade, OperationRequest, WalletId};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::new(&DatabaseConfig::from_env()).await?;
//!     let ledger = LedgerFacade::new(Arc::new(db.wallet_store()));
//!
//!     let wallet = WalletId::new();
//!     ledger.apply(&OperationRequest::deposit(wallet, 1000)).await?;
//!     let balance = ledger.apply(&OperationRequest::withdraw(wallet, 300)).await?;
//!     assert_eq!(balance, 700);
//!
//!     db.close().await;
//!     Ok(())
//! }
//! ```

pub mod errors;
pub mod ledger;
pub mod models;
pub mod mutator;

pub use errors::{ErrorKind, WalletError, WalletResult};
pub use ledger::{LedgerFacade, WalletService};
pub use models::{OperationKind, OperationRequest, WalletId};
pub use mutator::{BalanceMutator, CallBudget};
