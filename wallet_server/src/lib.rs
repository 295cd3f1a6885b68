//! HTTP front end for [`wallet_ledger`].

pub mod api;
pub mod config;
pub mod logging;
pub mod metrics;
