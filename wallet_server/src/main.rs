//! Wallet ledger HTTP server.
//!
//! Serves deposits, withdrawals and balance queries backed by PostgreSQL or
//! an in-memory store.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Error;
use pico_args::Arguments;
use tracing::info;
use wallet_ledger::{
    db::{Database, InMemoryWalletStore},
    wallet::{CallBudget, LedgerFacade, WalletService},
};
use wallet_server::{
    api,
    config::{ServerConfig, StorageBackend},
    logging, metrics,
};

const HELP: &str = "\
Run the wallet ledger server

USAGE:
  wallet_server [OPTIONS]

OPTIONS:
  --bind       IP:PORT     Server socket bind address  [default: env SERVER_BIND or 0.0.0.0:8080]
  --db-url     URL         Database connection string  [default: env DATABASE_URL]

FLAGS:
  --in-memory              Keep balances in process memory instead of PostgreSQL
  -h, --help               Print help information

ENVIRONMENT:
  SERVER_BIND              Server bind address (e.g., 0.0.0.0:8080)
  DATABASE_URL             PostgreSQL connection string
  WALLET_STORAGE           postgres | memory
  WALLET_OP_TIMEOUT_MS     Deadline for one deposit/withdraw
  METRICS_BIND             Prometheus scrape address (disabled when unset)
  (See .env file for all configuration options)
";

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let in_memory = pargs.contains("--in-memory");
    let bind: Option<SocketAddr> = pargs.opt_value_from_str("--bind")?;
    let database_url: Option<String> = pargs.opt_value_from_str("--db-url")?;

    let remaining = pargs.finish();
    if !remaining.is_empty() {
        anyhow::bail!("Unexpected arguments: {remaining:?}");
    }

    logging::init();

    let config = ServerConfig::from_env(bind, database_url, in_memory)?;
    config.validate()?;

    if let Some(addr) = config.metrics_bind {
        metrics::init_metrics(addr).map_err(|e| anyhow::anyhow!(e))?;
        info!("Prometheus metrics available at http://{}/metrics", addr);
    }

    let budget = CallBudget::with_timeout(config.operation_timeout);

    let (ledger, database): (Arc<dyn WalletService>, Option<Database>) = match config.storage {
        StorageBackend::Postgres => {
            info!("Connecting to database");
            let db = Database::new(&config.database)
                .await
                .map_err(|e| anyhow::anyhow!("Failed to connect to database: {}", e))?;
            db.migrate()
                .await
                .map_err(|e| anyhow::anyhow!("Failed to apply schema: {}", e))?;
            info!("Database connected successfully");

            let store = Arc::new(db.wallet_store());
            let ledger: Arc<dyn WalletService> =
                Arc::new(LedgerFacade::with_default_budget(store, budget));
            (ledger, Some(db))
        }
        StorageBackend::InMemory => {
            tracing::warn!("Using in-memory wallet store; balances are lost on exit");
            let store = Arc::new(InMemoryWalletStore::new());
            let ledger: Arc<dyn WalletService> =
                Arc::new(LedgerFacade::with_default_budget(store, budget));
            (ledger, None)
        }
    };

    let app = api::create_router(api::AppState { ledger });

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind to {}: {}", config.bind, e))?;

    info!(
        "Server is running at http://{}. Press Ctrl+C to stop.",
        config.bind
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

    info!("Shutting down server...");

    if let Some(db) = database {
        db.close().await;
        info!("Database pool closed");
    }

    Ok(())
}

/// Resolves on Ctrl+C or, on Unix, SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
