//! Integration tests for the PostgreSQL wallet store.
//!
//! These need a reachable database. Set `DATABASE_URL` to run them; without it
//! every test returns early.

use serial_test::serial;
use std::sync::Arc;
use std::time::Duration;
use wallet_ledger::db::{Database, DatabaseConfig, PgWalletStore, WalletStore, WalletTxn};
use wallet_ledger::wallet::{CallBudget, ErrorKind, LedgerFacade, OperationRequest, WalletId};

/// Helper to create a test database, or `None` when no database is configured
async fn setup_test_db() -> Option<Database> {
    let Ok(database_url) = std::env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL not set, skipping PostgreSQL test");
        return None;
    };

    let config = DatabaseConfig {
        database_url,
        max_connections: 20,
        min_connections: 1,
        connection_timeout_secs: 5,
        idle_timeout_secs: 300,
        max_lifetime_secs: 300,
    };

    let db = Database::new(&config)
        .await
        .expect("Failed to create test database");
    db.migrate().await.expect("Failed to create schema");
    Some(db)
}

async fn setup_ledger() -> Option<(Database, Arc<LedgerFacade<PgWalletStore>>)> {
    let db = setup_test_db().await?;
    let ledger = Arc::new(LedgerFacade::new(Arc::new(db.wallet_store())));
    Some((db, ledger))
}

/// Helper to cleanup a test wallet
async fn cleanup_wallet(db: &Database, wallet: WalletId) {
    let _ = sqlx::query("DELETE FROM wallets WHERE id = $1")
        .bind(wallet.into_uuid())
        .execute(db.pool())
        .await;
}

#[tokio::test]
#[serial]
async fn test_health_check() {
    let Some(db) = setup_test_db().await else {
        return;
    };
    db.health_check().await.expect("Health check failed");
    db.wallet_store().ping().await.expect("Ping failed");
    db.close().await;
}

#[tokio::test]
#[serial]
async fn test_reference_scenario() {
    let Some((db, ledger)) = setup_ledger().await else {
        return;
    };
    let wallet = WalletId::new();

    assert_eq!(
        ledger.query(wallet).await.unwrap_err().kind(),
        ErrorKind::WalletNotFound
    );
    assert_eq!(
        ledger
            .apply(&OperationRequest::withdraw(wallet, 1))
            .await
            .unwrap_err()
            .kind(),
        ErrorKind::WalletNotFound
    );

    assert_eq!(ledger.apply(&OperationRequest::deposit(wallet, 1000)).await.unwrap(), 1000);
    assert_eq!(ledger.apply(&OperationRequest::withdraw(wallet, 300)).await.unwrap(), 700);
    assert_eq!(
        ledger
            .apply(&OperationRequest::withdraw(wallet, 1000))
            .await
            .unwrap_err()
            .kind(),
        ErrorKind::InsufficientFunds
    );
    assert_eq!(ledger.query(wallet).await.unwrap(), 700);
    assert_eq!(ledger.apply(&OperationRequest::deposit(wallet, 500)).await.unwrap(), 1200);

    cleanup_wallet(&db, wallet).await;
    db.close().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[serial]
async fn test_concurrent_first_deposits_create_one_row() {
    let Some((db, ledger)) = setup_ledger().await else {
        return;
    };
    let wallet = WalletId::new();

    let handles: Vec<_> = (0..10)
        .map(|_| {
            let ledger = Arc::clone(&ledger);
            tokio::spawn(async move { ledger.apply(&OperationRequest::deposit(wallet, 1)).await })
        })
        .collect();

    for handle in handles {
        handle.await.unwrap().expect("every deposit should succeed");
    }
    assert_eq!(ledger.query(wallet).await.unwrap(), 10);

    cleanup_wallet(&db, wallet).await;
    db.close().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[serial]
async fn test_concurrent_withdrawals_exactly_one_wins() {
    let Some((db, ledger)) = setup_ledger().await else {
        return;
    };
    let wallet = WalletId::new();
    ledger.apply(&OperationRequest::deposit(wallet, 100)).await.unwrap();

    let a = {
        let ledger = Arc::clone(&ledger);
        tokio::spawn(async move { ledger.apply(&OperationRequest::withdraw(wallet, 70)).await })
    };
    let b = {
        let ledger = Arc::clone(&ledger);
        tokio::spawn(async move { ledger.apply(&OperationRequest::withdraw(wallet, 60)).await })
    };
    let results = [a.await.unwrap(), b.await.unwrap()];

    let wins = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(wins, 1, "results: {results:?}");
    let final_balance = ledger.query(wallet).await.unwrap();
    assert!(final_balance == 30 || final_balance == 40);

    cleanup_wallet(&db, wallet).await;
    db.close().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[serial]
async fn test_concurrent_mixed_operations() {
    let Some((db, ledger)) = setup_ledger().await else {
        return;
    };
    let wallet = WalletId::new();
    ledger.apply(&OperationRequest::deposit(wallet, 1000)).await.unwrap();

    let mut handles = Vec::new();
    for _ in 0..5 {
        let ledger = Arc::clone(&ledger);
        handles.push(tokio::spawn(async move {
            ledger.apply(&OperationRequest::deposit(wallet, 200)).await
        }));
    }
    for _ in 0..3 {
        let ledger = Arc::clone(&ledger);
        handles.push(tokio::spawn(async move {
            ledger.apply(&OperationRequest::withdraw(wallet, 100)).await
        }));
    }
    for handle in handles {
        handle.await.unwrap().expect("operation should succeed");
    }

    assert_eq!(ledger.query(wallet).await.unwrap(), 1700);

    cleanup_wallet(&db, wallet).await;
    db.close().await;
}

#[tokio::test]
#[serial]
async fn test_timeout_rolls_back_and_releases_lock() {
    let Some((db, ledger)) = setup_ledger().await else {
        return;
    };
    let wallet = WalletId::new();
    ledger.apply(&OperationRequest::deposit(wallet, 500)).await.unwrap();

    let store = db.wallet_store();
    let (balance, held) = store.begin_exclusive(wallet).await.unwrap();
    assert_eq!(balance, Some(500));

    let err = ledger
        .apply_within(
            &OperationRequest::withdraw(wallet, 100),
            &CallBudget::with_timeout(Duration::from_millis(200)),
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Timeout);

    held.abort().await.unwrap();
    assert_eq!(ledger.query(wallet).await.unwrap(), 500);
    assert_eq!(ledger.apply(&OperationRequest::withdraw(wallet, 100)).await.unwrap(), 400);

    cleanup_wallet(&db, wallet).await;
    db.close().await;
}
