//! Concurrent settlements and transfers against a file-backed database,
//! where the pool really has several connections competing for the write
//! lock.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tempfile::TempDir;
use tokio::sync::Barrier;

use scoop_core::{
    AssignFinishedGood, Branch, CatalogItem, CoreError, LineRequest, NewOrder, StaffMember,
    TransferRequest,
};
use scoop_db::{Database, DbConfig, DbError};

async fn setup(dir: &TempDir, cone_stock: i64) -> Database {
    let config = DbConfig::new(dir.path().join("scoop.db"))
        .max_connections(4)
        .busy_timeout(Duration::from_secs(10));
    let db = Database::new(config).await.unwrap();
    let reference = db.reference();

    for id in ["centro", "norte"] {
        reference
            .insert_branch(&Branch {
                id: id.to_string(),
                name: id.to_string(),
                address: None,
                created_at: Utc::now(),
            })
            .await
            .unwrap();
    }
    reference
        .insert_staff(&StaffMember {
            id: "s-1".to_string(),
            name: "Ana".to_string(),
            username: "ana".to_string(),
            role: "seller".to_string(),
            branch_id: Some("centro".to_string()),
        })
        .await
        .unwrap();
    reference
        .insert_catalog_item(&CatalogItem {
            id: "cone".to_string(),
            name: "Cone".to_string(),
            base_price_cents: 350,
            is_ice_cream: true,
        })
        .await
        .unwrap();
    db.inventory()
        .assign_finished_good(
            "centro",
            AssignFinishedGood {
                catalog_item_id: "cone".to_string(),
                initial: cone_stock,
            },
        )
        .await
        .unwrap();

    db
}

fn cone_order(quantity: i64) -> NewOrder {
    NewOrder {
        branch_id: "centro".to_string(),
        staff_id: "s-1".to_string(),
        customer_id: None,
        payment_method: None,
        lines: vec![LineRequest::Catalog {
            catalog_item_id: "cone".to_string(),
            quantity,
        }],
    }
}

async fn available(db: &Database, branch: &str) -> i64 {
    db.inventory()
        .list_finished_goods(branch)
        .await
        .unwrap()
        .into_iter()
        .find(|s| s.catalog_item_id == "cone")
        .map(|s| s.available)
        .unwrap_or(0)
}

async fn confirm_together(db: &Database, ids: Vec<String>) -> Vec<Result<(), DbError>> {
    let barrier = Arc::new(Barrier::new(ids.len()));
    let handles: Vec<_> = ids
        .into_iter()
        .map(|id| {
            let db = db.clone();
            let barrier = barrier.clone();
            tokio::spawn(async move {
                barrier.wait().await;
                db.orders().confirm(&id).await.map(|_| ())
            })
        })
        .collect();

    let mut results = Vec::new();
    for handle in handles {
        results.push(handle.await.unwrap());
    }
    results
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_settlements_that_fit_both_succeed() {
    let dir = TempDir::new().unwrap();
    let db = setup(&dir, 10).await;

    let a = db.orders().create(cone_order(4)).await.unwrap();
    let b = db.orders().create(cone_order(5)).await.unwrap();

    let results = confirm_together(&db, vec![a.id, b.id]).await;
    assert!(results.iter().all(|r| r.is_ok()), "{:?}", results);
    assert_eq!(available(&db, "centro").await, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_settlements_never_oversell() {
    let dir = TempDir::new().unwrap();
    let db = setup(&dir, 10).await;

    let mut ids = Vec::new();
    for _ in 0..3 {
        ids.push(db.orders().create(cone_order(6)).await.unwrap().id);
    }

    let results = confirm_together(&db, ids).await;
    let succeeded = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(succeeded, 1);
    for err in results.into_iter().filter_map(Result::err) {
        assert!(
            matches!(err, DbError::Domain(CoreError::InsufficientStock { .. })),
            "unexpected error: {:?}",
            err
        );
    }
    assert_eq!(available(&db, "centro").await, 4);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn transfer_and_settlement_race_keeps_stock_consistent() {
    let dir = TempDir::new().unwrap();
    let db = setup(&dir, 10).await;
    let order = db.orders().create(cone_order(7)).await.unwrap();

    let barrier = Arc::new(Barrier::new(2));
    let settle = {
        let db = db.clone();
        let barrier = barrier.clone();
        tokio::spawn(async move {
            barrier.wait().await;
            db.orders().confirm(&order.id).await.map(|_| ())
        })
    };
    let transfer = {
        let db = db.clone();
        let barrier = barrier.clone();
        tokio::spawn(async move {
            barrier.wait().await;
            db.inventory()
                .transfer(TransferRequest {
                    origin_branch_id: "centro".to_string(),
                    destination_branch_id: "norte".to_string(),
                    catalog_item_id: "cone".to_string(),
                    quantity: 6,
                    reason: None,
                })
                .await
                .map(|_| ())
        })
    };

    let settled = settle.await.unwrap();
    let transferred = transfer.await.unwrap();

    // 7 + 6 > 10, exactly one of them fits
    assert!(settled.is_ok() != transferred.is_ok());

    let centro = available(&db, "centro").await;
    let norte = available(&db, "norte").await;
    if settled.is_ok() {
        assert_eq!((centro, norte), (3, 0));
    } else {
        assert_eq!((centro, norte), (4, 6));
    }
}
