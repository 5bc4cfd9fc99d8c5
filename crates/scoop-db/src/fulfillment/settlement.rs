//! # Inventory Settlement
//!
//! Consumes branch stock for a Pending order and marks it Paid, all or
//! nothing.
//!
//! ## Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  plan_settlement(lines)                                                 │
//! │    [FG cone ×1, FG waffle ×5, RM cocoa 0.10, RM milk 0.75]              │
//! │        │   finished goods first, then raw materials, ascending id       │
//! │        ▼                                                                │
//! │  for each demand:                                                       │
//! │    read record ── missing or short ──► InsufficientStock ─┐             │
//! │    conditional decrement ── 0 rows ──► InsufficientStock ─┤             │
//! │        │                                                  │             │
//! │        ▼                                                  ▼             │
//! │  UPDATE orders SET state = 'paid'             caller drops the tx:      │
//! │  reconcile total                              stock untouched,          │
//! │        │                                      order stays pending       │
//! │        ▼                                                                │
//! │  caller commits                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Runs inside a transaction opened with `BEGIN IMMEDIATE`, so no other
//! writer can change a record between the read and the decrement. The
//! conditional `WHERE available >= ?` still guards the write on its own.

use sqlx::SqliteConnection;
use tracing::{debug, info};

use super::reconcile::reconcile;
use crate::error::{DbError, DbResult};
use crate::repository::order::{mark_paid, order_state};
use crate::repository::stock::{
    decrement_finished_good, decrement_raw_material, get_finished_good, get_raw_material,
};
use scoop_core::{plan_settlement, CoreError, Order, OrderState, Quantity, StockDemand};

/// Settles a Pending order against its branch's stock.
pub async fn settle(conn: &mut SqliteConnection, order: &Order) -> DbResult<()> {
    let plan = plan_settlement(&order.lines)?;

    debug!(
        order_id = %order.id,
        branch_id = %order.branch_id,
        demands = plan.len(),
        "Settling order"
    );

    for demand in &plan {
        consume(conn, &order.branch_id, demand).await?;
    }

    if !mark_paid(conn, &order.id).await? {
        let from = order_state(conn, &order.id)
            .await?
            .ok_or_else(|| CoreError::not_found("Order", &order.id))?;
        return Err(CoreError::InvalidTransition {
            order_id: order.id.clone(),
            from,
            to: OrderState::Paid,
        }
        .into());
    }

    let total = reconcile(conn, &order.id).await?;

    info!(
        order_id = %order.id,
        branch_id = %order.branch_id,
        total = %total,
        "Order settled"
    );
    Ok(())
}

async fn consume(conn: &mut SqliteConnection, branch_id: &str, demand: &StockDemand) -> DbResult<()> {
    let available = match demand {
        StockDemand::FinishedGood {
            catalog_item_id, ..
        } => get_finished_good(&mut *conn, branch_id, catalog_item_id)
            .await?
            .map(|record| Quantity::from_units(record.available)),
        StockDemand::RawMaterial {
            raw_material_id, ..
        } => get_raw_material(&mut *conn, branch_id, raw_material_id)
            .await?
            .map(|record| record.stock),
    };

    let requested = demand.requested();
    let short = || -> DbError {
        CoreError::InsufficientStock {
            pool: demand.pool(),
            branch_id: branch_id.to_string(),
            item_id: demand.item_id().to_string(),
            requested,
            available: available.unwrap_or_default(),
        }
        .into()
    };

    match available {
        Some(available) if available >= requested => {}
        _ => return Err(short()),
    }

    let decremented = match demand {
        StockDemand::FinishedGood {
            catalog_item_id,
            units,
        } => decrement_finished_good(conn, branch_id, catalog_item_id, *units).await?,
        StockDemand::RawMaterial {
            raw_material_id,
            quantity,
        } => decrement_raw_material(conn, branch_id, raw_material_id, *quantity).await?,
    };

    if !decremented {
        return Err(short());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::error::DbError;
    use crate::testing::{catalog_order, customized_line, seeded_db, BRANCH};
    use scoop_core::{
        CoreError, FinishedGoodLevel, OrderPatch, OrderState, PaymentMethod, Quantity, StockPool,
    };

    async fn cone_stock(db: &crate::Database) -> i64 {
        db.inventory()
            .list_finished_goods(BRANCH)
            .await
            .unwrap()
            .into_iter()
            .find(|s| s.catalog_item_id == "cone")
            .map(|s| s.available)
            .unwrap()
    }

    async fn material_stock(db: &crate::Database, id: &str) -> Quantity {
        db.inventory()
            .list_raw_materials(BRANCH, false)
            .await
            .unwrap()
            .into_iter()
            .find(|s| s.raw_material_id == id)
            .map(|s| s.stock)
            .unwrap()
    }

    #[tokio::test]
    async fn test_confirm_consumes_stock() {
        let db = seeded_db().await;
        let mut request = catalog_order(&[("cone", 3)]);
        request.lines.push(customized_line(&[("choc", 50), ("milk", 25)]));
        let order = db.orders().create(request).await.unwrap();

        let paid = db.orders().confirm(&order.id).await.unwrap();

        assert_eq!(paid.state, OrderState::Paid);
        assert!(paid.paid_at.is_some());
        assert_eq!(paid.total_cents, order.total_cents);
        assert_eq!(cone_stock(&db).await, 7);
        assert_eq!(material_stock(&db, "choc").await, Quantity::from_hundredths(450));
        assert_eq!(material_stock(&db, "milk").await, Quantity::from_hundredths(975));
    }

    #[tokio::test]
    async fn test_second_order_fails_when_stock_runs_out() {
        let db = seeded_db().await;

        let first = db.orders().create(catalog_order(&[("cone", 7)])).await.unwrap();
        db.orders().confirm(&first.id).await.unwrap();
        assert_eq!(cone_stock(&db).await, 3);

        let second = db.orders().create(catalog_order(&[("cone", 5)])).await.unwrap();
        let err = db.orders().confirm(&second.id).await.unwrap_err();

        match err {
            DbError::Domain(CoreError::InsufficientStock {
                pool,
                item_id,
                requested,
                available,
                ..
            }) => {
                assert_eq!(pool, StockPool::FinishedGood);
                assert_eq!(item_id, "cone");
                assert_eq!(requested, Quantity::from_units(5));
                assert_eq!(available, Quantity::from_units(3));
            }
            other => panic!("expected InsufficientStock, got {:?}", other),
        }

        assert_eq!(cone_stock(&db).await, 3);
        let second = db.orders().get(&second.id).await.unwrap();
        assert_eq!(second.state, OrderState::Pending);
    }

    #[tokio::test]
    async fn test_settlement_is_all_or_nothing() {
        let db = seeded_db().await;
        // cone is sufficient, choc is short (5.00 in stock)
        let mut request = catalog_order(&[("cone", 2)]);
        request.lines.push(customized_line(&[("choc", 600)]));
        let order = db.orders().create(request).await.unwrap();

        let err = db.orders().confirm(&order.id).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::InsufficientStock {
                pool: StockPool::RawMaterial,
                ..
            })
        ));

        assert_eq!(cone_stock(&db).await, 10);
        assert_eq!(material_stock(&db, "choc").await, Quantity::from_units(5));
        assert_eq!(db.orders().get(&order.id).await.unwrap().state, OrderState::Pending);
    }

    #[tokio::test]
    async fn test_duplicate_lines_are_aggregated() {
        let db = seeded_db().await;
        let order = db
            .orders()
            .create(catalog_order(&[("cone", 6), ("cone", 6)]))
            .await
            .unwrap();

        // 12 > 10 in total even though each line alone fits
        assert!(db.orders().confirm(&order.id).await.is_err());
        assert_eq!(cone_stock(&db).await, 10);
    }

    #[tokio::test]
    async fn test_missing_record_is_insufficient() {
        let db = seeded_db().await;
        // sprinkles exists in the catalog but not at this branch
        let order = db.orders().create(catalog_order(&[("sprinkles", 1)])).await.unwrap();
        let err = db.orders().confirm(&order.id).await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::InsufficientStock { .. })));
    }

    #[tokio::test]
    async fn test_terminal_states_reject_transitions() {
        let db = seeded_db().await;
        let order = db.orders().create(catalog_order(&[("cone", 1)])).await.unwrap();
        db.orders().confirm(&order.id).await.unwrap();

        let err = db.orders().confirm(&order.id).await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::InvalidTransition { .. })));

        let cancel = OrderPatch {
            state: Some(OrderState::Cancelled),
            payment_method: None,
        };
        assert!(db.orders().patch(&order.id, cancel).await.is_err());
        assert_eq!(cone_stock(&db).await, 9);
    }

    #[tokio::test]
    async fn test_cancel_does_not_touch_stock() {
        let db = seeded_db().await;
        let order = db.orders().create(catalog_order(&[("cone", 4)])).await.unwrap();

        let cancelled = db
            .orders()
            .patch(
                &order.id,
                OrderPatch {
                    state: Some(OrderState::Cancelled),
                    payment_method: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(cancelled.state, OrderState::Cancelled);
        assert_eq!(cone_stock(&db).await, 10);

        let err = db.orders().confirm(&order.id).await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::InvalidTransition { .. })));
    }

    #[tokio::test]
    async fn test_payment_method_patch_does_not_settle() {
        let db = seeded_db().await;
        let order = db.orders().create(catalog_order(&[("cone", 1)])).await.unwrap();

        let patched = db
            .orders()
            .patch(
                &order.id,
                OrderPatch {
                    state: None,
                    payment_method: Some(PaymentMethod::Card),
                },
            )
            .await
            .unwrap();

        assert_eq!(patched.state, OrderState::Pending);
        assert_eq!(patched.payment_method, Some(PaymentMethod::Card));
        assert_eq!(cone_stock(&db).await, 10);
    }

    #[tokio::test]
    async fn test_settlement_sees_adjusted_stock() {
        let db = seeded_db().await;
        let order = db.orders().create(catalog_order(&[("cone", 4)])).await.unwrap();

        db.inventory()
            .adjust_finished_good(
                BRANCH,
                "cone",
                FinishedGoodLevel {
                    available: 2,
                    reason: Some("melted".to_string()),
                },
            )
            .await
            .unwrap();

        assert!(db.orders().confirm(&order.id).await.is_err());
        assert_eq!(cone_stock(&db).await, 2);
    }
}
