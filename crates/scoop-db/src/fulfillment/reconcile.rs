//! Total reconciliation: `orders.total_cents = Σ line_items.subtotal_cents`.
//!
//! Idempotent. Composition and settlement call [`reconcile`] before they
//! commit; reads only re-derive when the stored total looks unset.

use sqlx::SqliteConnection;
use tracing::debug;

use crate::error::DbResult;
use scoop_core::{CoreError, Money};

/// Sum of the line subtotals of an order, without writing anything.
pub async fn derive_total(conn: &mut SqliteConnection, order_id: &str) -> DbResult<Money> {
    let cents: i64 = sqlx::query_scalar(
        "SELECT COALESCE(SUM(subtotal_cents), 0) FROM line_items WHERE order_id = ?1",
    )
    .bind(order_id)
    .fetch_one(&mut *conn)
    .await?;
    Ok(Money::from_cents(cents))
}

/// Recomputes and stores the order total, returning it.
pub async fn reconcile(conn: &mut SqliteConnection, order_id: &str) -> DbResult<Money> {
    let cents: Option<i64> = sqlx::query_scalar(
        r#"
        UPDATE orders
        SET total_cents = (
            SELECT COALESCE(SUM(subtotal_cents), 0)
            FROM line_items
            WHERE order_id = ?1
        )
        WHERE id = ?1
        RETURNING total_cents
        "#,
    )
    .bind(order_id)
    .fetch_optional(&mut *conn)
    .await?;

    let total = cents
        .map(Money::from_cents)
        .ok_or_else(|| CoreError::not_found("Order", order_id))?;

    debug!(order_id = %order_id, total = %total, "Reconciled order total");
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::begin_write;
    use crate::testing::{catalog_order, seeded_db};

    #[tokio::test]
    async fn test_reconcile_is_idempotent() {
        let db = seeded_db().await;
        let order = db.orders().create(catalog_order(&[("cone", 2), ("waffle", 1)])).await.unwrap();
        assert_eq!(order.total_cents, 2 * 350 + 500);

        let mut tx = begin_write(db.pool()).await.unwrap();
        let first = reconcile(&mut tx, &order.id).await.unwrap();
        let second = reconcile(&mut tx, &order.id).await.unwrap();
        let derived = derive_total(&mut tx, &order.id).await.unwrap();
        tx.commit().await.unwrap();

        assert_eq!(first, second);
        assert_eq!(first, derived);
        assert_eq!(first.cents(), order.total_cents);
    }

    #[tokio::test]
    async fn test_reconcile_unknown_order() {
        let db = seeded_db().await;
        let mut tx = begin_write(db.pool()).await.unwrap();
        let err = reconcile(&mut tx, "missing").await.unwrap_err();
        assert!(err.to_string().contains("Order not found"));
    }
}
