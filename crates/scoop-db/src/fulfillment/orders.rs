//! Order operations: create, get, list, patch, confirm.
//!
//! Each mutating call validates first, then opens one write transaction,
//! runs the composer or the settlement engine on it and commits. Early
//! returns drop the transaction, which rolls it back.

use sqlx::SqlitePool;
use tracing::{info, warn};

use super::composer::compose;
use super::reconcile::{derive_total, reconcile};
use super::settlement::settle;
use crate::error::{DbError, DbResult};
use crate::pool::begin_write;
use crate::repository::order::{
    list_for_branch, load_order, mark_cancelled, order_branch, order_state, set_payment_method,
};
use crate::repository::reference::require_branch;
use scoop_core::{CoreError, NewOrder, Order, OrderPatch, OrderState, Transition};

/// Order use cases over a connection pool.
#[derive(Debug, Clone)]
pub struct OrderService {
    pool: SqlitePool,
}

impl OrderService {
    pub fn new(pool: SqlitePool) -> Self {
        OrderService { pool }
    }

    /// Composes, prices and persists a new Pending order.
    pub async fn create(&self, order: NewOrder) -> DbResult<Order> {
        order.validate()?;

        let mut tx = begin_write(&self.pool).await?;
        let order_id = compose(&mut tx, &order).await?;
        let created = load_order(&mut tx, &order_id)
            .await?
            .ok_or_else(|| DbError::Internal(format!("order {} vanished after insert", order_id)))?;
        tx.commit().await?;

        info!(
            order_id = %created.id,
            branch_id = %created.branch_id,
            lines = created.lines.len(),
            total = %created.total(),
            "Order created"
        );
        Ok(created)
    }

    /// Loads an order, re-deriving its total if it reads zero with lines.
    pub async fn get(&self, id: &str) -> DbResult<Order> {
        let order = {
            let mut conn = self.pool.acquire().await?;
            load_order(&mut conn, id).await?
        }
        .ok_or_else(|| CoreError::not_found("Order", id))?;

        if !looks_unset(&order) {
            return Ok(order);
        }

        let mut tx = begin_write(&self.pool).await?;
        let derived = derive_total(&mut tx, id).await?;
        if derived.cents() == order.total_cents {
            return Ok(order);
        }

        warn!(order_id = %id, derived = %derived, "Order total was unset, reconciling");
        reconcile(&mut tx, id).await?;
        let order = load_order(&mut tx, id)
            .await?
            .ok_or_else(|| CoreError::not_found("Order", id))?;
        tx.commit().await?;
        Ok(order)
    }

    /// Branch of an order. Read-only, for authorization before [`get`](Self::get).
    pub async fn branch_of(&self, id: &str) -> DbResult<String> {
        let mut conn = self.pool.acquire().await?;
        order_branch(&mut conn, id)
            .await?
            .ok_or_else(|| CoreError::not_found("Order", id).into())
    }

    /// Orders of a branch, newest first. Unknown branch is `NotFound`.
    ///
    /// Unset totals are repaired the same way [`get`](Self::get) repairs them.
    pub async fn list(&self, branch_id: &str, state: Option<OrderState>) -> DbResult<Vec<Order>> {
        let mut orders = {
            let mut conn = self.pool.acquire().await?;
            require_branch(&mut *conn, branch_id).await?;
            list_for_branch(&mut conn, branch_id, state).await?
        };

        if !orders.iter().any(looks_unset) {
            return Ok(orders);
        }

        let mut tx = begin_write(&self.pool).await?;
        for order in orders.iter_mut().filter(|order| looks_unset(order)) {
            let derived = derive_total(&mut tx, &order.id).await?;
            if derived.cents() != order.total_cents {
                warn!(order_id = %order.id, derived = %derived, "Order total was unset, reconciling");
                order.total_cents = reconcile(&mut tx, &order.id).await?.cents();
            }
        }
        tx.commit().await?;
        Ok(orders)
    }

    /// Applies a state change and/or payment method in one transaction.
    ///
    /// `Paid` settles stock; `Cancelled` never touches stock.
    pub async fn patch(&self, id: &str, patch: OrderPatch) -> DbResult<Order> {
        patch.validate()?;

        let mut tx = begin_write(&self.pool).await?;
        let order = load_order(&mut tx, id)
            .await?
            .ok_or_else(|| CoreError::not_found("Order", id))?;

        let transition = match patch.state {
            Some(to) => order.state.transition(id, to)?,
            None => Transition::Unchanged,
        };

        if let Some(method) = patch.payment_method {
            set_payment_method(&mut tx, id, method).await?;
        }

        match transition {
            Transition::Settle => settle(&mut tx, &order).await?,
            Transition::Cancel => {
                if !mark_cancelled(&mut tx, id).await? {
                    let from = order_state(&mut tx, id).await?.unwrap_or(order.state);
                    return Err(CoreError::InvalidTransition {
                        order_id: id.to_string(),
                        from,
                        to: OrderState::Cancelled,
                    }
                    .into());
                }
                info!(order_id = %id, "Order cancelled");
            }
            Transition::Unchanged => {}
        }

        let updated = load_order(&mut tx, id)
            .await?
            .ok_or_else(|| CoreError::not_found("Order", id))?;
        tx.commit().await?;
        Ok(updated)
    }

    /// Pending → Paid.
    pub async fn confirm(&self, id: &str) -> DbResult<Order> {
        self.patch(
            id,
            OrderPatch {
                state: Some(OrderState::Paid),
                payment_method: None,
            },
        )
        .await
    }
}

/// A zero total with lines present may be a total that was never reconciled.
fn looks_unset(order: &Order) -> bool {
    order.total_cents == 0 && !order.lines.is_empty()
}
