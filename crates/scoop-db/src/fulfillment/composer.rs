//! # Order Composer
//!
//! Turns a validated [`NewOrder`] into persisted rows inside one write
//! transaction.
//!
//! ## Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. branch, staff (and customer if given) must exist                    │
//! │  2. INSERT orders (pending, total 0)                                    │
//! │  3. per line, in request order:                                         │
//! │       Catalog     resolve item ─► feasibility warn ─► price ─► INSERT   │
//! │       Customized  per component: resolve ─► feasibility warn ─► price   │
//! │                   INSERT customized_items, components, line_items       │
//! │  4. reconcile total                                                     │
//! │                                                                         │
//! │  Any error: caller drops the transaction, nothing is persisted          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Feasibility checks never reserve or block; stock is only consumed when
//! the order is settled.

use sqlx::SqliteConnection;
use tracing::{debug, warn};

use super::pricing::{price_catalog_line, price_customized_component};
use super::reconcile::reconcile;
use crate::error::DbResult;
use crate::repository::order::{
    insert_catalog_line, insert_component, insert_customized_item, insert_customized_line,
    insert_order, NewOrderHeader,
};
use crate::repository::reference::{require_branch, require_customer, require_staff};
use crate::repository::stock::{get_finished_good, get_raw_material};
use scoop_core::pricing::{price_customized_item, LinePrice};
use scoop_core::{CustomizationRequest, LineRequest, Money, NewOrder, Quantity};

/// Persists `order` and returns the new order id.
///
/// The caller owns the transaction and decides whether to commit.
pub async fn compose(conn: &mut SqliteConnection, order: &NewOrder) -> DbResult<String> {
    require_branch(&mut *conn, &order.branch_id).await?;
    require_staff(&mut *conn, &order.staff_id).await?;
    if let Some(customer_id) = &order.customer_id {
        require_customer(&mut *conn, customer_id).await?;
    }

    let order_id = insert_order(
        conn,
        &NewOrderHeader {
            branch_id: &order.branch_id,
            staff_id: &order.staff_id,
            customer_id: order.customer_id.as_deref(),
            payment_method: order.payment_method,
        },
    )
    .await?;

    let mut running_total = Money::zero();
    for (position, line) in order.lines.iter().enumerate() {
        let position = position as i64;
        let subtotal = match line {
            LineRequest::Catalog {
                catalog_item_id,
                quantity,
            } => {
                let (_, price) = price_catalog_line(conn, catalog_item_id, *quantity).await?;
                warn_if_short_finished_good(conn, &order.branch_id, catalog_item_id, *quantity)
                    .await?;
                insert_catalog_line(conn, &order_id, position, catalog_item_id, *quantity, price)
                    .await?;
                price.subtotal
            }
            LineRequest::Customized(customization) => {
                compose_customized_line(conn, &order_id, &order.branch_id, position, customization)
                    .await?
            }
        };
        // SUM() in reconcile must not overflow.
        running_total = running_total.checked_add(subtotal)?;
    }

    let total = reconcile(conn, &order_id).await?;
    debug!(
        order_id = %order_id,
        lines = order.lines.len(),
        total = %total,
        "Order composed"
    );

    Ok(order_id)
}

async fn compose_customized_line(
    conn: &mut SqliteConnection,
    order_id: &str,
    branch_id: &str,
    position: i64,
    customization: &CustomizationRequest,
) -> DbResult<Money> {
    let margin = customization.margin_or_default();

    let mut priced = Vec::with_capacity(customization.components.len());
    for component in &customization.components {
        let (material, price) = price_customized_component(
            conn,
            &component.raw_material_id,
            component.quantity,
            Some(margin),
        )
        .await?;
        warn_if_short_raw_material(conn, branch_id, &component.raw_material_id, component.quantity)
            .await?;
        priced.push((material, price));
    }

    let customized_item_id =
        insert_customized_item(conn, order_id, customization.name.as_deref(), margin).await?;

    for (index, (material, price)) in priced.iter().enumerate() {
        insert_component(conn, &customized_item_id, index as i64, material, price).await?;
    }

    let prices: Vec<_> = priced.into_iter().map(|(_, price)| price).collect();
    let line_price = LinePrice::customized(price_customized_item(&prices)?);
    insert_customized_line(conn, order_id, position, &customized_item_id, line_price).await?;

    Ok(line_price.subtotal)
}

async fn warn_if_short_finished_good(
    conn: &mut SqliteConnection,
    branch_id: &str,
    catalog_item_id: &str,
    units: i64,
) -> DbResult<()> {
    match get_finished_good(&mut *conn, branch_id, catalog_item_id).await? {
        None => warn!(
            branch_id = %branch_id,
            catalog_item_id = %catalog_item_id,
            "Catalog item has no stock record at branch; settlement will fail"
        ),
        Some(record) if record.available < units => warn!(
            branch_id = %branch_id,
            catalog_item_id = %catalog_item_id,
            available = record.available,
            requested = units,
            "Catalog item stock currently short"
        ),
        Some(_) => {}
    }
    Ok(())
}

async fn warn_if_short_raw_material(
    conn: &mut SqliteConnection,
    branch_id: &str,
    raw_material_id: &str,
    quantity: Quantity,
) -> DbResult<()> {
    match get_raw_material(&mut *conn, branch_id, raw_material_id).await? {
        None => warn!(
            branch_id = %branch_id,
            raw_material_id = %raw_material_id,
            "Raw material has no stock record at branch; settlement will fail"
        ),
        Some(record) if record.stock < quantity => warn!(
            branch_id = %branch_id,
            raw_material_id = %raw_material_id,
            available = %record.stock,
            requested = %quantity,
            "Raw material stock currently short"
        ),
        Some(_) => {}
    }
    Ok(())
}
