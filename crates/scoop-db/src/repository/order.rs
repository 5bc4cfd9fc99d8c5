//! # Order Repository
//!
//! Row-level reads and writes for orders, line items, customized items and
//! components.
//!
//! ## Order Aggregate
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  orders (header, total_cents, state)                                   │
//! │    │                                                                    │
//! │    ├── line_items  kind = 'catalog'    ──► catalog_items (name)         │
//! │    │                                                                    │
//! │    └── line_items  kind = 'customized' ──► customized_items             │
//! │                                              └── components (snapshot)  │
//! │                                                                         │
//! │  Everything under an order is written once and deleted only by cascade │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Writes take `&mut SqliteConnection` so they always run on the caller's
//! open transaction. [`load_order`] reads the whole aggregate in three
//! queries: header, lines, components.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqliteConnection};
use std::collections::HashMap;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use scoop_core::pricing::{ComponentPrice, LinePrice};
use scoop_core::{
    Component, CustomizedItem, LineItem, LineItemKind, Margin, MeasureUnit, Order, OrderState,
    PaymentMethod, Quantity, RawMaterial,
};

// =============================================================================
// Rows
// =============================================================================

const ORDER_HEADER_SELECT: &str = r#"
    SELECT
        o.id,
        o.branch_id,
        b.name AS branch_name,
        o.staff_id,
        s.name AS staff_name,
        o.customer_id,
        CASE WHEN c.id IS NULL THEN NULL
             ELSE COALESCE(c.last_name, c.first_name) END AS customer_name,
        o.state,
        o.payment_method,
        o.total_cents,
        o.created_at,
        o.updated_at,
        o.paid_at
    FROM orders o
    JOIN branches b ON b.id = o.branch_id
    JOIN staff s ON s.id = o.staff_id
    LEFT JOIN customers c ON c.id = o.customer_id
"#;

#[derive(Debug, FromRow)]
struct OrderHeaderRow {
    id: String,
    branch_id: String,
    branch_name: String,
    staff_id: String,
    staff_name: String,
    customer_id: Option<String>,
    customer_name: Option<String>,
    state: OrderState,
    payment_method: Option<PaymentMethod>,
    total_cents: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    paid_at: Option<DateTime<Utc>>,
}

impl OrderHeaderRow {
    fn into_order(self, lines: Vec<LineItem>) -> Order {
        Order {
            id: self.id,
            branch_id: self.branch_id,
            branch_name: self.branch_name,
            staff_id: self.staff_id,
            staff_name: self.staff_name,
            customer_id: self.customer_id,
            customer_name: self.customer_name,
            state: self.state,
            payment_method: self.payment_method,
            total_cents: self.total_cents,
            created_at: self.created_at,
            updated_at: self.updated_at,
            paid_at: self.paid_at,
            lines,
        }
    }
}

#[derive(Debug, FromRow)]
struct LineRow {
    id: String,
    position: i64,
    kind: String,
    quantity: i64,
    unit_price_cents: i64,
    subtotal_cents: i64,
    catalog_item_id: Option<String>,
    catalog_name: Option<String>,
    customized_item_id: Option<String>,
    custom_name: Option<String>,
    margin_bps: Option<i64>,
    custom_created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, FromRow)]
struct ComponentRow {
    customized_item_id: String,
    raw_material_id: String,
    name_snapshot: String,
    unit_snapshot: MeasureUnit,
    quantity_hundredths: i64,
    unit_price_cents: i64,
    subtotal_cents: i64,
}

impl From<ComponentRow> for Component {
    fn from(row: ComponentRow) -> Self {
        Component {
            raw_material_id: row.raw_material_id,
            name: row.name_snapshot,
            unit: row.unit_snapshot,
            quantity: Quantity::from_hundredths(row.quantity_hundredths),
            unit_price_cents: row.unit_price_cents,
            subtotal_cents: row.subtotal_cents,
        }
    }
}

impl LineRow {
    fn into_line(self, components: &mut HashMap<String, Vec<Component>>) -> DbResult<LineItem> {
        let item = match self.kind.as_str() {
            "catalog" => LineItemKind::Catalog {
                catalog_item_id: self.catalog_item_id.ok_or_else(|| corrupt(&self.id))?,
                name: self.catalog_name.unwrap_or_default(),
            },
            "customized" => {
                let id = self.customized_item_id.ok_or_else(|| corrupt(&self.id))?;
                let bps = self
                    .margin_bps
                    .and_then(|bps| u32::try_from(bps).ok())
                    .ok_or_else(|| corrupt(&self.id))?;
                let margin = Margin::from_bps(bps).map_err(|_| corrupt(&self.id))?;
                LineItemKind::Customized(CustomizedItem {
                    components: components.remove(&id).unwrap_or_default(),
                    id,
                    name: self.custom_name,
                    margin,
                    created_at: self.custom_created_at.ok_or_else(|| corrupt(&self.id))?,
                })
            }
            other => {
                return Err(DbError::Internal(format!(
                    "line item {} has unknown kind '{}'",
                    self.id, other
                )))
            }
        };

        Ok(LineItem {
            id: self.id,
            position: self.position,
            quantity: self.quantity,
            unit_price_cents: self.unit_price_cents,
            subtotal_cents: self.subtotal_cents,
            item,
        })
    }
}

fn corrupt(line_id: &str) -> DbError {
    DbError::Internal(format!("line item {} is missing its item reference", line_id))
}

// =============================================================================
// Reads
// =============================================================================

/// Loads an order with all its lines, or None when the id is unknown.
pub async fn load_order(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Order>> {
    let query = format!("{} WHERE o.id = ?1", ORDER_HEADER_SELECT);
    let header = sqlx::query_as::<_, OrderHeaderRow>(&query)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

    match header {
        Some(header) => {
            let lines = load_lines(conn, &header.id).await?;
            Ok(Some(header.into_order(lines)))
        }
        None => Ok(None),
    }
}

/// Orders of one branch, newest first, optionally filtered by state.
pub async fn list_for_branch(
    conn: &mut SqliteConnection,
    branch_id: &str,
    state: Option<OrderState>,
) -> DbResult<Vec<Order>> {
    debug!(branch_id = %branch_id, state = ?state, "Listing orders");

    let query = format!(
        "{} WHERE o.branch_id = ?1 AND (?2 IS NULL OR o.state = ?2) \
         ORDER BY o.created_at DESC, o.id DESC",
        ORDER_HEADER_SELECT
    );
    let headers = sqlx::query_as::<_, OrderHeaderRow>(&query)
        .bind(branch_id)
        .bind(state)
        .fetch_all(&mut *conn)
        .await?;

    let mut orders = Vec::with_capacity(headers.len());
    for header in headers {
        let lines = load_lines(conn, &header.id).await?;
        orders.push(header.into_order(lines));
    }
    Ok(orders)
}

async fn load_lines(conn: &mut SqliteConnection, order_id: &str) -> DbResult<Vec<LineItem>> {
    let component_rows = sqlx::query_as::<_, ComponentRow>(
        r#"
        SELECT
            c.customized_item_id,
            c.raw_material_id,
            c.name_snapshot,
            c.unit_snapshot,
            c.quantity_hundredths,
            c.unit_price_cents,
            c.subtotal_cents
        FROM components c
        JOIN customized_items cu ON cu.id = c.customized_item_id
        WHERE cu.order_id = ?1
        ORDER BY c.customized_item_id, c.position
        "#,
    )
    .bind(order_id)
    .fetch_all(&mut *conn)
    .await?;

    let mut components: HashMap<String, Vec<Component>> = HashMap::new();
    for row in component_rows {
        components
            .entry(row.customized_item_id.clone())
            .or_default()
            .push(Component::from(row));
    }

    let line_rows = sqlx::query_as::<_, LineRow>(
        r#"
        SELECT
            li.id,
            li.position,
            li.kind,
            li.quantity,
            li.unit_price_cents,
            li.subtotal_cents,
            li.catalog_item_id,
            ci.name AS catalog_name,
            li.customized_item_id,
            cu.name AS custom_name,
            cu.margin_bps,
            cu.created_at AS custom_created_at
        FROM line_items li
        LEFT JOIN catalog_items ci ON ci.id = li.catalog_item_id
        LEFT JOIN customized_items cu ON cu.id = li.customized_item_id
        WHERE li.order_id = ?1
        ORDER BY li.position
        "#,
    )
    .bind(order_id)
    .fetch_all(&mut *conn)
    .await?;

    line_rows
        .into_iter()
        .map(|row| row.into_line(&mut components))
        .collect()
}

/// Current state of an order, read inside the caller's transaction.
pub async fn order_state(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<OrderState>> {
    let state = sqlx::query_scalar::<_, OrderState>("SELECT state FROM orders WHERE id = ?1")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(state)
}

/// Branch an order belongs to, without loading its lines.
pub async fn order_branch(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<String>> {
    let branch = sqlx::query_scalar::<_, String>("SELECT branch_id FROM orders WHERE id = ?1")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(branch)
}

// =============================================================================
// Writes
// =============================================================================

/// Header of a new order. Always inserted Pending with a zero total.
#[derive(Debug)]
pub struct NewOrderHeader<'a> {
    pub branch_id: &'a str,
    pub staff_id: &'a str,
    pub customer_id: Option<&'a str>,
    pub payment_method: Option<PaymentMethod>,
}

/// Inserts the order header and returns the generated id.
pub async fn insert_order(conn: &mut SqliteConnection, header: &NewOrderHeader<'_>) -> DbResult<String> {
    let id = Uuid::new_v4().to_string();
    let now = Utc::now();

    debug!(id = %id, branch_id = %header.branch_id, "Inserting order header");

    sqlx::query(
        r#"
        INSERT INTO orders (
            id, branch_id, staff_id, customer_id,
            state, payment_method, total_cents,
            created_at, updated_at, paid_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0, ?7, ?7, NULL)
        "#,
    )
    .bind(&id)
    .bind(header.branch_id)
    .bind(header.staff_id)
    .bind(header.customer_id)
    .bind(OrderState::Pending)
    .bind(header.payment_method)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    Ok(id)
}

pub async fn insert_catalog_line(
    conn: &mut SqliteConnection,
    order_id: &str,
    position: i64,
    catalog_item_id: &str,
    quantity: i64,
    price: LinePrice,
) -> DbResult<String> {
    let id = Uuid::new_v4().to_string();

    sqlx::query(
        r#"
        INSERT INTO line_items (
            id, order_id, position, kind, catalog_item_id, customized_item_id,
            quantity, unit_price_cents, subtotal_cents
        ) VALUES (?1, ?2, ?3, 'catalog', ?4, NULL, ?5, ?6, ?7)
        "#,
    )
    .bind(&id)
    .bind(order_id)
    .bind(position)
    .bind(catalog_item_id)
    .bind(quantity)
    .bind(price.unit_price.cents())
    .bind(price.subtotal.cents())
    .execute(&mut *conn)
    .await?;

    Ok(id)
}

/// Inserts a customized item header and returns its id.
pub async fn insert_customized_item(
    conn: &mut SqliteConnection,
    order_id: &str,
    name: Option<&str>,
    margin: Margin,
) -> DbResult<String> {
    let id = Uuid::new_v4().to_string();

    sqlx::query(
        r#"
        INSERT INTO customized_items (id, order_id, name, margin_bps, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5)
        "#,
    )
    .bind(&id)
    .bind(order_id)
    .bind(name)
    .bind(margin.bps() as i64)
    .bind(Utc::now())
    .execute(&mut *conn)
    .await?;

    Ok(id)
}

/// Inserts one priced component, snapshotting the material's name and unit.
pub async fn insert_component(
    conn: &mut SqliteConnection,
    customized_item_id: &str,
    position: i64,
    material: &RawMaterial,
    price: &ComponentPrice,
) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO components (
            customized_item_id, raw_material_id, position,
            name_snapshot, unit_snapshot,
            quantity_hundredths, unit_price_cents, subtotal_cents
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        "#,
    )
    .bind(customized_item_id)
    .bind(&price.raw_material_id)
    .bind(position)
    .bind(&material.name)
    .bind(material.unit)
    .bind(price.quantity.hundredths())
    .bind(price.unit_price.cents())
    .bind(price.subtotal.cents())
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Inserts the line that sells a customized item (quantity 1).
pub async fn insert_customized_line(
    conn: &mut SqliteConnection,
    order_id: &str,
    position: i64,
    customized_item_id: &str,
    price: LinePrice,
) -> DbResult<String> {
    let id = Uuid::new_v4().to_string();

    sqlx::query(
        r#"
        INSERT INTO line_items (
            id, order_id, position, kind, catalog_item_id, customized_item_id,
            quantity, unit_price_cents, subtotal_cents
        ) VALUES (?1, ?2, ?3, 'customized', NULL, ?4, 1, ?5, ?6)
        "#,
    )
    .bind(&id)
    .bind(order_id)
    .bind(position)
    .bind(customized_item_id)
    .bind(price.unit_price.cents())
    .bind(price.subtotal.cents())
    .execute(&mut *conn)
    .await?;

    Ok(id)
}

pub async fn set_payment_method(
    conn: &mut SqliteConnection,
    id: &str,
    method: PaymentMethod,
) -> DbResult<()> {
    sqlx::query("UPDATE orders SET payment_method = ?2, updated_at = ?3 WHERE id = ?1")
        .bind(id)
        .bind(method)
        .bind(Utc::now())
        .execute(&mut *conn)
        .await?;
    Ok(())
}

/// Pending → Paid. Returns false when the order was no longer pending.
pub async fn mark_paid(conn: &mut SqliteConnection, id: &str) -> DbResult<bool> {
    let now = Utc::now();
    let result = sqlx::query(
        r#"
        UPDATE orders SET
            state = 'paid',
            paid_at = ?2,
            updated_at = ?2
        WHERE id = ?1 AND state = 'pending'
        "#,
    )
    .bind(id)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Pending → Cancelled. Returns false when the order was no longer pending.
pub async fn mark_cancelled(conn: &mut SqliteConnection, id: &str) -> DbResult<bool> {
    let result = sqlx::query(
        r#"
        UPDATE orders SET
            state = 'cancelled',
            updated_at = ?2
        WHERE id = ?1 AND state = 'pending'
        "#,
    )
    .bind(id)
    .bind(Utc::now())
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected() == 1)
}
