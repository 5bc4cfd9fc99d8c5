//! # Stock Repository
//!
//! Per-branch finished-good and raw-material stock records.
//!
//! ## Conditional Decrement
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  UPDATE finished_goods_stock                                            │
//! │     SET available = available - ?3                                     │
//! │   WHERE branch_id = ?1 AND catalog_item_id = ?2                         │
//! │     AND available >= ?3          ◄── re-checked by the storage engine   │
//! │                                                                         │
//! │  rows_affected = 1  → decremented                                       │
//! │  rows_affected = 0  → record missing or short: caller fails the tx     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Mutations take `&mut SqliteConnection` and assume the caller holds a
//! write transaction from [`begin_write`](crate::pool::begin_write).

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{Executor, FromRow, Sqlite, SqliteConnection};

use crate::error::DbResult;
use scoop_core::{
    FinishedGoodStock, FinishedGoodStockView, LowStockAlert, MeasureUnit, Quantity,
    RawMaterialStock, RawMaterialStockView,
};

// =============================================================================
// Rows
// =============================================================================

#[derive(Debug, FromRow)]
struct FinishedGoodRow {
    branch_id: String,
    catalog_item_id: String,
    available: i64,
    updated_at: DateTime<Utc>,
}

impl From<FinishedGoodRow> for FinishedGoodStock {
    fn from(row: FinishedGoodRow) -> Self {
        FinishedGoodStock {
            branch_id: row.branch_id,
            catalog_item_id: row.catalog_item_id,
            available: row.available,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct RawMaterialRow {
    branch_id: String,
    raw_material_id: String,
    stock_hundredths: i64,
    updated_at: DateTime<Utc>,
}

impl From<RawMaterialRow> for RawMaterialStock {
    fn from(row: RawMaterialRow) -> Self {
        RawMaterialStock {
            branch_id: row.branch_id,
            raw_material_id: row.raw_material_id,
            stock: Quantity::from_hundredths(row.stock_hundredths),
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct FinishedGoodViewRow {
    branch_id: String,
    catalog_item_id: String,
    name: String,
    is_ice_cream: bool,
    available: i64,
}

#[derive(Debug, FromRow)]
struct RawMaterialViewRow {
    branch_id: String,
    raw_material_id: String,
    name: String,
    unit: MeasureUnit,
    base_price_cents: i64,
    stock_hundredths: i64,
    min_stock_hundredths: i64,
    expires_on: Option<NaiveDate>,
}

impl From<RawMaterialViewRow> for RawMaterialStockView {
    fn from(row: RawMaterialViewRow) -> Self {
        let stock = Quantity::from_hundredths(row.stock_hundredths);
        let min_stock = Quantity::from_hundredths(row.min_stock_hundredths);
        RawMaterialStockView {
            branch_id: row.branch_id,
            raw_material_id: row.raw_material_id,
            name: row.name,
            unit: row.unit,
            base_price_cents: row.base_price_cents,
            stock,
            min_stock,
            expires_on: row.expires_on,
            low_stock: stock < min_stock,
        }
    }
}

#[derive(Debug, FromRow)]
struct AlertRow {
    branch_id: String,
    branch_name: String,
    raw_material_id: String,
    name: String,
    unit: MeasureUnit,
    stock_hundredths: i64,
    min_stock_hundredths: i64,
    expires_on: Option<NaiveDate>,
}

impl From<AlertRow> for LowStockAlert {
    fn from(row: AlertRow) -> Self {
        let current = Quantity::from_hundredths(row.stock_hundredths);
        let minimum = Quantity::from_hundredths(row.min_stock_hundredths);
        LowStockAlert {
            branch_id: row.branch_id,
            branch_name: row.branch_name,
            raw_material_id: row.raw_material_id,
            name: row.name,
            unit: row.unit,
            current,
            minimum,
            shortfall: minimum - current,
            expires_on: row.expires_on,
        }
    }
}

// =============================================================================
// Finished goods
// =============================================================================

pub async fn get_finished_good<'e, E>(
    executor: E,
    branch_id: &str,
    catalog_item_id: &str,
) -> DbResult<Option<FinishedGoodStock>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let row = sqlx::query_as::<_, FinishedGoodRow>(
        r#"
        SELECT branch_id, catalog_item_id, available, updated_at
        FROM finished_goods_stock
        WHERE branch_id = ?1 AND catalog_item_id = ?2
        "#,
    )
    .bind(branch_id)
    .bind(catalog_item_id)
    .fetch_optional(executor)
    .await?;
    Ok(row.map(FinishedGoodStock::from))
}

/// Subtracts `units` only if at least that many are available.
pub async fn decrement_finished_good(
    conn: &mut SqliteConnection,
    branch_id: &str,
    catalog_item_id: &str,
    units: i64,
) -> DbResult<bool> {
    let result = sqlx::query(
        r#"
        UPDATE finished_goods_stock
        SET available = available - ?3, updated_at = ?4
        WHERE branch_id = ?1 AND catalog_item_id = ?2 AND available >= ?3
        "#,
    )
    .bind(branch_id)
    .bind(catalog_item_id)
    .bind(units)
    .bind(Utc::now())
    .execute(&mut *conn)
    .await?;
    Ok(result.rows_affected() == 1)
}

/// Adds `units`, creating the record at zero first when it is missing.
pub async fn increment_finished_good(
    conn: &mut SqliteConnection,
    branch_id: &str,
    catalog_item_id: &str,
    units: i64,
) -> DbResult<()> {
    let now = Utc::now();
    sqlx::query(
        r#"
        INSERT INTO finished_goods_stock (branch_id, catalog_item_id, available, updated_at)
        VALUES (?1, ?2, ?3, ?4)
        ON CONFLICT (branch_id, catalog_item_id)
        DO UPDATE SET available = available + excluded.available, updated_at = excluded.updated_at
        "#,
    )
    .bind(branch_id)
    .bind(catalog_item_id)
    .bind(units)
    .bind(now)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

/// Absolute set. Returns false when the record does not exist.
pub async fn set_finished_good(
    conn: &mut SqliteConnection,
    branch_id: &str,
    catalog_item_id: &str,
    available: i64,
) -> DbResult<bool> {
    let result = sqlx::query(
        r#"
        UPDATE finished_goods_stock
        SET available = ?3, updated_at = ?4
        WHERE branch_id = ?1 AND catalog_item_id = ?2
        "#,
    )
    .bind(branch_id)
    .bind(catalog_item_id)
    .bind(available)
    .bind(Utc::now())
    .execute(&mut *conn)
    .await?;
    Ok(result.rows_affected() == 1)
}

/// Creates a record. Returns false when one already exists.
pub async fn insert_finished_good(
    conn: &mut SqliteConnection,
    branch_id: &str,
    catalog_item_id: &str,
    available: i64,
) -> DbResult<bool> {
    let result = sqlx::query(
        r#"
        INSERT INTO finished_goods_stock (branch_id, catalog_item_id, available, updated_at)
        VALUES (?1, ?2, ?3, ?4)
        ON CONFLICT (branch_id, catalog_item_id) DO NOTHING
        "#,
    )
    .bind(branch_id)
    .bind(catalog_item_id)
    .bind(available)
    .bind(Utc::now())
    .execute(&mut *conn)
    .await?;
    Ok(result.rows_affected() == 1)
}

pub async fn list_finished_goods<'e, E>(
    executor: E,
    branch_id: &str,
) -> DbResult<Vec<FinishedGoodStockView>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let rows = sqlx::query_as::<_, FinishedGoodViewRow>(
        r#"
        SELECT s.branch_id, s.catalog_item_id, c.name, c.is_ice_cream, s.available
        FROM finished_goods_stock s
        JOIN catalog_items c ON c.id = s.catalog_item_id
        WHERE s.branch_id = ?1
        ORDER BY c.name
        "#,
    )
    .bind(branch_id)
    .fetch_all(executor)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| FinishedGoodStockView {
            branch_id: row.branch_id,
            catalog_item_id: row.catalog_item_id,
            name: row.name,
            is_ice_cream: row.is_ice_cream,
            available: row.available,
        })
        .collect())
}

// =============================================================================
// Raw materials
// =============================================================================

pub async fn get_raw_material<'e, E>(
    executor: E,
    branch_id: &str,
    raw_material_id: &str,
) -> DbResult<Option<RawMaterialStock>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let row = sqlx::query_as::<_, RawMaterialRow>(
        r#"
        SELECT branch_id, raw_material_id, stock_hundredths, updated_at
        FROM raw_material_stock
        WHERE branch_id = ?1 AND raw_material_id = ?2
        "#,
    )
    .bind(branch_id)
    .bind(raw_material_id)
    .fetch_optional(executor)
    .await?;
    Ok(row.map(RawMaterialStock::from))
}

/// Subtracts `quantity` only if at least that much is in stock.
pub async fn decrement_raw_material(
    conn: &mut SqliteConnection,
    branch_id: &str,
    raw_material_id: &str,
    quantity: Quantity,
) -> DbResult<bool> {
    let result = sqlx::query(
        r#"
        UPDATE raw_material_stock
        SET stock_hundredths = stock_hundredths - ?3, updated_at = ?4
        WHERE branch_id = ?1 AND raw_material_id = ?2 AND stock_hundredths >= ?3
        "#,
    )
    .bind(branch_id)
    .bind(raw_material_id)
    .bind(quantity.hundredths())
    .bind(Utc::now())
    .execute(&mut *conn)
    .await?;
    Ok(result.rows_affected() == 1)
}

/// Absolute set. Returns false when the record does not exist.
pub async fn set_raw_material(
    conn: &mut SqliteConnection,
    branch_id: &str,
    raw_material_id: &str,
    stock: Quantity,
) -> DbResult<bool> {
    let result = sqlx::query(
        r#"
        UPDATE raw_material_stock
        SET stock_hundredths = ?3, updated_at = ?4
        WHERE branch_id = ?1 AND raw_material_id = ?2
        "#,
    )
    .bind(branch_id)
    .bind(raw_material_id)
    .bind(stock.hundredths())
    .bind(Utc::now())
    .execute(&mut *conn)
    .await?;
    Ok(result.rows_affected() == 1)
}

/// Creates a record. Returns false when one already exists.
pub async fn insert_raw_material(
    conn: &mut SqliteConnection,
    branch_id: &str,
    raw_material_id: &str,
    stock: Quantity,
) -> DbResult<bool> {
    let result = sqlx::query(
        r#"
        INSERT INTO raw_material_stock (branch_id, raw_material_id, stock_hundredths, updated_at)
        VALUES (?1, ?2, ?3, ?4)
        ON CONFLICT (branch_id, raw_material_id) DO NOTHING
        "#,
    )
    .bind(branch_id)
    .bind(raw_material_id)
    .bind(stock.hundredths())
    .bind(Utc::now())
    .execute(&mut *conn)
    .await?;
    Ok(result.rows_affected() == 1)
}

/// Raw-material inventory of a branch, optionally only the rows below minimum.
pub async fn list_raw_materials<'e, E>(
    executor: E,
    branch_id: &str,
    low_stock_only: bool,
) -> DbResult<Vec<RawMaterialStockView>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let rows = sqlx::query_as::<_, RawMaterialViewRow>(
        r#"
        SELECT
            s.branch_id,
            s.raw_material_id,
            m.name,
            m.unit,
            m.base_price_cents,
            s.stock_hundredths,
            m.min_stock_hundredths,
            m.expires_on
        FROM raw_material_stock s
        JOIN raw_materials m ON m.id = s.raw_material_id
        WHERE s.branch_id = ?1
          AND (?2 = 0 OR s.stock_hundredths < m.min_stock_hundredths)
        ORDER BY m.name
        "#,
    )
    .bind(branch_id)
    .bind(low_stock_only)
    .fetch_all(executor)
    .await?;

    Ok(rows.into_iter().map(RawMaterialStockView::from).collect())
}

/// Materials below their minimum at a branch, largest shortfall first.
pub async fn low_stock_alerts<'e, E>(executor: E, branch_id: &str) -> DbResult<Vec<LowStockAlert>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let rows = sqlx::query_as::<_, AlertRow>(
        r#"
        SELECT
            s.branch_id,
            b.name AS branch_name,
            s.raw_material_id,
            m.name,
            m.unit,
            s.stock_hundredths,
            m.min_stock_hundredths,
            m.expires_on
        FROM raw_material_stock s
        JOIN raw_materials m ON m.id = s.raw_material_id
        JOIN branches b ON b.id = s.branch_id
        WHERE s.branch_id = ?1
          AND s.stock_hundredths < m.min_stock_hundredths
        ORDER BY (m.min_stock_hundredths - s.stock_hundredths) DESC, m.name
        "#,
    )
    .bind(branch_id)
    .fetch_all(executor)
    .await?;

    Ok(rows.into_iter().map(LowStockAlert::from).collect())
}
