//! Pricing against stored reference data.
//!
//! Thin wrappers that resolve an id inside the caller's transaction, then
//! hand the row to the pure pricing engine in `scoop_core::pricing`.

use sqlx::SqliteConnection;

use crate::error::DbResult;
use crate::repository::reference::{require_catalog_item, require_raw_material};
use scoop_core::pricing::{self, ComponentPrice, LinePrice};
use scoop_core::{CatalogItem, Margin, Quantity, RawMaterial};

/// Resolves a catalog item and prices `quantity` of it.
pub async fn price_catalog_line(
    conn: &mut SqliteConnection,
    catalog_item_id: &str,
    quantity: i64,
) -> DbResult<(CatalogItem, LinePrice)> {
    let item = require_catalog_item(&mut *conn, catalog_item_id).await?;
    let price = pricing::price_catalog_line(&item, quantity)?;
    Ok((item, price))
}

/// Resolves a raw material and prices `quantity` of it at `margin`.
pub async fn price_customized_component(
    conn: &mut SqliteConnection,
    raw_material_id: &str,
    quantity: Quantity,
    margin: Option<Margin>,
) -> DbResult<(RawMaterial, ComponentPrice)> {
    let material = require_raw_material(&mut *conn, raw_material_id).await?;
    let price = pricing::price_customized_component(&material, quantity, margin)?;
    Ok((material, price))
}
