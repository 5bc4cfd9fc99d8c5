//! # Stock Movements
//!
//! Branch transfers, absolute adjustments and assignments. Each function
//! runs on the caller's write transaction.
//!
//! ## Transfer
//! ```text
//! origin "centro" (10) ──── 5 ────► destination "norte" (no record)
//!
//!   1. both branches and the item exist
//!   2. origin record exists with available >= 5
//!   3. touch rows in ascending branch id:  centro -5  then  norte +5 (upsert)
//!
//! result: centro = 5, norte = 5
//! ```

use sqlx::SqliteConnection;
use tracing::info;

use crate::error::{DbError, DbResult};
use crate::repository::reference::{require_branch, require_catalog_item, require_raw_material};
use crate::repository::stock;
use scoop_core::{
    AssignFinishedGood, AssignRawMaterial, CoreError, FinishedGoodLevel, FinishedGoodStock,
    Quantity, RawMaterialAdjustment, RawMaterialLevel, RawMaterialStock, StockPool,
    TransferOutcome, TransferRequest, ValidationError, MAX_STOCK_UNITS,
};

fn record_key(branch_id: &str, item_id: &str) -> String {
    format!("{}/{}", branch_id, item_id)
}

fn missing_finished_good(branch_id: &str, catalog_item_id: &str) -> DbError {
    CoreError::not_found("Finished-good stock", record_key(branch_id, catalog_item_id)).into()
}

fn missing_raw_material(branch_id: &str, raw_material_id: &str) -> DbError {
    CoreError::not_found("Raw-material stock", record_key(branch_id, raw_material_id)).into()
}

async fn read_finished_good(
    conn: &mut SqliteConnection,
    branch_id: &str,
    catalog_item_id: &str,
) -> DbResult<FinishedGoodStock> {
    stock::get_finished_good(&mut *conn, branch_id, catalog_item_id)
        .await?
        .ok_or_else(|| missing_finished_good(branch_id, catalog_item_id))
}

async fn read_raw_material(
    conn: &mut SqliteConnection,
    branch_id: &str,
    raw_material_id: &str,
) -> DbResult<RawMaterialStock> {
    stock::get_raw_material(&mut *conn, branch_id, raw_material_id)
        .await?
        .ok_or_else(|| missing_raw_material(branch_id, raw_material_id))
}

/// Moves finished goods between branches. `request` must already be valid.
///
/// A missing origin record is NotFound, not InsufficientStock: the item was
/// never assigned to that branch. A destination that would pass
/// `MAX_STOCK_UNITS` is a validation error.
pub async fn transfer(
    conn: &mut SqliteConnection,
    request: &TransferRequest,
) -> DbResult<TransferOutcome> {
    let origin_id = request.origin_branch_id.as_str();
    let destination_id = request.destination_branch_id.as_str();
    let item_id = request.catalog_item_id.as_str();

    require_branch(&mut *conn, origin_id).await?;
    require_branch(&mut *conn, destination_id).await?;
    require_catalog_item(&mut *conn, item_id).await?;

    let origin = read_finished_good(conn, origin_id, item_id).await?;
    let insufficient = |available: i64| -> DbError {
        CoreError::InsufficientStock {
            pool: StockPool::FinishedGood,
            branch_id: origin_id.to_string(),
            item_id: item_id.to_string(),
            requested: Quantity::from_units(request.quantity),
            available: Quantity::from_units(available),
        }
        .into()
    };
    if origin.available < request.quantity {
        return Err(insufficient(origin.available));
    }

    let destination_before = stock::get_finished_good(&mut *conn, destination_id, item_id)
        .await?
        .map_or(0, |record| record.available);
    if destination_before > MAX_STOCK_UNITS - request.quantity {
        return Err(CoreError::Validation(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_STOCK_UNITS - destination_before,
        })
        .into());
    }

    if origin_id < destination_id {
        if !stock::decrement_finished_good(conn, origin_id, item_id, request.quantity).await? {
            return Err(insufficient(origin.available));
        }
        stock::increment_finished_good(conn, destination_id, item_id, request.quantity).await?;
    } else {
        stock::increment_finished_good(conn, destination_id, item_id, request.quantity).await?;
        if !stock::decrement_finished_good(conn, origin_id, item_id, request.quantity).await? {
            return Err(insufficient(origin.available));
        }
    }

    let outcome = TransferOutcome {
        origin: read_finished_good(conn, origin_id, item_id).await?,
        destination: read_finished_good(conn, destination_id, item_id).await?,
    };

    info!(
        origin = %origin_id,
        destination = %destination_id,
        catalog_item_id = %item_id,
        quantity = request.quantity,
        reason = request.reason.as_deref().unwrap_or(""),
        "Stock transferred"
    );
    Ok(outcome)
}

/// Sets a finished-good record to an absolute level.
pub async fn adjust_finished_good(
    conn: &mut SqliteConnection,
    branch_id: &str,
    catalog_item_id: &str,
    level: &FinishedGoodLevel,
) -> DbResult<FinishedGoodStock> {
    if !stock::set_finished_good(conn, branch_id, catalog_item_id, level.available).await? {
        return Err(missing_finished_good(branch_id, catalog_item_id));
    }

    info!(
        branch_id = %branch_id,
        catalog_item_id = %catalog_item_id,
        available = level.available,
        reason = level.reason.as_deref().unwrap_or(""),
        "Finished-good stock adjusted"
    );
    read_finished_good(conn, branch_id, catalog_item_id).await
}

/// Sets a raw-material record to an absolute level and reports low stock.
pub async fn adjust_raw_material(
    conn: &mut SqliteConnection,
    branch_id: &str,
    raw_material_id: &str,
    level: &RawMaterialLevel,
) -> DbResult<RawMaterialAdjustment> {
    let material = require_raw_material(&mut *conn, raw_material_id).await?;

    if !stock::set_raw_material(conn, branch_id, raw_material_id, level.stock).await? {
        return Err(missing_raw_material(branch_id, raw_material_id));
    }

    let low_stock = material.is_low(level.stock);
    info!(
        branch_id = %branch_id,
        raw_material_id = %raw_material_id,
        stock = %level.stock,
        low_stock,
        reason = level.reason.as_deref().unwrap_or(""),
        "Raw-material stock adjusted"
    );

    Ok(RawMaterialAdjustment {
        record: read_raw_material(conn, branch_id, raw_material_id).await?,
        low_stock,
    })
}

/// Starts carrying a catalog item at a branch.
pub async fn assign_finished_good(
    conn: &mut SqliteConnection,
    branch_id: &str,
    assignment: &AssignFinishedGood,
) -> DbResult<FinishedGoodStock> {
    let item_id = assignment.catalog_item_id.as_str();
    require_branch(&mut *conn, branch_id).await?;
    require_catalog_item(&mut *conn, item_id).await?;

    if !stock::insert_finished_good(conn, branch_id, item_id, assignment.initial).await? {
        return Err(CoreError::StockRecordExists {
            pool: StockPool::FinishedGood,
            branch_id: branch_id.to_string(),
            item_id: item_id.to_string(),
        }
        .into());
    }

    info!(branch_id = %branch_id, catalog_item_id = %item_id, initial = assignment.initial, "Catalog item assigned");
    read_finished_good(conn, branch_id, item_id).await
}

/// Starts carrying a raw material at a branch.
pub async fn assign_raw_material(
    conn: &mut SqliteConnection,
    branch_id: &str,
    assignment: &AssignRawMaterial,
) -> DbResult<RawMaterialStock> {
    let material_id = assignment.raw_material_id.as_str();
    require_branch(&mut *conn, branch_id).await?;
    require_raw_material(&mut *conn, material_id).await?;

    if !stock::insert_raw_material(conn, branch_id, material_id, assignment.initial).await? {
        return Err(CoreError::StockRecordExists {
            pool: StockPool::RawMaterial,
            branch_id: branch_id.to_string(),
            item_id: material_id.to_string(),
        }
        .into());
    }

    info!(branch_id = %branch_id, raw_material_id = %material_id, initial = %assignment.initial, "Raw material assigned");
    read_raw_material(conn, branch_id, material_id).await
}
