//! Inventory routes. Every one of them is scoped to a branch.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::Deserialize;

use scoop_core::{
    AssignFinishedGood, AssignRawMaterial, FinishedGoodLevel, FinishedGoodStock,
    FinishedGoodStockView, LowStockAlert, RawMaterialAdjustment, RawMaterialLevel,
    RawMaterialStock, RawMaterialStockView, TransferOutcome, TransferRequest,
};

use crate::auth::{Caller, Capability};
use crate::error::ApiResult;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/inventory/transfers", post(transfer_stock))
        .route(
            "/inventory/branches/{branch}/products",
            post(assign_product).get(list_products),
        )
        .route(
            "/inventory/branches/{branch}/products/{item}",
            put(adjust_product),
        )
        .route(
            "/inventory/branches/{branch}/materials",
            post(assign_material).get(list_materials),
        )
        .route(
            "/inventory/branches/{branch}/materials/{material}",
            put(adjust_material),
        )
        .route("/inventory/branches/{branch}/alerts", get(low_stock_alerts))
}

async fn transfer_stock(
    State(state): State<AppState>,
    caller: Caller,
    body: Result<Json<TransferRequest>, JsonRejection>,
) -> ApiResult<Json<TransferOutcome>> {
    let Json(request) = body?;
    caller.require_at(Capability::MoveStock, &request.origin_branch_id)?;

    let outcome = state.db.inventory().transfer(request).await?;
    Ok(Json(outcome))
}

async fn adjust_product(
    State(state): State<AppState>,
    caller: Caller,
    Path((branch, item)): Path<(String, String)>,
    body: Result<Json<FinishedGoodLevel>, JsonRejection>,
) -> ApiResult<Json<FinishedGoodStock>> {
    let Json(level) = body?;
    caller.require_at(Capability::AdjustStock, &branch)?;

    let record = state.db.inventory().adjust_finished_good(&branch, &item, level).await?;
    Ok(Json(record))
}

async fn adjust_material(
    State(state): State<AppState>,
    caller: Caller,
    Path((branch, material)): Path<(String, String)>,
    body: Result<Json<RawMaterialLevel>, JsonRejection>,
) -> ApiResult<Json<RawMaterialAdjustment>> {
    let Json(level) = body?;
    caller.require_at(Capability::AdjustStock, &branch)?;

    let adjustment = state
        .db
        .inventory()
        .adjust_raw_material(&branch, &material, level)
        .await?;
    Ok(Json(adjustment))
}

async fn assign_product(
    State(state): State<AppState>,
    caller: Caller,
    Path(branch): Path<String>,
    body: Result<Json<AssignFinishedGood>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<FinishedGoodStock>)> {
    let Json(assignment) = body?;
    caller.require_at(Capability::AdjustStock, &branch)?;

    let record = state.db.inventory().assign_finished_good(&branch, assignment).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

async fn assign_material(
    State(state): State<AppState>,
    caller: Caller,
    Path(branch): Path<String>,
    body: Result<Json<AssignRawMaterial>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<RawMaterialStock>)> {
    let Json(assignment) = body?;
    caller.require_at(Capability::AdjustStock, &branch)?;

    let record = state.db.inventory().assign_raw_material(&branch, assignment).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

async fn list_products(
    State(state): State<AppState>,
    caller: Caller,
    Path(branch): Path<String>,
) -> ApiResult<Json<Vec<FinishedGoodStockView>>> {
    caller.require_at(Capability::ViewInventory, &branch)?;
    Ok(Json(state.db.inventory().list_finished_goods(&branch).await?))
}

#[derive(Debug, Deserialize)]
struct MaterialParams {
    #[serde(default)]
    low_stock: bool,
}

async fn list_materials(
    State(state): State<AppState>,
    caller: Caller,
    Path(branch): Path<String>,
    params: Result<Query<MaterialParams>, QueryRejection>,
) -> ApiResult<Json<Vec<RawMaterialStockView>>> {
    let Query(params) = params?;
    caller.require_at(Capability::ViewInventory, &branch)?;

    let materials = state
        .db
        .inventory()
        .list_raw_materials(&branch, params.low_stock)
        .await?;
    Ok(Json(materials))
}

async fn low_stock_alerts(
    State(state): State<AppState>,
    caller: Caller,
    Path(branch): Path<String>,
) -> ApiResult<Json<Vec<LowStockAlert>>> {
    caller.require_at(Capability::ViewInventory, &branch)?;
    Ok(Json(state.db.inventory().low_stock_alerts(&branch).await?))
}
