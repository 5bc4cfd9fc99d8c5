//! Order routes.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use tracing::info;

use scoop_core::{CreateOrderRequest, NewOrder, Order, OrderPatch, OrderState};

use crate::auth::{Caller, Capability};
use crate::error::ApiResult;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/orders", post(create_order))
        .route("/orders/{id}", get(get_order).patch(patch_order))
        .route("/orders/{id}/confirm", post(confirm_order))
        .route("/branches/{id}/orders", get(list_orders))
}

async fn create_order(
    State(state): State<AppState>,
    caller: Caller,
    body: Result<Json<CreateOrderRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Order>)> {
    let Json(request) = body?;
    caller.require_at(Capability::PlaceOrders, &request.branch_id)?;

    let order = NewOrder::try_from(request)?;
    let created = state.db.orders().create(order).await?;

    info!(order_id = %created.id, caller = %caller.staff_id, "Order placed");
    Ok((StatusCode::CREATED, Json(created)))
}

async fn get_order(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
) -> ApiResult<Json<Order>> {
    caller.require(Capability::ViewOrders)?;
    let branch_id = state.db.orders().branch_of(&id).await?;
    caller.require_branch(&branch_id)?;

    let order = state.db.orders().get(&id).await?;
    Ok(Json(order))
}

async fn patch_order(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
    body: Result<Json<OrderPatch>, JsonRejection>,
) -> ApiResult<Json<Order>> {
    let Json(patch) = body?;
    authorize_order_change(&state, &caller, &id).await?;

    let order = state.db.orders().patch(&id, patch).await?;
    Ok(Json(order))
}

async fn confirm_order(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
) -> ApiResult<Json<Order>> {
    authorize_order_change(&state, &caller, &id).await?;

    let order = state.db.orders().confirm(&id).await?;
    Ok(Json(order))
}

async fn authorize_order_change(state: &AppState, caller: &Caller, id: &str) -> ApiResult<()> {
    caller.require(Capability::PlaceOrders)?;
    let branch_id = state.db.orders().branch_of(id).await?;
    caller.require_branch(&branch_id)
}

#[derive(Debug, Deserialize)]
struct ListParams {
    state: Option<OrderState>,
}

async fn list_orders(
    State(state): State<AppState>,
    caller: Caller,
    Path(branch_id): Path<String>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> ApiResult<Json<Vec<Order>>> {
    let Query(params) = params?;
    caller.require_at(Capability::ViewOrders, &branch_id)?;

    let orders = state.db.orders().list(&branch_id, params.state).await?;
    Ok(Json(orders))
}
