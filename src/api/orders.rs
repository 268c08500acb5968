//! Order routes under `/orders`.

use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::ApiResult;
use super::extract::{Farmer, ValidJson, ValidPath};
use super::AppState;
use crate::domain::{Order, OrderStatus, PaymentStatus};
use crate::identity::Caller;
use crate::services::{OrderView, PlaceOrder};

#[derive(Debug, Serialize)]
pub struct OrderReply {
    pub message: &'static str,
    pub order: Order,
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    pub status: OrderStatus,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentUpdate {
    pub payment_status: PaymentStatus,
}

/// POST /orders
pub async fn create(
    State(state): State<AppState>,
    caller: Caller,
    ValidJson(request): ValidJson<PlaceOrder>,
) -> ApiResult<(StatusCode, Json<OrderReply>)> {
    let order = state.orders.place_order(&caller, request).await?;
    Ok((StatusCode::CREATED, Json(OrderReply { message: "Order created successfully", order })))
}

/// GET /orders/consumer
pub async fn list_for_consumer(State(state): State<AppState>, caller: Caller) -> ApiResult<Json<Vec<OrderView>>> {
    Ok(Json(state.queries.for_consumer(&caller).await?))
}

/// GET /orders/farmer
pub async fn list_for_farmer(State(state): State<AppState>, Farmer(caller): Farmer) -> ApiResult<Json<Vec<OrderView>>> {
    Ok(Json(state.queries.for_farmer(&caller).await?))
}

/// GET /orders/:id
pub async fn get(
    State(state): State<AppState>,
    caller: Caller,
    ValidPath(id): ValidPath<Uuid>,
) -> ApiResult<Json<OrderView>> {
    Ok(Json(state.queries.get(&caller, id).await?))
}

/// PUT /orders/:id/status
pub async fn update_status(
    State(state): State<AppState>,
    Farmer(caller): Farmer,
    ValidPath(id): ValidPath<Uuid>,
    ValidJson(body): ValidJson<StatusUpdate>,
) -> ApiResult<Json<OrderReply>> {
    let order = state.orders.update_status(&caller, id, body.status).await?;
    Ok(Json(OrderReply { message: "Order status updated successfully", order }))
}

/// PUT /orders/:id/payment
pub async fn update_payment(
    State(state): State<AppState>,
    Farmer(caller): Farmer,
    ValidPath(id): ValidPath<Uuid>,
    ValidJson(body): ValidJson<PaymentUpdate>,
) -> ApiResult<Json<OrderReply>> {
    let order = state.orders.update_payment_status(&caller, id, body.payment_status).await?;
    Ok(Json(OrderReply { message: "Payment status updated successfully", order }))
}

/// PUT /orders/:id/cancel
pub async fn cancel(
    State(state): State<AppState>,
    caller: Caller,
    ValidPath(id): ValidPath<Uuid>,
) -> ApiResult<Json<OrderReply>> {
    let order = state.orders.cancel(&caller, id).await?;
    Ok(Json(OrderReply { message: "Order cancelled successfully", order }))
}
