//! Product routes under `/products`.

use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use serde::Serialize;
use uuid::Uuid;

use super::error::ApiResult;
use super::extract::{Farmer, ValidJson, ValidPath};
use super::AppState;
use crate::domain::{NewProduct, Product, ProductPatch};
use crate::services::ProductView;

#[derive(Debug, Serialize)]
pub struct ProductReply {
    pub message: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product: Option<Product>,
}

pub async fn list(State(state): State<AppState>) -> ApiResult<Json<Vec<ProductView>>> {
    Ok(Json(state.products.list().await?))
}

pub async fn get(State(state): State<AppState>, ValidPath(id): ValidPath<Uuid>) -> ApiResult<Json<ProductView>> {
    Ok(Json(state.products.get(id).await?))
}

pub async fn create(
    State(state): State<AppState>,
    Farmer(caller): Farmer,
    ValidJson(draft): ValidJson<NewProduct>,
) -> ApiResult<(StatusCode, Json<ProductReply>)> {
    let product = state.products.create(&caller, draft).await?;
    Ok((StatusCode::CREATED, Json(ProductReply { message: "Product created successfully", product: Some(product) })))
}

pub async fn list_for_farmer(State(state): State<AppState>, Farmer(caller): Farmer) -> ApiResult<Json<Vec<Product>>> {
    Ok(Json(state.products.list_for_farmer(&caller).await?))
}

pub async fn update(
    State(state): State<AppState>,
    Farmer(caller): Farmer,
    ValidPath(id): ValidPath<Uuid>,
    ValidJson(patch): ValidJson<ProductPatch>,
) -> ApiResult<Json<ProductReply>> {
    let product = state.products.update(&caller, id, patch).await?;
    Ok(Json(ProductReply { message: "Product updated successfully", product: Some(product) }))
}

pub async fn delete(
    State(state): State<AppState>,
    Farmer(caller): Farmer,
    ValidPath(id): ValidPath<Uuid>,
) -> ApiResult<Json<ProductReply>> {
    state.products.delete(&caller, id).await?;
    Ok(Json(ProductReply { message: "Product deleted successfully", product: None }))
}
