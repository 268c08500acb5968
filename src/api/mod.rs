//! HTTP surface.

use axum::{
    routing::{get, post, put},
    Json, Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::identity::IdentityProvider;
use crate::publisher::EventPublisher;
use crate::services::{OrderQueries, OrderService, ProductService};
use crate::store::MarketStore;

pub mod error;
pub mod extract;
pub mod orders;
pub mod products;

pub use error::{ApiError, ApiResult};

#[derive(Clone)]
pub struct AppState {
    pub orders: OrderService,
    pub queries: OrderQueries,
    pub products: ProductService,
    pub identity: Arc<dyn IdentityProvider>,
}

impl AppState {
    pub fn new(store: Arc<dyn MarketStore>, identity: Arc<dyn IdentityProvider>, events: EventPublisher) -> Self {
        Self {
            orders: OrderService::new(store.clone(), events.clone()),
            queries: OrderQueries::new(store.clone()),
            products: ProductService::new(store, events),
            identity,
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(|| async { "Welcome to agriGo." }))
        .route("/health", get(|| async { Json(serde_json::json!({"status": "healthy", "service": "agrigo-marketplace"})) }))
        .route("/orders", post(orders::create))
        .route("/orders/consumer", get(orders::list_for_consumer))
        .route("/orders/farmer", get(orders::list_for_farmer))
        .route("/orders/:id", get(orders::get))
        .route("/orders/:id/status", put(orders::update_status))
        .route("/orders/:id/payment", put(orders::update_payment))
        .route("/orders/:id/cancel", put(orders::cancel))
        .route("/products", get(products::list).post(products::create))
        .route("/products/farmer/products", get(products::list_for_farmer))
        .route("/products/:id", get(products::get).put(products::update).delete(products::delete))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
