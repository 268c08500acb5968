//! Document store interface shared by the catalog and the order core.
//!
//! Stock is the one resource contended by concurrent requests, so it is only
//! ever changed through [`MarketStore::reserve_stock`] (conditional
//! decrement) and [`MarketStore::restore_stock`] (increment). Order status
//! changes go through [`MarketStore::transition_order_status`], a
//! compare-and-set on the current status.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::{Order, OrderStatus, PaymentStatus, Product, ProductPatch, Quantity};
use crate::identity::Role;

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("corrupt record {id}: {reason}")]
    Corrupt { id: Uuid, reason: String },
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Public profile of a marketplace user, owned by the identity side and only read here.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub farm_name: Option<String>,
}

#[async_trait]
pub trait MarketStore: Send + Sync {
    async fn insert_product(&self, product: &Product) -> StoreResult<()>;
    async fn find_product(&self, id: Uuid) -> StoreResult<Option<Product>>;
    async fn list_products(&self) -> StoreResult<Vec<Product>>;
    async fn list_products_by_farmer(&self, farmer_id: Uuid) -> StoreResult<Vec<Product>>;
    /// Applies the present fields of `patch`; `None` when the product is gone.
    async fn update_product(&self, id: Uuid, patch: &ProductPatch) -> StoreResult<Option<Product>>;
    async fn delete_product(&self, id: Uuid) -> StoreResult<bool>;

    /// Decrements stock by `qty` only if at least `qty` is on hand.
    /// Returns `false` when the product is missing or short.
    async fn reserve_stock(&self, product_id: Uuid, qty: Quantity) -> StoreResult<bool>;
    async fn restore_stock(&self, product_id: Uuid, qty: Quantity) -> StoreResult<()>;

    async fn insert_order(&self, order: &Order) -> StoreResult<()>;
    async fn find_order(&self, id: Uuid) -> StoreResult<Option<Order>>;
    async fn list_orders_by_consumer(&self, consumer_id: Uuid) -> StoreResult<Vec<Order>>;
    async fn list_orders_by_farmer(&self, farmer_id: Uuid) -> StoreResult<Vec<Order>>;
    /// Moves the order from `from` to `to`; `None` if it is no longer in `from`.
    async fn transition_order_status(
        &self,
        id: Uuid,
        from: OrderStatus,
        to: OrderStatus,
        at: DateTime<Utc>,
    ) -> StoreResult<Option<Order>>;
    async fn set_payment_status(&self, id: Uuid, status: PaymentStatus, at: DateTime<Utc>) -> StoreResult<Option<Order>>;

    async fn find_profile(&self, id: Uuid) -> StoreResult<Option<UserProfile>>;
}
