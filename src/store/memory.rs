//! In-process store used by tests and local runs without Postgres.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{MarketStore, StoreResult, UserProfile};
use crate::domain::{Order, OrderStatus, PaymentStatus, Product, ProductPatch, Quantity};

#[derive(Default)]
struct Tables {
    products: HashMap<Uuid, Product>,
    orders: HashMap<Uuid, Order>,
    profiles: HashMap<Uuid, UserProfile>,
}

/// Every operation takes the table lock once, so reserve and transition are atomic.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self { Self::default() }

    pub async fn insert_profile(&self, profile: UserProfile) {
        self.tables.write().await.profiles.insert(profile.id, profile);
    }
}

fn newest_first<T>(mut rows: Vec<T>, key: impl Fn(&T) -> (DateTime<Utc>, Uuid)) -> Vec<T> {
    rows.sort_by(|a, b| key(b).cmp(&key(a)));
    rows
}

#[async_trait]
impl MarketStore for MemoryStore {
    async fn insert_product(&self, product: &Product) -> StoreResult<()> {
        self.tables.write().await.products.insert(product.id, product.clone());
        Ok(())
    }

    async fn find_product(&self, id: Uuid) -> StoreResult<Option<Product>> {
        Ok(self.tables.read().await.products.get(&id).cloned())
    }

    async fn list_products(&self) -> StoreResult<Vec<Product>> {
        let rows = self.tables.read().await.products.values().cloned().collect();
        Ok(newest_first(rows, |p: &Product| (p.created_at, p.id)))
    }

    async fn list_products_by_farmer(&self, farmer_id: Uuid) -> StoreResult<Vec<Product>> {
        let tables = self.tables.read().await;
        let rows = tables.products.values().filter(|p| p.farmer_id == farmer_id).cloned().collect();
        Ok(newest_first(rows, |p: &Product| (p.created_at, p.id)))
    }

    async fn update_product(&self, id: Uuid, patch: &ProductPatch) -> StoreResult<Option<Product>> {
        let mut tables = self.tables.write().await;
        Ok(tables.products.get_mut(&id).map(|p| {
            p.apply(patch);
            p.clone()
        }))
    }

    async fn delete_product(&self, id: Uuid) -> StoreResult<bool> {
        Ok(self.tables.write().await.products.remove(&id).is_some())
    }

    async fn reserve_stock(&self, product_id: Uuid, qty: Quantity) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        Ok(match tables.products.get_mut(&product_id) {
            Some(product) => product.reserve(qty).is_ok(),
            None => false,
        })
    }

    async fn restore_stock(&self, product_id: Uuid, qty: Quantity) -> StoreResult<()> {
        if let Some(product) = self.tables.write().await.products.get_mut(&product_id) {
            product.restock(qty);
        }
        Ok(())
    }

    async fn insert_order(&self, order: &Order) -> StoreResult<()> {
        self.tables.write().await.orders.insert(order.id, order.clone());
        Ok(())
    }

    async fn find_order(&self, id: Uuid) -> StoreResult<Option<Order>> {
        Ok(self.tables.read().await.orders.get(&id).cloned())
    }

    async fn list_orders_by_consumer(&self, consumer_id: Uuid) -> StoreResult<Vec<Order>> {
        let tables = self.tables.read().await;
        let rows = tables.orders.values().filter(|o| o.consumer_id == consumer_id).cloned().collect();
        Ok(newest_first(rows, |o: &Order| (o.created_at, o.id)))
    }

    async fn list_orders_by_farmer(&self, farmer_id: Uuid) -> StoreResult<Vec<Order>> {
        let tables = self.tables.read().await;
        let rows = tables.orders.values().filter(|o| o.farmer_id == farmer_id).cloned().collect();
        Ok(newest_first(rows, |o: &Order| (o.created_at, o.id)))
    }

    async fn transition_order_status(
        &self,
        id: Uuid,
        from: OrderStatus,
        to: OrderStatus,
        at: DateTime<Utc>,
    ) -> StoreResult<Option<Order>> {
        let mut tables = self.tables.write().await;
        Ok(match tables.orders.get_mut(&id) {
            Some(order) if order.status == from => {
                order.set_status(to, at);
                Some(order.clone())
            }
            _ => None,
        })
    }

    async fn set_payment_status(&self, id: Uuid, status: PaymentStatus, at: DateTime<Utc>) -> StoreResult<Option<Order>> {
        let mut tables = self.tables.write().await;
        Ok(tables.orders.get_mut(&id).map(|order| {
            order.set_payment_status(status, at);
            order.clone()
        }))
    }

    async fn find_profile(&self, id: Uuid) -> StoreResult<Option<UserProfile>> {
        Ok(self.tables.read().await.profiles.get(&id).cloned())
    }
}
