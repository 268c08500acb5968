//! Order Query Surface: party-filtered reads with display projections.

use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::{Money, Order, Product, Unit};
use crate::identity::Caller;
use crate::store::{MarketStore, UserProfile};
use crate::{MarketError, MarketResult};

/// Current catalog data for a product referenced by an order line.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSummary {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub price: Money,
    pub unit: Unit,
}

impl From<&Product> for ProductSummary {
    fn from(p: &Product) -> Self {
        Self { id: p.id, name: p.name.clone(), description: p.description.clone(), price: p.price, unit: p.unit }
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderView {
    #[serde(flatten)]
    pub order: Order,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consumer: Option<UserProfile>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub farmer: Option<UserProfile>,
    /// One entry per line item, in line order; `null` once the product is deleted.
    pub product_details: Vec<Option<ProductSummary>>,
}

#[derive(Clone, Copy)]
struct Sides { consumer: bool, farmer: bool }

/// Per-request lookup cache so repeated parties and products are fetched once.
pub(crate) struct Projector<'a> {
    store: &'a dyn MarketStore,
    profiles: HashMap<Uuid, Option<UserProfile>>,
    products: HashMap<Uuid, Option<ProductSummary>>,
}

impl<'a> Projector<'a> {
    pub(crate) fn new(store: &'a dyn MarketStore) -> Self {
        Self { store, profiles: HashMap::new(), products: HashMap::new() }
    }

    pub(crate) async fn profile(&mut self, id: Uuid) -> MarketResult<Option<UserProfile>> {
        if let Some(cached) = self.profiles.get(&id) {
            return Ok(cached.clone());
        }
        let found = self.store.find_profile(id).await?;
        self.profiles.insert(id, found.clone());
        Ok(found)
    }

    async fn product(&mut self, id: Uuid) -> MarketResult<Option<ProductSummary>> {
        if let Some(cached) = self.products.get(&id) {
            return Ok(cached.clone());
        }
        let found = self.store.find_product(id).await?.as_ref().map(ProductSummary::from);
        self.products.insert(id, found.clone());
        Ok(found)
    }

    async fn order(&mut self, order: Order, sides: Sides) -> MarketResult<OrderView> {
        let consumer = if sides.consumer { self.profile(order.consumer_id).await? } else { None };
        let farmer = if sides.farmer { self.profile(order.farmer_id).await? } else { None };
        let mut product_details = Vec::with_capacity(order.items.len());
        for item in &order.items {
            product_details.push(self.product(item.product_id).await?);
        }
        Ok(OrderView { order, consumer, farmer, product_details })
    }
}

#[derive(Clone)]
pub struct OrderQueries {
    store: Arc<dyn MarketStore>,
}

impl OrderQueries {
    pub fn new(store: Arc<dyn MarketStore>) -> Self { Self { store } }

    /// Orders the caller placed, with the selling farmer projected.
    pub async fn for_consumer(&self, caller: &Caller) -> MarketResult<Vec<OrderView>> {
        let orders = self.store.list_orders_by_consumer(caller.user_id).await?;
        self.project(orders, Sides { consumer: false, farmer: true }).await
    }

    /// Orders placed with the calling farmer, with the buying consumer projected.
    pub async fn for_farmer(&self, caller: &Caller) -> MarketResult<Vec<OrderView>> {
        let orders = self.store.list_orders_by_farmer(caller.user_id).await?;
        self.project(orders, Sides { consumer: true, farmer: false }).await
    }

    /// Looks the order up unfiltered, then only hands it to one of its two parties.
    pub async fn get(&self, caller: &Caller, order_id: Uuid) -> MarketResult<OrderView> {
        let order = self.store.find_order(order_id).await?.ok_or(MarketError::OrderNotFound)?;
        if !order.is_party(caller.user_id) {
            tracing::warn!(order_id = %order_id, user = %caller.user_id, "order read by non-party");
            return Err(MarketError::Unauthorized("Unauthorized access".to_string()));
        }
        Projector::new(self.store.as_ref()).order(order, Sides { consumer: true, farmer: true }).await
    }

    async fn project(&self, orders: Vec<Order>, sides: Sides) -> MarketResult<Vec<OrderView>> {
        let mut projector = Projector::new(self.store.as_ref());
        let mut views = Vec::with_capacity(orders.len());
        for order in orders {
            views.push(projector.order(order, sides).await?);
        }
        Ok(views)
    }
}
