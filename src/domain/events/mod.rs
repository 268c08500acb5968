//! Domain events
use crate::domain::aggregates::{OrderStatus, PaymentStatus};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

#[derive(Clone, Debug, Serialize)]
#[serde(untagged)]
pub enum DomainEvent {
    Product(ProductEvent),
    Order(OrderEvent),
}

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProductEvent {
    Listed { product_id: Uuid, farmer_id: Uuid },
    Updated { product_id: Uuid },
    Removed { product_id: Uuid },
}

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OrderEvent {
    Placed { order_id: Uuid, consumer_id: Uuid, farmer_id: Uuid, total: Decimal },
    StatusChanged { order_id: Uuid, from: OrderStatus, to: OrderStatus },
    PaymentStatusChanged { order_id: Uuid, status: PaymentStatus },
    Cancelled { order_id: Uuid, consumer_id: Uuid },
}

impl DomainEvent {
    /// Subject the event is published on.
    pub fn subject(&self) -> &'static str {
        match self {
            Self::Product(ProductEvent::Listed { .. }) => "agrigo.products.listed",
            Self::Product(ProductEvent::Updated { .. }) => "agrigo.products.updated",
            Self::Product(ProductEvent::Removed { .. }) => "agrigo.products.removed",
            Self::Order(OrderEvent::Placed { .. }) => "agrigo.orders.placed",
            Self::Order(OrderEvent::StatusChanged { .. }) => "agrigo.orders.status_changed",
            Self::Order(OrderEvent::PaymentStatusChanged { .. }) => "agrigo.orders.payment_changed",
            Self::Order(OrderEvent::Cancelled { .. }) => "agrigo.orders.cancelled",
        }
    }
}

impl From<ProductEvent> for DomainEvent {
    fn from(e: ProductEvent) -> Self { Self::Product(e) }
}

impl From<OrderEvent> for DomainEvent {
    fn from(e: OrderEvent) -> Self { Self::Order(e) }
}
