//! Order Aggregate

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use uuid::Uuid;
use crate::domain::aggregates::product::{Product, UnknownVariant};
use crate::domain::value_objects::{DeliveryAddress, Money, Quantity};

/// A consumer's order against a single farmer's products.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: Uuid,
    pub consumer_id: Uuid,
    pub farmer_id: Uuid,
    #[serde(rename = "products")]
    pub items: Vec<LineItem>,
    pub total_amount: Money,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub delivery_address: DeliveryAddress,
    pub payment_method: PaymentMethod,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One ordered product. `price` is the unit price captured when the order was placed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem { pub product_id: Uuid, pub quantity: Quantity, pub price: Money }

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus { #[default] Pending, Confirmed, Delivered, Cancelled }

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus { #[default] Pending, Paid, Failed, Refunded }

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Cash,
    Card,
    #[serde(alias = "upi")]
    Transfer,
}

impl LineItem {
    pub fn priced(product: &Product, quantity: Quantity) -> Self {
        Self { product_id: product.id, quantity, price: product.price }
    }
    pub fn total(&self) -> Money { self.price.multiply(self.quantity) }
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self { Self::Pending => "pending", Self::Confirmed => "confirmed", Self::Delivered => "delivered", Self::Cancelled => "cancelled" }
    }

    /// pending → confirmed → delivered, and pending → cancelled.
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Confirmed) | (Self::Confirmed, Self::Delivered) | (Self::Pending, Self::Cancelled)
        )
    }
}

impl FromStr for OrderStatus {
    type Err = UnknownVariant;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending), "confirmed" => Ok(Self::Confirmed),
            "delivered" => Ok(Self::Delivered), "cancelled" => Ok(Self::Cancelled),
            other => Err(UnknownVariant(other.to_string())),
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self { Self::Pending => "pending", Self::Paid => "paid", Self::Failed => "failed", Self::Refunded => "refunded" }
    }
}

impl FromStr for PaymentStatus {
    type Err = UnknownVariant;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending), "paid" => Ok(Self::Paid),
            "failed" => Ok(Self::Failed), "refunded" => Ok(Self::Refunded),
            other => Err(UnknownVariant(other.to_string())),
        }
    }
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self { Self::Cash => "cash", Self::Card => "card", Self::Transfer => "transfer" }
    }
}

impl FromStr for PaymentMethod {
    type Err = UnknownVariant;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cash" => Ok(Self::Cash), "card" => Ok(Self::Card), "transfer" | "upi" => Ok(Self::Transfer),
            other => Err(UnknownVariant(other.to_string())),
        }
    }
}

impl Order {
    /// Builds a pending order; the total is always derived from the line items.
    pub fn place(
        consumer_id: Uuid,
        farmer_id: Uuid,
        items: Vec<LineItem>,
        delivery_address: DeliveryAddress,
        payment_method: PaymentMethod,
    ) -> Result<Self, OrderError> {
        if items.is_empty() { return Err(OrderError::NoItems); }
        let total = items.iter().map(|i| i.total().amount()).sum::<Decimal>();
        let total_amount = Money::new(total).map_err(|_| OrderError::TotalTooLarge)?;
        let now = Utc::now();
        Ok(Self {
            id: Uuid::now_v7(), consumer_id, farmer_id, items, total_amount,
            status: OrderStatus::Pending, payment_status: PaymentStatus::Pending,
            delivery_address, payment_method, created_at: now, updated_at: now,
        })
    }

    pub fn is_party(&self, user_id: Uuid) -> bool { self.consumer_id == user_id || self.farmer_id == user_id }

    pub fn check_transition(&self, next: OrderStatus) -> Result<(), OrderError> {
        if !self.status.can_transition_to(next) {
            return Err(OrderError::InvalidTransition { from: self.status, to: next });
        }
        Ok(())
    }

    pub fn check_cancellable(&self) -> Result<(), OrderError> {
        if self.status != OrderStatus::Pending { return Err(OrderError::NotCancellable); }
        Ok(())
    }

    pub fn set_status(&mut self, status: OrderStatus, at: DateTime<Utc>) { self.status = status; self.updated_at = at; }
    pub fn set_payment_status(&mut self, status: PaymentStatus, at: DateTime<Utc>) { self.payment_status = status; self.updated_at = at; }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderError { NoItems, TotalTooLarge, NotCancellable, InvalidTransition { from: OrderStatus, to: OrderStatus } }
impl std::error::Error for OrderError {}
impl fmt::Display for OrderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoItems => write!(f, "Order must contain at least one product"),
            Self::TotalTooLarge => write!(f, "Order total exceeds {}", Money::max()),
            Self::NotCancellable => write!(f, "Only pending orders can be cancelled"),
            Self::InvalidTransition { from, to } => write!(f, "Cannot change order status from {} to {}", from, to),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn address() -> DeliveryAddress {
        DeliveryAddress { street: "4 Orchard Road".into(), city: "Nashik".into(), pincode: "422001".into() }
    }

    fn item(price: i64, qty: u32) -> LineItem {
        LineItem { product_id: Uuid::now_v7(), quantity: Quantity::new(qty), price: Money::new(Decimal::new(price, 0)).unwrap() }
    }

    #[test]
    fn test_order_total_from_items() {
        let order = Order::place(Uuid::now_v7(), Uuid::now_v7(), vec![item(40, 2), item(15, 3)], address(), PaymentMethod::Cash).unwrap();
        assert_eq!(order.total_amount.amount(), Decimal::new(125, 0));
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.payment_status, PaymentStatus::Pending);
    }

    #[test]
    fn test_order_requires_items() {
        let err = Order::place(Uuid::now_v7(), Uuid::now_v7(), vec![], address(), PaymentMethod::Card).unwrap_err();
        assert_eq!(err, OrderError::NoItems);
    }

    #[test]
    fn test_order_total_must_fit_money_bound() {
        let huge = LineItem { product_id: Uuid::now_v7(), quantity: Quantity::new(2), price: Money::new(Money::max()).unwrap() };
        let err = Order::place(Uuid::now_v7(), Uuid::now_v7(), vec![huge], address(), PaymentMethod::Cash).unwrap_err();
        assert_eq!(err, OrderError::TotalTooLarge);
    }

    #[test]
    fn test_transition_table() {
        use OrderStatus::*;
        assert!(Pending.can_transition_to(Confirmed));
        assert!(Confirmed.can_transition_to(Delivered));
        assert!(Pending.can_transition_to(Cancelled));
        assert!(!Pending.can_transition_to(Delivered));
        assert!(!Confirmed.can_transition_to(Cancelled));
        assert!(!Delivered.can_transition_to(Pending));
        assert!(!Cancelled.can_transition_to(Pending));
        assert!(!Pending.can_transition_to(Pending));
    }

    #[test]
    fn test_only_pending_is_cancellable() {
        let mut order = Order::place(Uuid::now_v7(), Uuid::now_v7(), vec![item(10, 1)], address(), PaymentMethod::Cash).unwrap();
        assert!(order.check_cancellable().is_ok());
        order.set_status(OrderStatus::Confirmed, Utc::now());
        assert_eq!(order.check_cancellable(), Err(OrderError::NotCancellable));
    }

    #[test]
    fn test_payment_method_accepts_upi_alias() {
        let method: PaymentMethod = serde_json::from_str("\"upi\"").unwrap();
        assert_eq!(method, PaymentMethod::Transfer);
        assert_eq!(serde_json::to_string(&method).unwrap(), "\"transfer\"");
    }

    #[test]
    fn test_order_json_shape() {
        let order = Order::place(Uuid::now_v7(), Uuid::now_v7(), vec![item(10, 2)], address(), PaymentMethod::Cash).unwrap();
        let json = serde_json::to_value(&order).unwrap();
        assert_eq!(json["products"][0]["quantity"], 2);
        assert_eq!(json["status"], "pending");
        assert_eq!(json["deliveryAddress"]["pincode"], "422001");
        assert!(json.get("totalAmount").is_some());
    }
}
