//! Order Core: placement with stock reservation, farmer status changes and
//! consumer cancellation with restock.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::domain::{
    DeliveryAddress, LineItem, Order, OrderError, OrderEvent, OrderStatus, PaymentMethod, PaymentStatus, Quantity,
};
use crate::identity::Caller;
use crate::publisher::EventPublisher;
use crate::store::MarketStore;
use crate::{MarketError, MarketResult};

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrder {
    #[validate(length(min = 1), custom = "positive_quantities")]
    pub products: Vec<OrderLine>,
    #[validate]
    pub delivery_address: DeliveryAddress,
    pub payment_method: PaymentMethod,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    pub product_id: Uuid,
    pub quantity: Quantity,
}

fn positive_quantities(lines: &[OrderLine]) -> Result<(), ValidationError> {
    if lines.iter().any(|l| l.quantity.is_zero()) {
        return Err(ValidationError::new("quantity_below_one"));
    }
    Ok(())
}

#[derive(Clone)]
pub struct OrderService {
    store: Arc<dyn MarketStore>,
    events: EventPublisher,
}

impl OrderService {
    pub fn new(store: Arc<dyn MarketStore>, events: EventPublisher) -> Self {
        Self { store, events }
    }

    /// Validates every line against the first line's farmer and current stock,
    /// reserves stock line by line, then persists the order. Any failure after a
    /// reservation restores what this call took.
    #[instrument(skip(self, caller, request), fields(consumer = %caller.user_id, lines = request.products.len()))]
    pub async fn place_order(&self, caller: &Caller, request: PlaceOrder) -> MarketResult<Order> {
        request.validate()?;

        let anchor_id = request.products[0].product_id;
        let farmer_id = self
            .store
            .find_product(anchor_id)
            .await?
            .ok_or(MarketError::ProductNotFound(anchor_id))?
            .farmer_id;

        let mut items = Vec::with_capacity(request.products.len());
        let mut names = HashMap::new();
        for line in &request.products {
            let product = self
                .store
                .find_product(line.product_id)
                .await?
                .ok_or(MarketError::ProductNotFound(line.product_id))?;
            if product.farmer_id != farmer_id {
                return Err(MarketError::MultiSellerOrder);
            }
            if !product.has_stock_for(line.quantity) {
                return Err(MarketError::InsufficientStock { product_id: product.id, name: product.name });
            }
            items.push(LineItem::priced(&product, line.quantity));
            names.insert(product.id, product.name);
        }

        let order = Order::place(caller.user_id, farmer_id, items, request.delivery_address, request.payment_method)?;
        self.reserve_all(&order.items, &names).await?;

        if let Err(e) = self.store.insert_order(&order).await {
            tracing::error!(order_id = %order.id, error = %e, "order insert failed, releasing reserved stock");
            self.release(&order.items).await;
            return Err(e.into());
        }

        tracing::info!(order_id = %order.id, farmer = %farmer_id, total = %order.total_amount, "order placed");
        self.events
            .publish(OrderEvent::Placed {
                order_id: order.id,
                consumer_id: order.consumer_id,
                farmer_id,
                total: order.total_amount.amount(),
            })
            .await;
        Ok(order)
    }

    async fn reserve_all(&self, items: &[LineItem], names: &HashMap<Uuid, String>) -> MarketResult<()> {
        for (taken, item) in items.iter().enumerate() {
            let reserved = match self.store.reserve_stock(item.product_id, item.quantity).await {
                Ok(reserved) => reserved,
                Err(e) => {
                    self.release(&items[..taken]).await;
                    return Err(e.into());
                }
            };
            if !reserved {
                tracing::warn!(product_id = %item.product_id, requested = %item.quantity, "stock reservation lost");
                self.release(&items[..taken]).await;
                let name = names.get(&item.product_id).cloned().unwrap_or_else(|| item.product_id.to_string());
                return Err(MarketError::InsufficientStock { product_id: item.product_id, name });
            }
        }
        Ok(())
    }

    async fn release(&self, items: &[LineItem]) {
        for item in items {
            if let Err(e) = self.store.restore_stock(item.product_id, item.quantity).await {
                tracing::error!(product_id = %item.product_id, quantity = %item.quantity, error = %e, "failed to restore stock");
            }
        }
    }

    async fn farmer_order(&self, order_id: Uuid, farmer_id: Uuid) -> MarketResult<Order> {
        match self.store.find_order(order_id).await? {
            Some(order) if order.farmer_id == farmer_id => Ok(order),
            _ => Err(MarketError::NotFoundOrUnauthorized),
        }
    }

    /// Farmer moves an order along pending → confirmed → delivered.
    #[instrument(skip(self, caller), fields(farmer = %caller.user_id))]
    pub async fn update_status(&self, caller: &Caller, order_id: Uuid, status: OrderStatus) -> MarketResult<Order> {
        let order = self.farmer_order(order_id, caller.user_id).await?;
        if status == OrderStatus::Cancelled {
            return Err(MarketError::InvalidTransition("Only the consumer can cancel an order".to_string()));
        }
        order.check_transition(status)?;

        let updated = self
            .store
            .transition_order_status(order_id, order.status, status, Utc::now())
            .await?
            .ok_or_else(|| MarketError::InvalidTransition(format!("Order {} was modified concurrently", order_id)))?;

        tracing::info!(order_id = %order_id, from = %order.status, to = %status, "order status updated");
        self.events
            .publish(OrderEvent::StatusChanged { order_id, from: order.status, to: status })
            .await;
        Ok(updated)
    }

    /// Payment status is a label set by the farmer, independent of order status.
    #[instrument(skip(self, caller), fields(farmer = %caller.user_id))]
    pub async fn update_payment_status(
        &self,
        caller: &Caller,
        order_id: Uuid,
        status: PaymentStatus,
    ) -> MarketResult<Order> {
        self.farmer_order(order_id, caller.user_id).await?;
        let updated = self
            .store
            .set_payment_status(order_id, status, Utc::now())
            .await?
            .ok_or(MarketError::NotFoundOrUnauthorized)?;

        tracing::info!(order_id = %order_id, payment_status = status.as_str(), "payment status updated");
        self.events.publish(OrderEvent::PaymentStatusChanged { order_id, status }).await;
        Ok(updated)
    }

    /// Consumer cancels a pending order; every line's quantity goes back on the shelf.
    #[instrument(skip(self, caller), fields(consumer = %caller.user_id))]
    pub async fn cancel(&self, caller: &Caller, order_id: Uuid) -> MarketResult<Order> {
        let order = match self.store.find_order(order_id).await? {
            Some(order) if order.consumer_id == caller.user_id => order,
            _ => return Err(MarketError::NotFoundOrUnauthorized),
        };
        order.check_cancellable()?;

        let cancelled = self
            .store
            .transition_order_status(order_id, OrderStatus::Pending, OrderStatus::Cancelled, Utc::now())
            .await?
            .ok_or(OrderError::NotCancellable)?;

        // The cancellation is committed; a failed restock is logged, not surfaced.
        self.release(&cancelled.items).await;

        tracing::info!(order_id = %order_id, lines = cancelled.items.len(), "order cancelled and stock restored");
        self.events
            .publish(OrderEvent::Cancelled { order_id, consumer_id: caller.user_id })
            .await;
        Ok(cancelled)
    }
}
