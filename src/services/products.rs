//! Catalog operations. Mutations go through the farmer ownership guard.

use serde::Serialize;
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;
use validator::Validate;

use super::queries::Projector;
use crate::domain::{NewProduct, Product, ProductEvent, ProductPatch};
use crate::identity::Caller;
use crate::publisher::EventPublisher;
use crate::store::{MarketStore, UserProfile};
use crate::{MarketError, MarketResult};

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductView {
    #[serde(flatten)]
    pub product: Product,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub farmer: Option<UserProfile>,
}

#[derive(Clone)]
pub struct ProductService {
    store: Arc<dyn MarketStore>,
    events: EventPublisher,
}

impl ProductService {
    pub fn new(store: Arc<dyn MarketStore>, events: EventPublisher) -> Self {
        Self { store, events }
    }

    pub async fn list(&self) -> MarketResult<Vec<ProductView>> {
        let products = self.store.list_products().await?;
        let mut projector = Projector::new(self.store.as_ref());
        let mut views = Vec::with_capacity(products.len());
        for product in products {
            let farmer = projector.profile(product.farmer_id).await?;
            views.push(ProductView { product, farmer });
        }
        Ok(views)
    }

    pub async fn get(&self, id: Uuid) -> MarketResult<ProductView> {
        let product = self.store.find_product(id).await?.ok_or(MarketError::ProductNotFound(id))?;
        let farmer = self.store.find_profile(product.farmer_id).await?;
        Ok(ProductView { product, farmer })
    }

    pub async fn list_for_farmer(&self, caller: &Caller) -> MarketResult<Vec<Product>> {
        Ok(self.store.list_products_by_farmer(caller.user_id).await?)
    }

    #[instrument(skip(self, caller, draft), fields(farmer = %caller.user_id))]
    pub async fn create(&self, caller: &Caller, draft: NewProduct) -> MarketResult<Product> {
        draft.validate()?;
        let product = Product::list(caller.user_id, draft);
        self.store.insert_product(&product).await?;
        tracing::info!(product_id = %product.id, name = %product.name, "product listed");
        self.events
            .publish(ProductEvent::Listed { product_id: product.id, farmer_id: product.farmer_id })
            .await;
        Ok(product)
    }

    /// Resolves the product and checks the caller owns it.
    async fn owned(&self, id: Uuid, caller: &Caller) -> MarketResult<Product> {
        let product = self.store.find_product(id).await?.ok_or(MarketError::ProductNotFound(id))?;
        product.ensure_owned_by(caller.user_id)?;
        Ok(product)
    }

    #[instrument(skip(self, caller, patch), fields(farmer = %caller.user_id))]
    pub async fn update(&self, caller: &Caller, id: Uuid, patch: ProductPatch) -> MarketResult<Product> {
        patch.validate()?;
        self.owned(id, caller).await?;
        let product = self.store.update_product(id, &patch).await?.ok_or(MarketError::ProductNotFound(id))?;
        tracing::info!(product_id = %id, "product updated");
        self.events.publish(ProductEvent::Updated { product_id: id }).await;
        Ok(product)
    }

    #[instrument(skip(self, caller), fields(farmer = %caller.user_id))]
    pub async fn delete(&self, caller: &Caller, id: Uuid) -> MarketResult<()> {
        self.owned(id, caller).await?;
        if !self.store.delete_product(id).await? {
            return Err(MarketError::ProductNotFound(id));
        }
        tracing::info!(product_id = %id, "product removed");
        self.events.publish(ProductEvent::Removed { product_id: id }).await;
        Ok(())
    }
}
