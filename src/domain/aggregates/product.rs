//! Product Aggregate

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use uuid::Uuid;
use validator::Validate;
use crate::domain::value_objects::{Money, Quantity};

/// A farmer's listing. `quantity` is the stock on hand shared by every order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,
    pub farmer_id: Uuid,
    pub name: String,
    pub description: String,
    pub price: Money,
    pub quantity: Quantity,
    pub unit: Unit,
    pub category: Category,
    pub images: Vec<String>,
    pub is_available: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Unit {
    #[serde(rename = "g")] Gram,
    #[default]
    #[serde(rename = "kg")] Kilogram,
    #[serde(rename = "dozen")] Dozen,
    #[serde(rename = "litre")] Litre,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category { #[default] Vegetables, Fruits, Grains, Other }

impl Unit {
    pub fn as_str(&self) -> &'static str {
        match self { Self::Gram => "g", Self::Kilogram => "kg", Self::Dozen => "dozen", Self::Litre => "litre" }
    }
}

impl FromStr for Unit {
    type Err = UnknownVariant;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "g" => Ok(Self::Gram), "kg" => Ok(Self::Kilogram), "dozen" => Ok(Self::Dozen), "litre" => Ok(Self::Litre),
            other => Err(UnknownVariant(other.to_string())),
        }
    }
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self { Self::Vegetables => "vegetables", Self::Fruits => "fruits", Self::Grains => "grains", Self::Other => "other" }
    }
}

impl FromStr for Category {
    type Err = UnknownVariant;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "vegetables" => Ok(Self::Vegetables), "fruits" => Ok(Self::Fruits), "grains" => Ok(Self::Grains), "other" => Ok(Self::Other),
            other => Err(UnknownVariant(other.to_string())),
        }
    }
}

/// A stored enum value that no variant matches.
#[derive(Debug, Clone, PartialEq, Eq)] pub struct UnknownVariant(pub String);
impl std::error::Error for UnknownVariant {}
impl fmt::Display for UnknownVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "unknown variant `{}`", self.0) }
}

/// Fields a farmer supplies when listing a product.
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    #[validate(custom = "crate::domain::value_objects::not_blank")]
    pub name: String,
    #[validate(custom = "crate::domain::value_objects::not_blank")]
    pub description: String,
    pub price: Money,
    #[validate(custom = "crate::domain::value_objects::within_stock_limit")]
    pub quantity: Quantity,
    #[serde(default)]
    pub unit: Unit,
    #[serde(default)]
    pub category: Category,
    #[serde(default)]
    pub images: Vec<String>,
}

/// Sparse update. A field is applied when present, whatever its value,
/// so `isAvailable: false` or `quantity: 0` are real changes.
#[derive(Clone, Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ProductPatch {
    #[validate(custom = "crate::domain::value_objects::not_blank")]
    pub name: Option<String>,
    #[validate(custom = "crate::domain::value_objects::not_blank")]
    pub description: Option<String>,
    pub price: Option<Money>,
    #[validate(custom = "crate::domain::value_objects::within_stock_limit")]
    pub quantity: Option<Quantity>,
    pub unit: Option<Unit>,
    pub category: Option<Category>,
    pub images: Option<Vec<String>>,
    pub is_available: Option<bool>,
}

impl Product {
    pub fn list(farmer_id: Uuid, draft: NewProduct) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(), farmer_id, name: draft.name.trim().to_string(), description: draft.description,
            price: draft.price, quantity: draft.quantity, unit: draft.unit, category: draft.category,
            images: draft.images, is_available: true, created_at: now, updated_at: now,
        }
    }

    /// Ownership guard shared by update and delete.
    pub fn ensure_owned_by(&self, farmer_id: Uuid) -> Result<(), ProductError> {
        if self.farmer_id != farmer_id { return Err(ProductError::NotOwner); }
        Ok(())
    }

    pub fn has_stock_for(&self, requested: Quantity) -> bool { self.quantity.covers(requested) }

    pub fn apply(&mut self, patch: &ProductPatch) {
        if let Some(name) = &patch.name { self.name = name.trim().to_string(); }
        if let Some(description) = &patch.description { self.description = description.clone(); }
        if let Some(price) = patch.price { self.price = price; }
        if let Some(quantity) = patch.quantity { self.quantity = quantity; }
        if let Some(unit) = patch.unit { self.unit = unit; }
        if let Some(category) = patch.category { self.category = category; }
        if let Some(images) = &patch.images { self.images = images.clone(); }
        if let Some(is_available) = patch.is_available { self.is_available = is_available; }
        self.touch();
    }

    /// Conditional decrement: takes stock only when enough is on hand.
    pub fn reserve(&mut self, qty: Quantity) -> Result<(), ProductError> {
        self.quantity = self.quantity.subtract(qty).ok_or(ProductError::InsufficientStock)?;
        self.touch();
        Ok(())
    }

    pub fn restock(&mut self, qty: Quantity) {
        self.quantity = self.quantity.add(qty);
        self.touch();
    }

    fn touch(&mut self) { self.updated_at = Utc::now(); }
}

#[derive(Debug, Clone, PartialEq, Eq)] pub enum ProductError { NotOwner, InsufficientStock }
impl std::error::Error for ProductError {}
impl fmt::Display for ProductError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotOwner => write!(f, "Unauthorized: Product does not belong to this farmer"),
            Self::InsufficientStock => write!(f, "Insufficient stock"),
        }
    }
}
