//! agriGo Marketplace
//!
//! Backend connecting farmers (sellers) with consumers (buyers) of farm produce.
//!
//! ## Features
//! - Product catalog with farmer-only listing management
//! - Single-farmer orders with server-side pricing and totals
//! - Atomic stock reservation on order placement, restock on cancellation
//! - Farmer-driven order status and payment status tracking
//! - Party-filtered order reads with counterparty projections

use thiserror::Error;
use uuid::Uuid;
use validator::{ValidationErrors, ValidationErrorsKind};

pub mod api;
pub mod config;
pub mod domain;
pub mod identity;
pub mod publisher;
pub mod services;
pub mod store;

use domain::{OrderError, ProductError};
use store::StoreError;

// =============================================================================
// Error Types
// =============================================================================

#[derive(Error, Debug)]
pub enum MarketError {
    #[error("Product {0} not found")]
    ProductNotFound(Uuid),

    #[error("Order not found")]
    OrderNotFound,

    /// Absent and not-yours are reported identically so order ids cannot be enumerated.
    #[error("Order not found or unauthorized")]
    NotFoundOrUnauthorized,

    #[error("{0}")]
    Unauthorized(String),

    #[error("All products must be from the same farmer")]
    MultiSellerOrder,

    #[error("Insufficient quantity for product {name}")]
    InsufficientStock { product_id: Uuid, name: String },

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    InvalidTransition(String),

    #[error("Storage error: {0}")]
    Internal(String),
}

pub type MarketResult<T> = std::result::Result<T, MarketError>;

impl From<StoreError> for MarketError {
    fn from(e: StoreError) -> Self { Self::Internal(e.to_string()) }
}

impl From<ProductError> for MarketError {
    fn from(e: ProductError) -> Self {
        match e {
            ProductError::NotOwner => Self::Unauthorized(e.to_string()),
            ProductError::InsufficientStock => Self::Validation(e.to_string()),
        }
    }
}

impl From<OrderError> for MarketError {
    fn from(e: OrderError) -> Self {
        match e {
            OrderError::NoItems | OrderError::TotalTooLarge => Self::Validation(e.to_string()),
            OrderError::NotCancellable | OrderError::InvalidTransition { .. } => Self::InvalidTransition(e.to_string()),
        }
    }
}

impl From<ValidationErrors> for MarketError {
    fn from(e: ValidationErrors) -> Self {
        let mut fields = Vec::new();
        collect_invalid_fields(&e, "", &mut fields);
        fields.sort();
        Self::Validation(format!("Missing or invalid fields: {}", fields.join(", ")))
    }
}

fn collect_invalid_fields(errors: &ValidationErrors, prefix: &str, out: &mut Vec<String>) {
    for (field, kind) in errors.errors() {
        let path = if prefix.is_empty() { field.to_string() } else { format!("{prefix}.{field}") };
        match kind {
            ValidationErrorsKind::Field(_) => out.push(path),
            ValidationErrorsKind::Struct(inner) => collect_invalid_fields(inner, &path, out),
            ValidationErrorsKind::List(items) => {
                for (index, inner) in items {
                    collect_invalid_fields(inner, &format!("{path}[{index}]"), out);
                }
            }
        }
    }
}
