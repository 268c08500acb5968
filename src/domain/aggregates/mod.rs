//! Aggregates module
pub mod product;
pub mod order;

pub use product::{Category, NewProduct, Product, ProductError, ProductPatch, Unit, UnknownVariant};
pub use order::{LineItem, Order, OrderError, OrderStatus, PaymentMethod, PaymentStatus};
