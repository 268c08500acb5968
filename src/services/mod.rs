//! Application services over the [`MarketStore`](crate::store::MarketStore).
pub mod orders;
pub mod products;
pub mod queries;

pub use orders::{OrderLine, OrderService, PlaceOrder};
pub use products::{ProductService, ProductView};
pub use queries::{OrderQueries, OrderView, ProductSummary};
