// storefront/src/models/mod.rs

//! Data structures for the catalog, customers, orders, the cart and cached rates.
//! Row types derive `sqlx::FromRow` so the Postgres store reads them with `query_as`.

pub mod cart_item;
pub mod color;
pub mod customer;
pub mod exchange_rate;
pub mod image;
pub mod order;
pub mod order_item;
pub mod product;
pub mod tag;

pub use cart_item::{CartImage, CartLineItem};
pub use color::{Color, NewProductColor, ProductColor, ProductColorOption};
pub use customer::{Customer, CustomerUpsert};
pub use exchange_rate::ExchangeRate;
pub use image::{NewProductImage, ProductImage};
pub use order::{effective_total, CustomerOrders, NewOrder, Order, OrderStatus, OrderWithItems};
pub use order_item::{NewOrderItem, OrderItem, OrderItemWithProduct};
pub use product::{Product, ProductStatus, ProductSummary};
pub use tag::{ProductTag, Tag};

/// Raised when a stored enum label is not one we know.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} value '{value}'")]
pub struct UnknownLabel {
  pub kind: &'static str,
  pub value: String,
}
