// storefront/src/store/mod.rs

//! Seams to the hosted data store. The core only sees these traits; the
//! backing service is either Postgres (`PgStore`) or the in-process
//! `MemoryStore`.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{
  Color, Customer, CustomerOrders, CustomerUpsert, ExchangeRate, NewOrder, NewOrderItem, NewProductColor,
  NewProductImage, Order, OrderItem, Product, ProductColor, ProductColorOption, ProductImage, ProductTag, Tag,
};

pub use memory::{FailureKind, MemoryStore, Table};
pub use postgres::PgStore;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
  /// The relation itself is missing: a deployment problem, not bad input.
  #[error("relation '{relation}' is missing or misconfigured")]
  MissingRelation { relation: String },

  #[error("constraint violated on '{relation}': {detail}")]
  Constraint { relation: String, detail: String },

  #[error("data store unavailable: {0}")]
  Unavailable(String),

  #[error("data store error: {0}")]
  Backend(String),
}

impl StoreError {
  pub fn is_missing_relation(&self) -> bool {
    matches!(self, StoreError::MissingRelation { .. })
  }
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait CatalogStore: Send + Sync {
  /// All products ordered by display order.
  async fn list_products(&self) -> StoreResult<Vec<Product>>;
  async fn get_product(&self, product_id: Uuid) -> StoreResult<Option<Product>>;
  /// All colors ordered by name.
  async fn list_colors(&self) -> StoreResult<Vec<Color>>;
  /// Colors linked to a product, in the store's own order.
  async fn list_product_colors(&self, product_id: Uuid) -> StoreResult<Vec<ProductColorOption>>;
  /// A product's images ordered by `order`.
  async fn list_product_images(&self, product_id: Uuid) -> StoreResult<Vec<ProductImage>>;
  /// Tags on any of `product_ids`, ordered by tag name.
  async fn list_product_tags(&self, product_ids: &[Uuid]) -> StoreResult<Vec<ProductTag>>;

  async fn insert_color(&self, name: &str, hex_code: &str) -> StoreResult<Color>;
  /// The tag called `name`, created if it does not exist yet.
  async fn ensure_tag(&self, name: &str) -> StoreResult<Tag>;
  /// Replaces a product's color set. Images pointing at a removed
  /// ProductColor get their color association nulled first.
  async fn replace_product_colors(
    &self,
    product_id: Uuid,
    colors: Vec<NewProductColor>,
  ) -> StoreResult<Vec<ProductColor>>;
  /// Deletes every image of the product, then inserts `images`.
  async fn replace_product_images(
    &self,
    product_id: Uuid,
    images: Vec<NewProductImage>,
  ) -> StoreResult<Vec<ProductImage>>;
  /// Replaces the product's tag links with `tag_ids`.
  async fn replace_product_tags(&self, product_id: Uuid, tag_ids: &[Uuid]) -> StoreResult<()>;
  async fn update_display_orders(&self, orders: &[(Uuid, i32)]) -> StoreResult<()>;
}

#[async_trait]
pub trait CustomerStore: Send + Sync {
  /// Inserts, or updates name/phone/address of the customer with this email.
  async fn upsert_customer(&self, customer: CustomerUpsert) -> StoreResult<Customer>;
}

#[async_trait]
pub trait OrderStore: Send + Sync {
  async fn insert_order(&self, order: NewOrder) -> StoreResult<Order>;
  async fn find_order_by_idempotency_key(&self, key: Uuid) -> StoreResult<Option<Order>>;
  async fn count_order_items(&self, order_id: Uuid) -> StoreResult<i64>;
  /// Inserts the batch; any failing row fails the whole call.
  async fn insert_order_items(&self, items: Vec<NewOrderItem>) -> StoreResult<Vec<OrderItem>>;
  /// Customers (newest first) with their orders, items and products.
  async fn list_customer_orders(&self) -> StoreResult<Vec<CustomerOrders>>;
}

#[async_trait]
pub trait RateStore: Send + Sync {
  async fn get_rate(&self, currency: &str) -> StoreResult<Option<ExchangeRate>>;
  async fn upsert_rate(&self, rate: ExchangeRate) -> StoreResult<()>;
}

/// Everything the storefront needs from one backing service.
pub trait DataStore: CatalogStore + CustomerStore + OrderStore + RateStore {}

impl<T: CatalogStore + CustomerStore + OrderStore + RateStore> DataStore for T {}

/// The four seams of one backing store, as trait objects.
#[derive(Clone)]
pub struct StoreHandles {
  pub catalog: std::sync::Arc<dyn CatalogStore>,
  pub customers: std::sync::Arc<dyn CustomerStore>,
  pub orders: std::sync::Arc<dyn OrderStore>,
  pub rates: std::sync::Arc<dyn RateStore>,
}

impl StoreHandles {
  pub fn from_store<S: DataStore + 'static>(store: std::sync::Arc<S>) -> Self {
    Self {
      catalog: store.clone(),
      customers: store.clone(),
      orders: store.clone(),
      rates: store,
    }
  }
}
