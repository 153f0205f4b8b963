// storefront/src/store/memory.rs

//! In-process data store. Used when no database is configured and by the
//! tests, which can make any table fail on demand and count every call.

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::debug;
use uuid::Uuid;

use super::{CatalogStore, CustomerStore, OrderStore, RateStore, StoreError, StoreResult};
use crate::models::{
  Color, Customer, CustomerOrders, CustomerUpsert, ExchangeRate, NewOrder, NewOrderItem, NewProductColor,
  NewProductImage, Order, OrderItem, OrderItemWithProduct, OrderWithItems, Product, ProductColor,
  ProductColorOption, ProductImage, ProductTag, Tag,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
  Customers,
  Orders,
  OrderItems,
  Products,
  ProductImages,
  ProductColors,
  Colors,
  Tags,
  ProductTags,
  ExchangeRates,
}

impl Table {
  pub fn relation(&self) -> &'static str {
    match self {
      Table::Customers => "customers",
      Table::Orders => "orders",
      Table::OrderItems => "order_items",
      Table::Products => "products",
      Table::ProductImages => "product_images",
      Table::ProductColors => "product_colors",
      Table::Colors => "colors",
      Table::Tags => "tags",
      Table::ProductTags => "product_tags",
      Table::ExchangeRates => "exchange_rates",
    }
  }
}

/// What an injected failure looks like to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
  MissingRelation,
  Constraint,
  Unavailable,
}

#[derive(Debug, Default)]
struct Tables {
  products: Vec<Product>,
  colors: Vec<Color>,
  product_colors: Vec<ProductColor>,
  product_images: Vec<ProductImage>,
  tags: Vec<Tag>,
  /// (product_id, tag_id)
  product_tags: Vec<(Uuid, Uuid)>,
  customers: Vec<Customer>,
  orders: Vec<Order>,
  order_items: Vec<OrderItem>,
  rates: HashMap<String, ExchangeRate>,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
  tables: RwLock<Tables>,
  failures: RwLock<HashMap<Table, FailureKind>>,
  calls: AtomicUsize,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }

  /// Every later call touching `table` fails with `kind` until cleared.
  pub fn fail_on(&self, table: Table, kind: FailureKind) {
    self.failures.write().insert(table, kind);
  }

  pub fn clear_failures(&self) {
    self.failures.write().clear();
  }

  /// Number of store calls made so far, failed ones included.
  pub fn call_count(&self) -> usize {
    self.calls.load(Ordering::SeqCst)
  }

  /// Seeds a product row directly.
  pub fn add_product(&self, product: Product) {
    self.tables.write().products.push(product);
  }

  pub fn customer_count(&self) -> usize {
    self.tables.read().customers.len()
  }

  pub fn orders_snapshot(&self) -> Vec<Order> {
    self.tables.read().orders.clone()
  }

  pub fn order_items_snapshot(&self) -> Vec<OrderItem> {
    self.tables.read().order_items.clone()
  }

  fn touch(&self, table: Table) -> StoreResult<()> {
    self.calls.fetch_add(1, Ordering::SeqCst);
    match self.failures.read().get(&table) {
      None => Ok(()),
      Some(FailureKind::MissingRelation) => Err(StoreError::MissingRelation {
        relation: table.relation().to_string(),
      }),
      Some(FailureKind::Constraint) => Err(StoreError::Constraint {
        relation: table.relation().to_string(),
        detail: "injected constraint violation".to_string(),
      }),
      Some(FailureKind::Unavailable) => Err(StoreError::Unavailable(format!(
        "injected outage on {}",
        table.relation()
      ))),
    }
  }
}

fn constraint(table: Table, detail: impl Into<String>) -> StoreError {
  StoreError::Constraint {
    relation: table.relation().to_string(),
    detail: detail.into(),
  }
}

#[async_trait]
impl CatalogStore for MemoryStore {
  async fn list_products(&self) -> StoreResult<Vec<Product>> {
    self.touch(Table::Products)?;
    let mut products = self.tables.read().products.clone();
    products.sort_by_key(|p| p.display_order);
    Ok(products)
  }

  async fn get_product(&self, product_id: Uuid) -> StoreResult<Option<Product>> {
    self.touch(Table::Products)?;
    Ok(self.tables.read().products.iter().find(|p| p.id == product_id).cloned())
  }

  async fn list_colors(&self) -> StoreResult<Vec<Color>> {
    self.touch(Table::Colors)?;
    let mut colors = self.tables.read().colors.clone();
    colors.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(colors)
  }

  async fn list_product_colors(&self, product_id: Uuid) -> StoreResult<Vec<ProductColorOption>> {
    self.touch(Table::ProductColors)?;
    let tables = self.tables.read();
    let options = tables
      .product_colors
      .iter()
      .filter(|pc| pc.product_id == product_id)
      .filter_map(|pc| {
        tables.colors.iter().find(|c| c.id == pc.color_id).map(|color| ProductColorOption {
          product_color_id: pc.id,
          color: color.clone(),
          is_default: pc.is_default,
          is_multi_color: pc.is_multi_color,
        })
      })
      .collect();
    Ok(options)
  }

  async fn list_product_images(&self, product_id: Uuid) -> StoreResult<Vec<ProductImage>> {
    self.touch(Table::ProductImages)?;
    let mut images: Vec<ProductImage> = self
      .tables
      .read()
      .product_images
      .iter()
      .filter(|img| img.product_id == product_id)
      .cloned()
      .collect();
    images.sort_by_key(|img| img.order);
    Ok(images)
  }

  async fn list_product_tags(&self, product_ids: &[Uuid]) -> StoreResult<Vec<ProductTag>> {
    self.touch(Table::ProductTags)?;
    let tables = self.tables.read();
    let mut tags: Vec<ProductTag> = tables
      .product_tags
      .iter()
      .filter(|(product_id, _)| product_ids.contains(product_id))
      .filter_map(|(product_id, tag_id)| {
        tables.tags.iter().find(|t| t.id == *tag_id).map(|tag| ProductTag {
          product_id: *product_id,
          tag: tag.clone(),
        })
      })
      .collect();
    tags.sort_by(|a, b| a.tag.name.cmp(&b.tag.name));
    Ok(tags)
  }

  async fn ensure_tag(&self, name: &str) -> StoreResult<Tag> {
    self.touch(Table::Tags)?;
    let mut tables = self.tables.write();
    if let Some(existing) = tables.tags.iter().find(|t| t.name == name) {
      return Ok(existing.clone());
    }
    let tag = Tag {
      id: Uuid::new_v4(),
      name: name.to_string(),
    };
    tables.tags.push(tag.clone());
    Ok(tag)
  }

  async fn replace_product_tags(&self, product_id: Uuid, tag_ids: &[Uuid]) -> StoreResult<()> {
    self.touch(Table::ProductTags)?;
    let mut tables = self.tables.write();
    if let Some(missing) = tag_ids.iter().find(|id| !tables.tags.iter().any(|t| t.id == **id)) {
      return Err(constraint(Table::ProductTags, format!("tag {missing} does not exist")));
    }
    tables.product_tags.retain(|(p, _)| *p != product_id);
    tables.product_tags.extend(tag_ids.iter().map(|tag_id| (product_id, *tag_id)));
    Ok(())
  }

  async fn insert_color(&self, name: &str, hex_code: &str) -> StoreResult<Color> {
    self.touch(Table::Colors)?;
    let mut tables = self.tables.write();
    if tables.colors.iter().any(|c| c.name == name) {
      return Err(constraint(Table::Colors, format!("color '{name}' already exists")));
    }
    let color = Color {
      id: Uuid::new_v4(),
      name: name.to_string(),
      hex_code: hex_code.to_string(),
    };
    tables.colors.push(color.clone());
    Ok(color)
  }

  async fn replace_product_colors(
    &self,
    product_id: Uuid,
    colors: Vec<NewProductColor>,
  ) -> StoreResult<Vec<ProductColor>> {
    self.touch(Table::ProductColors)?;
    let mut tables = self.tables.write();
    if let Some(missing) = colors.iter().find(|c| !tables.colors.iter().any(|known| known.id == c.color_id)) {
      return Err(constraint(
        Table::ProductColors,
        format!("color {} does not exist", missing.color_id),
      ));
    }

    let old_ids: Vec<Uuid> = tables
      .product_colors
      .iter()
      .filter(|pc| pc.product_id == product_id)
      .map(|pc| pc.id)
      .collect();

    // Null dependent image associations before the rows they point at go away.
    let mut nulled = 0usize;
    for image in tables.product_images.iter_mut() {
      if image.product_color_id.is_some_and(|id| old_ids.contains(&id)) {
        image.product_color_id = None;
        nulled += 1;
      }
    }
    tables.product_colors.retain(|pc| pc.product_id != product_id);

    let inserted: Vec<ProductColor> = colors
      .into_iter()
      .map(|c| ProductColor {
        id: Uuid::new_v4(),
        product_id,
        color_id: c.color_id,
        is_multi_color: c.is_multi_color,
        is_default: c.is_default,
      })
      .collect();
    tables.product_colors.extend(inserted.iter().cloned());
    debug!(%product_id, nulled_images = nulled, colors = inserted.len(), "product colors replaced");
    Ok(inserted)
  }

  async fn replace_product_images(
    &self,
    product_id: Uuid,
    images: Vec<NewProductImage>,
  ) -> StoreResult<Vec<ProductImage>> {
    self.touch(Table::ProductImages)?;
    let mut tables = self.tables.write();
    for image in &images {
      if let Some(pc_id) = image.product_color_id {
        let owned = tables
          .product_colors
          .iter()
          .any(|pc| pc.id == pc_id && pc.product_id == product_id);
        if !owned {
          return Err(constraint(
            Table::ProductImages,
            format!("product color {pc_id} does not belong to product {product_id}"),
          ));
        }
      }
    }

    tables.product_images.retain(|img| img.product_id != product_id);
    let inserted: Vec<ProductImage> = images
      .into_iter()
      .map(|img| ProductImage {
        id: Uuid::new_v4(),
        product_id,
        image_url: img.image_url,
        order: img.order,
        product_color_id: img.product_color_id,
      })
      .collect();
    tables.product_images.extend(inserted.iter().cloned());
    Ok(inserted)
  }

  async fn update_display_orders(&self, orders: &[(Uuid, i32)]) -> StoreResult<()> {
    self.touch(Table::Products)?;
    let mut tables = self.tables.write();
    for (product_id, order) in orders {
      if let Some(product) = tables.products.iter_mut().find(|p| p.id == *product_id) {
        product.display_order = *order;
      }
    }
    Ok(())
  }
}

#[async_trait]
impl CustomerStore for MemoryStore {
  async fn upsert_customer(&self, upsert: CustomerUpsert) -> StoreResult<Customer> {
    self.touch(Table::Customers)?;
    let mut tables = self.tables.write();
    if let Some(existing) = tables.customers.iter_mut().find(|c| c.email == upsert.email) {
      existing.name = upsert.name;
      existing.phone = upsert.phone;
      existing.address = upsert.address;
      return Ok(existing.clone());
    }
    let customer = Customer {
      id: Uuid::new_v4(),
      name: upsert.name,
      email: upsert.email,
      phone: upsert.phone,
      address: upsert.address,
      created_at: Utc::now(),
    };
    tables.customers.push(customer.clone());
    Ok(customer)
  }
}

#[async_trait]
impl OrderStore for MemoryStore {
  async fn insert_order(&self, new_order: NewOrder) -> StoreResult<Order> {
    self.touch(Table::Orders)?;
    let mut tables = self.tables.write();
    if !tables.customers.iter().any(|c| c.id == new_order.customer_id) {
      return Err(constraint(
        Table::Orders,
        format!("customer {} does not exist", new_order.customer_id),
      ));
    }
    if let Some(key) = new_order.idempotency_key {
      if tables.orders.iter().any(|o| o.idempotency_key == Some(key)) {
        return Err(constraint(Table::Orders, format!("idempotency key {key} already used")));
      }
    }
    let order = Order {
      id: Uuid::new_v4(),
      customer_id: new_order.customer_id,
      status: new_order.status,
      placed_at: Utc::now(),
      total_amount: new_order.total_amount,
      idempotency_key: new_order.idempotency_key,
    };
    tables.orders.push(order.clone());
    Ok(order)
  }

  async fn find_order_by_idempotency_key(&self, key: Uuid) -> StoreResult<Option<Order>> {
    self.touch(Table::Orders)?;
    Ok(
      self
        .tables
        .read()
        .orders
        .iter()
        .find(|o| o.idempotency_key == Some(key))
        .cloned(),
    )
  }

  async fn count_order_items(&self, order_id: Uuid) -> StoreResult<i64> {
    self.touch(Table::OrderItems)?;
    let count = self
      .tables
      .read()
      .order_items
      .iter()
      .filter(|item| item.order_id == order_id)
      .count();
    Ok(count as i64)
  }

  async fn insert_order_items(&self, items: Vec<NewOrderItem>) -> StoreResult<Vec<OrderItem>> {
    self.touch(Table::OrderItems)?;
    let mut tables = self.tables.write();
    // Validate the whole batch first so nothing is half-inserted.
    for item in &items {
      if !tables.orders.iter().any(|o| o.id == item.order_id) {
        return Err(constraint(Table::OrderItems, format!("order {} does not exist", item.order_id)));
      }
      if !tables.products.iter().any(|p| p.id == item.product_id) {
        return Err(constraint(
          Table::OrderItems,
          format!("product {} does not exist", item.product_id),
        ));
      }
      if item.quantity < 1 {
        return Err(constraint(Table::OrderItems, "quantity must be positive"));
      }
    }
    let inserted: Vec<OrderItem> = items
      .into_iter()
      .map(|item| OrderItem {
        id: Uuid::new_v4(),
        order_id: item.order_id,
        product_id: item.product_id,
        quantity: item.quantity,
        product_color: item.product_color,
      })
      .collect();
    tables.order_items.extend(inserted.iter().cloned());
    Ok(inserted)
  }

  async fn list_customer_orders(&self) -> StoreResult<Vec<CustomerOrders>> {
    self.touch(Table::Customers)?;
    let tables = self.tables.read();
    let mut customers = tables.customers.clone();
    customers.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(
      customers
        .into_iter()
        .map(|customer| {
          let orders = tables
            .orders
            .iter()
            .filter(|o| o.customer_id == customer.id)
            .map(|o| assemble_order(&tables, o))
            .collect();
          CustomerOrders { customer, orders }
        })
        .collect(),
    )
  }
}

fn assemble_order(tables: &Tables, order: &Order) -> OrderWithItems {
  let items = tables
    .order_items
    .iter()
    .filter(|item| item.order_id == order.id)
    .map(|item| OrderItemWithProduct {
      item: item.clone(),
      product: tables
        .products
        .iter()
        .find(|p| p.id == item.product_id)
        .map(Product::summary),
    })
    .collect();
  OrderWithItems {
    order: order.clone(),
    items,
  }
}

#[async_trait]
impl RateStore for MemoryStore {
  async fn get_rate(&self, currency: &str) -> StoreResult<Option<ExchangeRate>> {
    self.touch(Table::ExchangeRates)?;
    Ok(self.tables.read().rates.get(currency).cloned())
  }

  async fn upsert_rate(&self, rate: ExchangeRate) -> StoreResult<()> {
    self.touch(Table::ExchangeRates)?;
    self.tables.write().rates.insert(rate.currency.clone(), rate);
    Ok(())
  }
}
