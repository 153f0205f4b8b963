// storefront/src/store/postgres.rs

//! Postgres-backed data store. Queries are bound at runtime and rows decode
//! through the models' `FromRow` impls, so the crate builds without a live
//! database.

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::FromRow;
use std::collections::HashMap;
use tracing::{debug, instrument};
use uuid::Uuid;

use super::{CatalogStore, CustomerStore, OrderStore, RateStore, StoreError, StoreResult};
use crate::models::{
  Color, Customer, CustomerOrders, CustomerUpsert, ExchangeRate, NewOrder, NewOrderItem, NewProductColor,
  NewProductImage, Order, OrderItem, OrderItemWithProduct, OrderWithItems, Product, ProductColor,
  ProductColorOption, ProductImage, ProductSummary, ProductTag, Tag,
};

const UNDEFINED_TABLE: &str = "42P01";
const CONSTRAINT_CODES: [&str; 4] = ["23505", "23503", "23502", "23514"];

#[derive(Clone)]
pub struct PgStore {
  pool: PgPool,
}

impl PgStore {
  pub fn new(pool: PgPool) -> Self {
    Self { pool }
  }

  pub async fn connect(database_url: &str) -> StoreResult<Self> {
    let pool = PgPoolOptions::new()
      .max_connections(5)
      .connect(database_url)
      .await
      .map_err(|e| map_sqlx("connection", e))?;
    Ok(Self::new(pool))
  }
}

/// Sorts a driver error into the store's error kinds.
fn map_sqlx(relation: &str, err: sqlx::Error) -> StoreError {
  match err {
    sqlx::Error::Database(db_err) => {
      let code = db_err.code().map(|c| c.into_owned()).unwrap_or_default();
      if code == UNDEFINED_TABLE {
        StoreError::MissingRelation {
          relation: relation.to_string(),
        }
      } else if CONSTRAINT_CODES.contains(&code.as_str()) {
        StoreError::Constraint {
          relation: relation.to_string(),
          detail: db_err.message().to_string(),
        }
      } else {
        StoreError::Backend(format!("{relation}: [{code}] {}", db_err.message()))
      }
    }
    sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) | sqlx::Error::Tls(_) => {
      StoreError::Unavailable(err.to_string())
    }
    sqlx::Error::ColumnDecode { .. } | sqlx::Error::ColumnNotFound(_) | sqlx::Error::Decode(_) => {
      StoreError::Backend(format!("decoding {relation} row: {err}"))
    }
    other => StoreError::Backend(format!("{relation}: {other}")),
  }
}

/// Item row left-joined with its product (`p_name`, `p_price` are null once
/// the product is gone).
#[derive(FromRow)]
struct ItemWithProductRow {
  #[sqlx(flatten)]
  item: OrderItem,
  p_name: Option<String>,
  p_price: Option<Decimal>,
}

impl From<ItemWithProductRow> for OrderItemWithProduct {
  fn from(row: ItemWithProductRow) -> Self {
    let product = match (row.p_name, row.p_price) {
      (Some(name), Some(price)) => Some(ProductSummary {
        id: row.item.product_id,
        name,
        price,
      }),
      _ => None,
    };
    OrderItemWithProduct { item: row.item, product }
  }
}

const ORDER_ITEM_COLUMNS: &str = "id, order_id, product_id, quantity, COALESCE(product_color, '') AS product_color";

const ITEMS_WITH_PRODUCT: &str = r#"
  SELECT oi.id, oi.order_id, oi.product_id, oi.quantity,
         COALESCE(oi.product_color, '') AS product_color,
         p.name AS p_name, p.price AS p_price
  FROM order_items oi
  LEFT JOIN products p ON p.id = oi.product_id
"#;

#[async_trait]
impl CatalogStore for PgStore {
  #[instrument(name = "PgStore::list_products", skip_all)]
  async fn list_products(&self) -> StoreResult<Vec<Product>> {
    sqlx::query_as::<_, Product>(r#"SELECT * FROM products ORDER BY "order" ASC"#)
      .fetch_all(&self.pool)
      .await
      .map_err(|e| map_sqlx("products", e))
  }

  async fn get_product(&self, product_id: Uuid) -> StoreResult<Option<Product>> {
    sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = $1")
      .bind(product_id)
      .fetch_optional(&self.pool)
      .await
      .map_err(|e| map_sqlx("products", e))
  }

  async fn list_colors(&self) -> StoreResult<Vec<Color>> {
    sqlx::query_as::<_, Color>("SELECT id, name, hex_code FROM colors ORDER BY name ASC")
      .fetch_all(&self.pool)
      .await
      .map_err(|e| map_sqlx("colors", e))
  }

  async fn list_product_colors(&self, product_id: Uuid) -> StoreResult<Vec<ProductColorOption>> {
    sqlx::query_as::<_, ProductColorOption>(
      r#"
      SELECT pc.id AS product_color_id, pc.is_default, pc.is_multi_color,
             c.id, c.name, c.hex_code
      FROM product_colors pc
      JOIN colors c ON c.id = pc.color_id
      WHERE pc.product_id = $1
      "#,
    )
    .bind(product_id)
    .fetch_all(&self.pool)
    .await
    .map_err(|e| map_sqlx("product_colors", e))
  }

  async fn list_product_images(&self, product_id: Uuid) -> StoreResult<Vec<ProductImage>> {
    sqlx::query_as::<_, ProductImage>(
      r#"SELECT id, product_id, image_url, "order", product_color_id
         FROM product_images WHERE product_id = $1 ORDER BY "order" ASC"#,
    )
    .bind(product_id)
    .fetch_all(&self.pool)
    .await
    .map_err(|e| map_sqlx("product_images", e))
  }

  async fn list_product_tags(&self, product_ids: &[Uuid]) -> StoreResult<Vec<ProductTag>> {
    sqlx::query_as::<_, ProductTag>(
      r#"
      SELECT pt.product_id, t.id, t.name
      FROM product_tags pt
      JOIN tags t ON t.id = pt.tag_id
      WHERE pt.product_id = ANY($1)
      ORDER BY t.name ASC
      "#,
    )
    .bind(product_ids.to_vec())
    .fetch_all(&self.pool)
    .await
    .map_err(|e| map_sqlx("product_tags", e))
  }

  async fn insert_color(&self, name: &str, hex_code: &str) -> StoreResult<Color> {
    sqlx::query_as::<_, Color>("INSERT INTO colors (name, hex_code) VALUES ($1, $2) RETURNING id, name, hex_code")
      .bind(name)
      .bind(hex_code)
      .fetch_one(&self.pool)
      .await
      .map_err(|e| map_sqlx("colors", e))
  }

  async fn ensure_tag(&self, name: &str) -> StoreResult<Tag> {
    sqlx::query_as::<_, Tag>(
      r#"
      INSERT INTO tags (name) VALUES ($1)
      ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
      RETURNING id, name
      "#,
    )
    .bind(name)
    .fetch_one(&self.pool)
    .await
    .map_err(|e| map_sqlx("tags", e))
  }

  #[instrument(name = "PgStore::replace_product_colors", skip(self, colors), fields(count = colors.len()))]
  async fn replace_product_colors(
    &self,
    product_id: Uuid,
    colors: Vec<NewProductColor>,
  ) -> StoreResult<Vec<ProductColor>> {
    let mut tx = self.pool.begin().await.map_err(|e| map_sqlx("product_colors", e))?;

    let nulled = sqlx::query(
      r#"UPDATE product_images SET product_color_id = NULL
         WHERE product_color_id IN (SELECT id FROM product_colors WHERE product_id = $1)"#,
    )
    .bind(product_id)
    .execute(&mut *tx)
    .await
    .map_err(|e| map_sqlx("product_images", e))?
    .rows_affected();

    sqlx::query("DELETE FROM product_colors WHERE product_id = $1")
      .bind(product_id)
      .execute(&mut *tx)
      .await
      .map_err(|e| map_sqlx("product_colors", e))?;

    let mut inserted = Vec::with_capacity(colors.len());
    for color in colors {
      let row = sqlx::query_as::<_, ProductColor>(
        r#"INSERT INTO product_colors (product_id, color_id, is_multi_color, is_default)
           VALUES ($1, $2, $3, $4)
           RETURNING id, product_id, color_id, is_multi_color, is_default"#,
      )
      .bind(product_id)
      .bind(color.color_id)
      .bind(color.is_multi_color)
      .bind(color.is_default)
      .fetch_one(&mut *tx)
      .await
      .map_err(|e| map_sqlx("product_colors", e))?;
      inserted.push(row);
    }

    tx.commit().await.map_err(|e| map_sqlx("product_colors", e))?;
    debug!(nulled_images = nulled, colors = inserted.len(), "product colors replaced");
    Ok(inserted)
  }

  async fn replace_product_images(
    &self,
    product_id: Uuid,
    images: Vec<NewProductImage>,
  ) -> StoreResult<Vec<ProductImage>> {
    let mut tx = self.pool.begin().await.map_err(|e| map_sqlx("product_images", e))?;

    sqlx::query("DELETE FROM product_images WHERE product_id = $1")
      .bind(product_id)
      .execute(&mut *tx)
      .await
      .map_err(|e| map_sqlx("product_images", e))?;

    let mut inserted = Vec::with_capacity(images.len());
    for image in images {
      let row = sqlx::query_as::<_, ProductImage>(
        r#"INSERT INTO product_images (product_id, image_url, "order", product_color_id)
           VALUES ($1, $2, $3, $4)
           RETURNING id, product_id, image_url, "order", product_color_id"#,
      )
      .bind(product_id)
      .bind(&image.image_url)
      .bind(image.order)
      .bind(image.product_color_id)
      .fetch_one(&mut *tx)
      .await
      .map_err(|e| map_sqlx("product_images", e))?;
      inserted.push(row);
    }

    tx.commit().await.map_err(|e| map_sqlx("product_images", e))?;
    Ok(inserted)
  }

  #[instrument(name = "PgStore::replace_product_tags", skip(self, tag_ids), fields(count = tag_ids.len()))]
  async fn replace_product_tags(&self, product_id: Uuid, tag_ids: &[Uuid]) -> StoreResult<()> {
    let mut tx = self.pool.begin().await.map_err(|e| map_sqlx("product_tags", e))?;

    sqlx::query("DELETE FROM product_tags WHERE product_id = $1")
      .bind(product_id)
      .execute(&mut *tx)
      .await
      .map_err(|e| map_sqlx("product_tags", e))?;

    for tag_id in tag_ids {
      sqlx::query("INSERT INTO product_tags (product_id, tag_id) VALUES ($1, $2)")
        .bind(product_id)
        .bind(*tag_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx("product_tags", e))?;
    }
    tx.commit().await.map_err(|e| map_sqlx("product_tags", e))
  }

  async fn update_display_orders(&self, orders: &[(Uuid, i32)]) -> StoreResult<()> {
    let mut tx = self.pool.begin().await.map_err(|e| map_sqlx("products", e))?;
    for (product_id, order) in orders {
      sqlx::query(r#"UPDATE products SET "order" = $1 WHERE id = $2"#)
        .bind(*order)
        .bind(*product_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx("products", e))?;
    }
    tx.commit().await.map_err(|e| map_sqlx("products", e))
  }
}

#[async_trait]
impl CustomerStore for PgStore {
  #[instrument(name = "PgStore::upsert_customer", skip_all)]
  async fn upsert_customer(&self, customer: CustomerUpsert) -> StoreResult<Customer> {
    sqlx::query_as::<_, Customer>(
      r#"
      INSERT INTO customers (name, email, phone, address)
      VALUES ($1, $2, $3, $4)
      ON CONFLICT (email) DO UPDATE
        SET name = EXCLUDED.name, phone = EXCLUDED.phone, address = EXCLUDED.address
      RETURNING *
      "#,
    )
    .bind(&customer.name)
    .bind(&customer.email)
    .bind(&customer.phone)
    .bind(&customer.address)
    .fetch_one(&self.pool)
    .await
    .map_err(|e| map_sqlx("customers", e))
  }
}

#[async_trait]
impl OrderStore for PgStore {
  #[instrument(name = "PgStore::insert_order", skip_all)]
  async fn insert_order(&self, order: NewOrder) -> StoreResult<Order> {
    sqlx::query_as::<_, Order>(
      r#"
      INSERT INTO orders (customer_id, status, total_amount, idempotency_key)
      VALUES ($1, $2, $3, $4)
      RETURNING *
      "#,
    )
    .bind(order.customer_id)
    .bind(order.status.as_str())
    .bind(order.total_amount)
    .bind(order.idempotency_key)
    .fetch_one(&self.pool)
    .await
    .map_err(|e| map_sqlx("orders", e))
  }

  async fn find_order_by_idempotency_key(&self, key: Uuid) -> StoreResult<Option<Order>> {
    sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE idempotency_key = $1")
      .bind(key)
      .fetch_optional(&self.pool)
      .await
      .map_err(|e| map_sqlx("orders", e))
  }

  async fn count_order_items(&self, order_id: Uuid) -> StoreResult<i64> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM order_items WHERE order_id = $1")
      .bind(order_id)
      .fetch_one(&self.pool)
      .await
      .map_err(|e| map_sqlx("order_items", e))
  }

  #[instrument(name = "PgStore::insert_order_items", skip_all, fields(count = items.len()))]
  async fn insert_order_items(&self, items: Vec<NewOrderItem>) -> StoreResult<Vec<OrderItem>> {
    let mut tx = self.pool.begin().await.map_err(|e| map_sqlx("order_items", e))?;
    let mut inserted = Vec::with_capacity(items.len());
    for item in items {
      let row = sqlx::query_as::<_, OrderItem>(&format!(
        "INSERT INTO order_items (order_id, product_id, quantity, product_color) \
         VALUES ($1, $2, $3, $4) RETURNING {ORDER_ITEM_COLUMNS}"
      ))
      .bind(item.order_id)
      .bind(item.product_id)
      .bind(item.quantity)
      .bind(&item.product_color)
      .fetch_one(&mut *tx)
      .await
      .map_err(|e| map_sqlx("order_items", e))?;
      inserted.push(row);
    }
    tx.commit().await.map_err(|e| map_sqlx("order_items", e))?;
    Ok(inserted)
  }

  #[instrument(name = "PgStore::list_customer_orders", skip_all)]
  async fn list_customer_orders(&self) -> StoreResult<Vec<CustomerOrders>> {
    let customers = sqlx::query_as::<_, Customer>("SELECT * FROM customers ORDER BY created_at DESC")
      .fetch_all(&self.pool)
      .await
      .map_err(|e| map_sqlx("customers", e))?;

    let orders = sqlx::query_as::<_, Order>("SELECT * FROM orders ORDER BY placed_at ASC")
      .fetch_all(&self.pool)
      .await
      .map_err(|e| map_sqlx("orders", e))?;

    let items = sqlx::query_as::<_, ItemWithProductRow>(ITEMS_WITH_PRODUCT)
      .fetch_all(&self.pool)
      .await
      .map_err(|e| map_sqlx("order_items", e))?;

    let mut items_by_order: HashMap<Uuid, Vec<OrderItemWithProduct>> = HashMap::new();
    for row in items {
      let item = OrderItemWithProduct::from(row);
      items_by_order.entry(item.item.order_id).or_default().push(item);
    }
    let mut orders_by_customer: HashMap<Uuid, Vec<OrderWithItems>> = HashMap::new();
    for order in orders {
      let items = items_by_order.remove(&order.id).unwrap_or_default();
      orders_by_customer
        .entry(order.customer_id)
        .or_default()
        .push(OrderWithItems { order, items });
    }

    Ok(
      customers
        .into_iter()
        .map(|customer| {
          let orders = orders_by_customer.remove(&customer.id).unwrap_or_default();
          CustomerOrders { customer, orders }
        })
        .collect(),
    )
  }
}

#[async_trait]
impl RateStore for PgStore {
  async fn get_rate(&self, currency: &str) -> StoreResult<Option<ExchangeRate>> {
    sqlx::query_as::<_, ExchangeRate>("SELECT currency, rate, updated_at FROM exchange_rates WHERE currency = $1")
      .bind(currency)
      .fetch_optional(&self.pool)
      .await
      .map_err(|e| map_sqlx("exchange_rates", e))
  }

  async fn upsert_rate(&self, rate: ExchangeRate) -> StoreResult<()> {
    sqlx::query(
      r#"
      INSERT INTO exchange_rates (currency, rate, updated_at)
      VALUES ($1, $2, $3)
      ON CONFLICT (currency) DO UPDATE SET rate = EXCLUDED.rate, updated_at = EXCLUDED.updated_at
      "#,
    )
    .bind(&rate.currency)
    .bind(rate.rate)
    .bind(rate.updated_at)
    .execute(&self.pool)
    .await
    .map_err(|e| map_sqlx("exchange_rates", e))?;
    Ok(())
  }
}
