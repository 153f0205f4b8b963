// storefront/src/admin/orders.rs

//! Flattens the customers → orders → items → product tree into one row per
//! (customer, order, item) for display and CSV export.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::instrument;
use uuid::Uuid;

use crate::models::{effective_total, CustomerOrders, OrderStatus};
use crate::store::{OrderStore, StoreResult};

pub const CSV_HEADER: &str = "customer_name,customer_email,customer_phone,customer_address,order_id,order_status,order_date,order_total_amount,item_name,item_quantity,item_color,item_price";

/// Shown for items whose product no longer exists.
const UNKNOWN_PRODUCT: &str = "Unknown Product";

/// Order and item fields are `None` on customer-only and order-only rows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderRow {
  pub customer_name: String,
  pub customer_email: String,
  pub customer_phone: Option<String>,
  pub customer_address: Option<String>,
  pub order_id: Option<Uuid>,
  pub order_status: Option<OrderStatus>,
  pub order_date: Option<DateTime<Utc>>,
  pub order_total_amount: Option<Decimal>,
  pub item_name: Option<String>,
  pub item_quantity: Option<i32>,
  pub item_color: Option<String>,
  pub item_price: Option<Decimal>,
}

impl OrderRow {
  fn customer_only(node: &CustomerOrders) -> Self {
    let customer = &node.customer;
    Self {
      customer_name: customer.name.clone(),
      customer_email: customer.email.clone(),
      customer_phone: customer.phone.clone(),
      customer_address: customer.address.clone(),
      order_id: None,
      order_status: None,
      order_date: None,
      order_total_amount: None,
      item_name: None,
      item_quantity: None,
      item_color: None,
      item_price: None,
    }
  }
}

pub fn flatten_orders(tree: &[CustomerOrders]) -> Vec<OrderRow> {
  let mut rows = Vec::new();
  for node in tree {
    if node.orders.is_empty() {
      rows.push(OrderRow::customer_only(node));
      continue;
    }
    for entry in &node.orders {
      let order_row = OrderRow {
        order_id: Some(entry.order.id),
        order_status: Some(entry.order.status),
        order_date: Some(entry.order.placed_at),
        order_total_amount: Some(effective_total(&entry.order, &entry.items)),
        ..OrderRow::customer_only(node)
      };
      if entry.items.is_empty() {
        rows.push(order_row);
        continue;
      }
      for item in &entry.items {
        rows.push(OrderRow {
          item_name: Some(
            item
              .product
              .as_ref()
              .map_or_else(|| UNKNOWN_PRODUCT.to_string(), |p| p.name.clone()),
          ),
          item_quantity: Some(item.item.quantity),
          item_color: Some(item.item.product_color.clone()),
          item_price: Some(item.unit_price()),
          ..order_row.clone()
        });
      }
    }
  }
  rows
}

#[instrument(name = "admin::load_order_rows", skip_all)]
pub async fn load_order_rows(store: &dyn OrderStore) -> StoreResult<Vec<OrderRow>> {
  let tree = store.list_customer_orders().await?;
  let rows = flatten_orders(&tree);
  tracing::debug!(customers = tree.len(), rows = rows.len(), "Order rows assembled.");
  Ok(rows)
}

fn csv_field(value: &str) -> String {
  if value.contains([',', '"', '\n', '\r']) {
    format!("\"{}\"", value.replace('"', "\"\""))
  } else {
    value.to_string()
  }
}

pub fn orders_csv(rows: &[OrderRow]) -> String {
  let mut out = String::from(CSV_HEADER);
  out.push('\n');
  for row in rows {
    let fields = [
      row.customer_name.clone(),
      row.customer_email.clone(),
      row.customer_phone.clone().unwrap_or_default(),
      row.customer_address.clone().unwrap_or_default(),
      row.order_id.map(|id| id.to_string()).unwrap_or_default(),
      row.order_status.map(|s| s.as_str().to_string()).unwrap_or_default(),
      row.order_date.map(|d| d.to_rfc3339()).unwrap_or_default(),
      row.order_total_amount.map(|t| t.to_string()).unwrap_or_default(),
      row.item_name.clone().unwrap_or_default(),
      row.item_quantity.map(|q| q.to_string()).unwrap_or_default(),
      row.item_color.clone().unwrap_or_default(),
      row.item_price.map(|p| p.to_string()).unwrap_or_default(),
    ];
    let line: Vec<String> = fields.iter().map(|f| csv_field(f)).collect();
    out.push_str(&line.join(","));
    out.push('\n');
  }
  out
}
