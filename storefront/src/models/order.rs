// storefront/src/models/order.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::str::FromStr;
use uuid::Uuid;

use super::{Customer, OrderItemWithProduct, UnknownLabel};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
  Pending,
  Processing,
  Shipped,
  Delivered,
  Cancelled,
}

impl OrderStatus {
  pub fn as_str(&self) -> &'static str {
    match self {
      OrderStatus::Pending => "pending",
      OrderStatus::Processing => "processing",
      OrderStatus::Shipped => "shipped",
      OrderStatus::Delivered => "delivered",
      OrderStatus::Cancelled => "cancelled",
    }
  }
}

impl FromStr for OrderStatus {
  type Err = UnknownLabel;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "pending" => Ok(OrderStatus::Pending),
      "processing" => Ok(OrderStatus::Processing),
      "shipped" => Ok(OrderStatus::Shipped),
      "delivered" => Ok(OrderStatus::Delivered),
      "cancelled" => Ok(OrderStatus::Cancelled),
      other => Err(UnknownLabel {
        kind: "order status",
        value: other.to_string(),
      }),
    }
  }
}

impl TryFrom<String> for OrderStatus {
  type Error = UnknownLabel;

  fn try_from(value: String) -> Result<Self, Self::Error> {
    value.parse()
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Order {
  pub id: Uuid,
  pub customer_id: Uuid,
  #[sqlx(try_from = "String")]
  pub status: OrderStatus,
  pub placed_at: DateTime<Utc>,
  /// May be absent or zero; see [`effective_total`].
  pub total_amount: Option<Decimal>,
  /// Client-generated token that makes a checkout submission replay-safe.
  pub idempotency_key: Option<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewOrder {
  pub customer_id: Uuid,
  pub status: OrderStatus,
  pub total_amount: Option<Decimal>,
  pub idempotency_key: Option<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderWithItems {
  pub order: Order,
  pub items: Vec<OrderItemWithProduct>,
}

/// One node of the customers → orders → items → product read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerOrders {
  pub customer: Customer,
  pub orders: Vec<OrderWithItems>,
}

/// The stored total when it is present and positive, otherwise the sum of
/// `quantity × product price` over the items. Items whose product is gone
/// contribute nothing.
pub fn effective_total(order: &Order, items: &[OrderItemWithProduct]) -> Decimal {
  match order.total_amount {
    Some(total) if total > Decimal::ZERO => total,
    _ => items.iter().map(OrderItemWithProduct::line_total).sum(),
  }
}
