// storefront/src/models/order_item.rs

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::ProductSummary;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct OrderItem {
  pub id: Uuid,
  pub order_id: Uuid,
  pub product_id: Uuid,
  pub quantity: i32,
  /// Color name as chosen at order time; empty when none was selected.
  /// Kept as text so later color renames leave history untouched.
  pub product_color: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrderItem {
  pub order_id: Uuid,
  pub product_id: Uuid,
  pub quantity: i32,
  pub product_color: String,
}

/// An order item joined with its product, if the product still exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItemWithProduct {
  pub item: OrderItem,
  pub product: Option<ProductSummary>,
}

impl OrderItemWithProduct {
  /// Derived from the current product price; not stored with the item.
  pub fn unit_price(&self) -> Decimal {
    self.product.as_ref().map_or(Decimal::ZERO, |p| p.price)
  }

  pub fn line_total(&self) -> Decimal {
    self.unit_price() * Decimal::from(self.item.quantity.max(0))
  }
}
