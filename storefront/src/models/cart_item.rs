// storefront/src/models/cart_item.rs

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Image snapshot carried by a cart line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartImage {
  pub image_url: String,
  pub order: i32,
}

/// One (product, color) line in the device-local cart.
///
/// Price and images are snapshots taken when the line was added; the cart
/// never re-reads them from the catalog. Every field is required when
/// loading, so older persisted shapes fail to parse and get discarded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLineItem {
  #[serde(rename = "id")]
  pub product_id: Uuid,
  pub title: String,
  pub qty: u32,
  /// Empty string means "no color selected".
  pub color: String,
  pub price: Decimal,
  pub product_images: Vec<CartImage>,
}

impl CartLineItem {
  pub fn matches(&self, product_id: Uuid, color: &str) -> bool {
    self.product_id == product_id && self.color == color
  }

  /// URL of the lowest-ordered image, or `""` without images.
  pub fn primary_image_url(&self) -> &str {
    self
      .product_images
      .iter()
      .min_by_key(|img| img.order)
      .map_or("", |img| img.image_url.as_str())
  }

  pub fn line_total(&self, rate: Decimal) -> Decimal {
    self.price * rate * Decimal::from(self.qty)
  }
}
