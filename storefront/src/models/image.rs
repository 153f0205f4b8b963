// storefront/src/models/image.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct ProductImage {
  pub id: Uuid,
  pub product_id: Uuid,
  pub image_url: String,
  /// Unique per product.
  pub order: i32,
  /// `None` marks a general image, shown whatever color is selected.
  pub product_color_id: Option<Uuid>,
}

impl ProductImage {
  pub fn is_general(&self) -> bool {
    self.product_color_id.is_none()
  }
}

/// One image of a product's replacement gallery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProductImage {
  pub image_url: String,
  pub order: i32,
  pub product_color_id: Option<Uuid>,
}
