// storefront/src/models/color.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A reusable color, shared by any number of products.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Color {
  pub id: Uuid,
  pub name: String,
  pub hex_code: String,
}

/// Join row between a product and a color.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct ProductColor {
  pub id: Uuid,
  pub product_id: Uuid,
  pub color_id: Uuid,
  pub is_multi_color: bool,
  pub is_default: bool,
}

/// A color as offered on one product's detail view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct ProductColorOption {
  pub product_color_id: Uuid,
  #[sqlx(flatten)]
  pub color: Color,
  pub is_default: bool,
  pub is_multi_color: bool,
}

/// One color of a product's replacement color set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProductColor {
  pub color_id: Uuid,
  pub is_multi_color: bool,
  pub is_default: bool,
}
