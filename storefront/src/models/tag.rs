// storefront/src/models/tag.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A free-form label such as "winter" or "hand-knit"; names are unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Tag {
  pub id: Uuid,
  pub name: String,
}

/// A tag attached to a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct ProductTag {
  pub product_id: Uuid,
  #[sqlx(flatten)]
  pub tag: Tag,
}
