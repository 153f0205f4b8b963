// storefront/src/models/product.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::str::FromStr;
use uuid::Uuid;

use super::UnknownLabel;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProductStatus {
  InStock,
  NewArrival,
  OutOfStock,
}

impl ProductStatus {
  pub fn as_str(&self) -> &'static str {
    match self {
      ProductStatus::InStock => "in-stock",
      ProductStatus::NewArrival => "new-arrival",
      ProductStatus::OutOfStock => "out-of-stock",
    }
  }
}

impl FromStr for ProductStatus {
  type Err = UnknownLabel;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "in-stock" => Ok(ProductStatus::InStock),
      "new-arrival" => Ok(ProductStatus::NewArrival),
      "out-of-stock" => Ok(ProductStatus::OutOfStock),
      other => Err(UnknownLabel {
        kind: "product status",
        value: other.to_string(),
      }),
    }
  }
}

impl TryFrom<String> for ProductStatus {
  type Error = UnknownLabel;

  fn try_from(value: String) -> Result<Self, Self::Error> {
    value.parse()
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Product {
  pub id: Uuid,
  pub name: String,
  pub description: Option<String>,
  pub category: Option<String>,
  #[sqlx(try_from = "String")]
  pub status: ProductStatus,
  /// Price in the store's base currency.
  pub price: Decimal,
  /// Gallery position; kept compact (1..n) by the admin side.
  #[serde(rename = "order")]
  #[sqlx(rename = "order")]
  pub display_order: i32,
  pub created_at: DateTime<Utc>,
}

impl Product {
  pub fn summary(&self) -> ProductSummary {
    ProductSummary {
      id: self.id,
      name: self.name.clone(),
      price: self.price,
    }
  }
}

/// The slice of a product that order reads join in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductSummary {
  pub id: Uuid,
  pub name: String,
  pub price: Decimal,
}
