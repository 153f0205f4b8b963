// storefront/src/models/customer.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Customer {
  pub id: Uuid,
  pub name: String,
  /// Natural key for upserts.
  pub email: String,
  pub phone: Option<String>,
  pub address: Option<String>,
  pub created_at: DateTime<Utc>,
}

/// Insert-or-update payload keyed by `email`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerUpsert {
  pub name: String,
  pub email: String,
  pub phone: Option<String>,
  pub address: Option<String>,
}
