// storefront/src/models/exchange_rate.rs

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Cached rate of `currency` relative to the base currency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct ExchangeRate {
  pub currency: String,
  pub rate: Decimal,
  pub updated_at: DateTime<Utc>,
}

impl ExchangeRate {
  pub fn is_fresh(&self, now: DateTime<Utc>, window: Duration) -> bool {
    now.signed_duration_since(self.updated_at) < window
  }
}
