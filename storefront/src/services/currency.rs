// storefront/src/services/currency.rs

//! Exchange rates relative to the store's base currency, cached in the data
//! store with a freshness window. A missing or stale rate never blocks a
//! caller: the fallback chain ends at 1:1.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::config::CurrencySettings;
use crate::errors::AppError;
use crate::models::ExchangeRate;
use crate::storage::{LocalStorage, StorageError, CURRENCY_STORAGE_KEY};
use crate::store::RateStore;

#[derive(Debug, Error)]
pub enum RateFetchError {
  #[error("rate API request failed: {0}")]
  Http(String),

  #[error("rate API reported failure: {0}")]
  Api(String),
}

/// Where fresh rates come from.
#[async_trait]
pub trait RateSource: Send + Sync {
  /// Rates of every currency the source knows, relative to `base`.
  async fn fetch_rates(&self, base: &str) -> Result<HashMap<String, Decimal>, RateFetchError>;
}

/// Public rate API answering `GET {url}/{base}` with `{result, rates}`.
pub struct HttpRateSource {
  client: reqwest::Client,
  api_url: String,
}

impl HttpRateSource {
  pub fn new(api_url: impl Into<String>) -> Self {
    Self {
      client: reqwest::Client::new(),
      api_url: api_url.into(),
    }
  }
}

#[derive(Deserialize)]
struct RateApiResponse {
  result: String,
  #[serde(default)]
  rates: HashMap<String, f64>,
  #[serde(default, rename = "error-type")]
  error_type: Option<String>,
}

#[async_trait]
impl RateSource for HttpRateSource {
  #[instrument(name = "HttpRateSource::fetch_rates", skip(self))]
  async fn fetch_rates(&self, base: &str) -> Result<HashMap<String, Decimal>, RateFetchError> {
    let url = format!("{}/{}", self.api_url.trim_end_matches('/'), base);
    let body: RateApiResponse = self
      .client
      .get(&url)
      .send()
      .await
      .and_then(|r| r.error_for_status())
      .map_err(|e| RateFetchError::Http(e.to_string()))?
      .json()
      .await
      .map_err(|e| RateFetchError::Http(e.to_string()))?;

    if body.result != "success" {
      return Err(RateFetchError::Api(body.error_type.unwrap_or(body.result)));
    }
    Ok(
      body
        .rates
        .into_iter()
        .filter_map(|(code, rate)| Decimal::from_f64(rate).map(|r| (code, r)))
        .collect(),
    )
  }
}

pub struct CurrencyConverter {
  settings: CurrencySettings,
  store: Arc<dyn RateStore>,
  source: Arc<dyn RateSource>,
  /// Last rate seen per currency in this process.
  last_known: RwLock<HashMap<String, Decimal>>,
  /// Set after a failed refresh or a response missing the asked-for code;
  /// `rate_for` skips the source until then.
  retry_at: RwLock<Option<DateTime<Utc>>>,
}

impl CurrencyConverter {
  pub fn new(settings: CurrencySettings, store: Arc<dyn RateStore>, source: Arc<dyn RateSource>) -> Self {
    Self {
      settings,
      store,
      source,
      last_known: RwLock::new(HashMap::new()),
      retry_at: RwLock::new(None),
    }
  }

  pub fn settings(&self) -> &CurrencySettings {
    &self.settings
  }

  fn freshness(&self) -> Duration {
    Duration::hours(self.settings.freshness_hours)
  }

  /// Rate of `code` relative to the base currency. Never fails.
  #[instrument(name = "CurrencyConverter::rate_for", skip(self))]
  pub async fn rate_for(&self, code: &str) -> Decimal {
    if code == self.settings.base {
      return Decimal::ONE;
    }

    let cached = match self.store.get_rate(code).await {
      Ok(cached) => cached,
      Err(e) => {
        warn!(error = %e, "Could not read cached rate.");
        None
      }
    };
    if let Some(rate) = cached.as_ref().filter(|r| r.is_fresh(Utc::now(), self.freshness())) {
      debug!(rate = %rate.rate, "Using fresh cached rate.");
      self.remember(code, rate.rate);
      return rate.rate;
    }

    let retry_at = *self.retry_at.read();
    match retry_at {
      Some(retry_at) if Utc::now() < retry_at => {
        debug!(%retry_at, "Rate API failed recently; not retrying yet.");
      }
      _ => match self.refresh_from_source().await {
        Ok(fetched) => {
          if let Some(rate) = fetched.get(code) {
            return *rate;
          }
          warn!("Rate API has no rate for this currency.");
          self.back_off();
        }
        Err(e) => warn!(error = %e, "Rate refresh failed; falling back."),
      },
    }

    if let Some(stale) = cached {
      info!(rate = %stale.rate, updated_at = %stale.updated_at, "Using stale cached rate.");
      return stale.rate;
    }
    if let Some(rate) = self.last_known.read().get(code) {
      return *rate;
    }
    warn!("No rate known; using 1:1.");
    Decimal::ONE
  }

  fn back_off(&self) {
    let retry_at = Utc::now() + Duration::seconds(self.settings.retry_after_secs);
    *self.retry_at.write() = Some(retry_at);
  }

  /// Fetches every target rate and writes them to the cache, even while a
  /// failed refresh is being backed off. Returns how many were stored.
  pub async fn refresh_all(&self) -> Result<usize, RateFetchError> {
    self.refresh_from_source().await.map(|rates| rates.len())
  }

  async fn refresh_from_source(&self) -> Result<HashMap<String, Decimal>, RateFetchError> {
    let fetched = match self.source.fetch_rates(&self.settings.base).await {
      Ok(fetched) => {
        *self.retry_at.write() = None;
        fetched
      }
      Err(e) => {
        self.back_off();
        return Err(e);
      }
    };
    let now = Utc::now();
    let mut stored = HashMap::new();
    for code in &self.settings.targets {
      if *code == self.settings.base {
        continue;
      }
      let Some(rate) = fetched.get(code).copied().filter(|r| *r > Decimal::ZERO) else {
        continue;
      };
      let row = ExchangeRate {
        currency: code.clone(),
        rate,
        updated_at: now,
      };
      if let Err(e) = self.store.upsert_rate(row).await {
        warn!(currency = %code, error = %e, "Could not cache refreshed rate.");
      }
      self.remember(code, rate);
      stored.insert(code.clone(), rate);
    }
    info!(count = stored.len(), "Exchange rates refreshed.");
    Ok(stored)
  }

  fn remember(&self, code: &str, rate: Decimal) {
    self.last_known.write().insert(code.to_string(), rate);
  }

  pub async fn convert(&self, amount: Decimal, code: &str) -> Decimal {
    amount * self.rate_for(code).await
  }

  /// Display string for an amount already expressed in `code`.
  pub fn format_amount(&self, amount: Decimal, code: &str) -> String {
    format_amount(amount, code)
  }
}

pub fn currency_symbol(code: &str) -> Option<&'static str> {
  match code {
    "INR" => Some("₹"),
    "USD" => Some("$"),
    "EUR" => Some("€"),
    "GBP" => Some("£"),
    _ => None,
  }
}

/// Two decimal places; rounding happens here and nowhere in stored state.
pub fn format_amount(amount: Decimal, code: &str) -> String {
  let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
  match currency_symbol(code) {
    Some(symbol) => format!("{symbol}{rounded:.2}"),
    None => format!("{code} {rounded:.2}"),
  }
}

#[derive(Debug, Error)]
pub enum CurrencyError {
  #[error("unsupported currency '{0}'")]
  Unsupported(String),

  #[error(transparent)]
  Storage(#[from] StorageError),
}

impl From<CurrencyError> for AppError {
  fn from(err: CurrencyError) -> Self {
    match err {
      CurrencyError::Unsupported(code) => AppError::Validation(format!("Unsupported currency '{code}'")),
      CurrencyError::Storage(e) => AppError::Storage(e),
    }
  }
}

/// The shopper's chosen display currency, remembered in local storage.
pub struct DisplayCurrency;

impl DisplayCurrency {
  /// The stored code if it is still a configured target, else the base currency.
  pub fn load(storage: &dyn LocalStorage, settings: &CurrencySettings) -> String {
    match storage.get_item(CURRENCY_STORAGE_KEY) {
      Ok(Some(code)) if settings.is_supported(code.trim()) => code.trim().to_string(),
      Ok(_) => settings.base.clone(),
      Err(e) => {
        warn!(error = %e, "Could not read display currency.");
        settings.base.clone()
      }
    }
  }

  pub fn save(storage: &dyn LocalStorage, settings: &CurrencySettings, code: &str) -> Result<String, CurrencyError> {
    let code = code.trim().to_uppercase();
    if !settings.is_supported(&code) {
      return Err(CurrencyError::Unsupported(code));
    }
    storage.set_item(CURRENCY_STORAGE_KEY, &code)?;
    Ok(code)
  }
}
