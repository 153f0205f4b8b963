// storefront/src/config.rs

use crate::errors::{AppError, Result};
use dotenvy::dotenv;
use std::env;
use std::path::PathBuf;

/// Currency settings shared by the converter and the display-currency store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrencySettings {
  pub base: String,
  /// Always contains `base`.
  pub targets: Vec<String>,
  pub freshness_hours: i64,
  /// After a failed refresh, callers get fallbacks for this long before the
  /// rate API is tried again. Zero retries on every call.
  pub retry_after_secs: i64,
  pub rate_api_url: String,
}

impl CurrencySettings {
  pub fn is_supported(&self, code: &str) -> bool {
    self.targets.iter().any(|t| t == code)
  }
}

impl Default for CurrencySettings {
  fn default() -> Self {
    Self {
      base: "INR".to_string(),
      targets: ["INR", "USD", "EUR", "GBP"].iter().map(|c| c.to_string()).collect(),
      freshness_hours: 12,
      retry_after_secs: 300,
      rate_api_url: "https://open.er-api.com/v6/latest".to_string(),
    }
  }
}

/// Credentials of the hosted mail API used for order confirmations.
#[derive(Clone)]
pub struct MailApiSettings {
  pub api_url: String,
  pub service_id: String,
  pub template_id: String,
  pub public_key: String,
}

impl std::fmt::Debug for MailApiSettings {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("MailApiSettings")
      .field("api_url", &self.api_url)
      .field("service_id", &self.service_id)
      .field("template_id", &self.template_id)
      .field("public_key", &"[REDACTED]")
      .finish()
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayTransport {
  Log,
  Http,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
  pub server_host: String,
  pub server_port: u16,
  pub relay_port: u16,
  pub database_url: Option<String>,
  pub storage_dir: PathBuf,
  pub currency: CurrencySettings,
  pub operator_email: String,
  pub mail_sender: String,
  pub company_name: String,
  /// `None` unless every mail API variable is set.
  pub mail_api: Option<MailApiSettings>,
  pub relay_transport: RelayTransport,
}

impl AppConfig {
  pub fn from_env() -> Result<Self> {
    dotenv().ok();

    let get_env = |var_name: &str| env::var(var_name).ok().filter(|v| !v.trim().is_empty());

    let server_host = get_env("SERVER_HOST").unwrap_or_else(|| "127.0.0.1".to_string());
    let server_port = parse_port("SERVER_PORT", get_env("SERVER_PORT"), 8080)?;
    let relay_port = parse_port("RELAY_PORT", get_env("RELAY_PORT"), 3001)?;
    let database_url = get_env("DATABASE_URL");
    let storage_dir = PathBuf::from(get_env("STORAGE_DIR").unwrap_or_else(|| ".storefront".to_string()));

    let defaults = CurrencySettings::default();
    let base = get_env("BASE_CURRENCY").map_or(defaults.base, |c| c.trim().to_uppercase());
    let mut targets: Vec<String> = match get_env("TARGET_CURRENCIES") {
      Some(raw) => raw
        .split(',')
        .map(|c| c.trim().to_uppercase())
        .filter(|c| !c.is_empty())
        .collect(),
      None => defaults.targets,
    };
    if !targets.contains(&base) {
      targets.insert(0, base.clone());
    }
    let freshness_hours = match get_env("RATE_FRESHNESS_HOURS") {
      Some(raw) => raw
        .parse::<i64>()
        .ok()
        .filter(|h| *h > 0)
        .ok_or_else(|| AppError::Config(format!("Invalid RATE_FRESHNESS_HOURS: '{raw}'")))?,
      None => defaults.freshness_hours,
    };
    let retry_after_secs = match get_env("RATE_RETRY_SECONDS") {
      Some(raw) => raw
        .parse::<i64>()
        .ok()
        .filter(|s| *s >= 0)
        .ok_or_else(|| AppError::Config(format!("Invalid RATE_RETRY_SECONDS: '{raw}'")))?,
      None => defaults.retry_after_secs,
    };
    let rate_api_url = get_env("RATE_API_URL").unwrap_or(defaults.rate_api_url);

    let operator_email = get_env("OPERATOR_EMAIL").unwrap_or_else(|| "orders@ganeshdeepknitwear.com".to_string());
    let mail_sender = get_env("MAIL_SENDER").unwrap_or_else(|| "noreply@ganeshdeepknitwear.com".to_string());
    let company_name = get_env("COMPANY_NAME").unwrap_or_else(|| "Ganeshdeep Knitwear".to_string());

    let mail_api = match (
      get_env("MAIL_API_URL"),
      get_env("MAIL_SERVICE_ID"),
      get_env("MAIL_TEMPLATE_ID"),
      get_env("MAIL_PUBLIC_KEY"),
    ) {
      (Some(api_url), Some(service_id), Some(template_id), Some(public_key)) => Some(MailApiSettings {
        api_url,
        service_id,
        template_id,
        public_key,
      }),
      _ => None,
    };

    let relay_transport = match get_env("RELAY_TRANSPORT").as_deref().map(str::to_lowercase).as_deref() {
      None | Some("log") => RelayTransport::Log,
      Some("http") => RelayTransport::Http,
      Some(other) => return Err(AppError::Config(format!("Invalid RELAY_TRANSPORT: '{other}'"))),
    };

    tracing::info!(
      database = database_url.is_some(),
      mail_api = mail_api.is_some(),
      base_currency = %base,
      "Application configuration loaded."
    );

    Ok(Self {
      server_host,
      server_port,
      relay_port,
      database_url,
      storage_dir,
      currency: CurrencySettings {
        base,
        targets,
        freshness_hours,
        retry_after_secs,
        rate_api_url,
      },
      operator_email,
      mail_sender,
      company_name,
      mail_api,
      relay_transport,
    })
  }
}

fn parse_port(name: &str, raw: Option<String>, default: u16) -> Result<u16> {
  match raw {
    Some(raw) => raw
      .parse::<u16>()
      .map_err(|e| AppError::Config(format!("Invalid {name}: {e}"))),
    None => Ok(default),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn port_defaults_and_rejects_garbage() {
    assert_eq!(parse_port("SERVER_PORT", None, 8080).unwrap(), 8080);
    assert_eq!(parse_port("SERVER_PORT", Some("9000".into()), 8080).unwrap(), 9000);
    assert!(matches!(
      parse_port("SERVER_PORT", Some("nine".into()), 8080),
      Err(AppError::Config(_))
    ));
  }

  #[test]
  fn default_targets_include_base() {
    let settings = CurrencySettings::default();
    assert!(settings.is_supported(&settings.base));
    assert!(!settings.is_supported("JPY"));
  }
}
