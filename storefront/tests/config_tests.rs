// tests/config_tests.rs

mod common;
use common::*;

use serial_test::serial;
use std::env;

use storefront::config::{AppConfig, RelayTransport};
use storefront::errors::AppError;

const VARS: &[&str] = &[
  "SERVER_HOST",
  "SERVER_PORT",
  "RELAY_PORT",
  "DATABASE_URL",
  "STORAGE_DIR",
  "BASE_CURRENCY",
  "TARGET_CURRENCIES",
  "RATE_FRESHNESS_HOURS",
  "RATE_RETRY_SECONDS",
  "RATE_API_URL",
  "OPERATOR_EMAIL",
  "MAIL_SENDER",
  "COMPANY_NAME",
  "MAIL_API_URL",
  "MAIL_SERVICE_ID",
  "MAIL_TEMPLATE_ID",
  "MAIL_PUBLIC_KEY",
  "RELAY_TRANSPORT",
];

fn clear_env() {
  for var in VARS {
    env::remove_var(var);
  }
}

#[test]
#[serial]
fn defaults_apply_when_nothing_is_set() {
  setup_tracing();
  clear_env();

  let config = AppConfig::from_env().unwrap();

  assert_eq!(config.server_port, 8080);
  assert_eq!(config.relay_port, 3001);
  assert!(config.database_url.is_none());
  assert!(config.mail_api.is_none());
  assert_eq!(config.relay_transport, RelayTransport::Log);
  assert_eq!(config.currency.base, "INR");
  assert_eq!(config.currency.freshness_hours, 12);
  assert_eq!(config.currency.retry_after_secs, 300);
}

#[test]
#[serial]
fn targets_always_include_the_base_currency() {
  setup_tracing();
  clear_env();
  env::set_var("BASE_CURRENCY", "inr");
  env::set_var("TARGET_CURRENCIES", "usd, eur");

  let config = AppConfig::from_env().unwrap();
  clear_env();

  assert_eq!(config.currency.targets, vec!["INR", "USD", "EUR"]);
  assert!(config.currency.is_supported("EUR"));
}

#[test]
#[serial]
fn mail_api_needs_every_variable() {
  setup_tracing();
  clear_env();
  env::set_var("MAIL_API_URL", "https://mail.example.com/send");
  env::set_var("MAIL_SERVICE_ID", "service");
  env::set_var("MAIL_TEMPLATE_ID", "template");

  let partial = AppConfig::from_env().unwrap();
  assert!(partial.mail_api.is_none());

  env::set_var("MAIL_PUBLIC_KEY", "secret-key");
  let full = AppConfig::from_env().unwrap();
  clear_env();

  let mail_api = full.mail_api.expect("mail api configured");
  assert_eq!(mail_api.service_id, "service");
  assert!(!format!("{mail_api:?}").contains("secret-key"));
}

#[test]
#[serial]
fn invalid_values_are_config_errors() {
  setup_tracing();
  clear_env();

  env::set_var("SERVER_PORT", "not-a-port");
  assert!(matches!(AppConfig::from_env(), Err(AppError::Config(_))));
  clear_env();

  env::set_var("RATE_FRESHNESS_HOURS", "0");
  assert!(matches!(AppConfig::from_env(), Err(AppError::Config(_))));
  clear_env();

  env::set_var("RATE_RETRY_SECONDS", "-1");
  assert!(matches!(AppConfig::from_env(), Err(AppError::Config(_))));
  clear_env();

  env::set_var("RELAY_TRANSPORT", "carrier-pigeon");
  assert!(matches!(AppConfig::from_env(), Err(AppError::Config(_))));
  clear_env();
}
