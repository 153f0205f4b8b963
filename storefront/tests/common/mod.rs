// tests/common/mod.rs
#![allow(dead_code)]

use async_trait::async_trait;
use chrono::Utc;
use once_cell::sync::Lazy;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::Level;
use uuid::Uuid;

use storefront::config::{AppConfig, CurrencySettings, RelayTransport};
use storefront::models::{CartImage, Product, ProductStatus};
use storefront::pipelines::{CheckoutDeps, CheckoutRequest, CheckoutService};
use storefront::services::currency::RateFetchError;
use storefront::services::mail::{OutgoingMail, SentMail};
use storefront::services::{
  CartLedger, LogMailTransport, MailError, MailTransport, OrderNotifier, RateSource, SharedCart,
};
use storefront::storage::{LocalStorage, MemoryStorage, StorageError};
use storefront::store::MemoryStore;

static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer()
    .try_init()
    .ok();
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}

pub fn product(name: &str, price: Decimal, display_order: i32) -> Product {
  Product {
    id: Uuid::new_v4(),
    name: name.to_string(),
    description: None,
    category: Some("sweaters".to_string()),
    status: ProductStatus::InStock,
    price,
    display_order,
    created_at: Utc::now(),
  }
}

pub fn image(url: &str, order: i32) -> CartImage {
  CartImage {
    image_url: url.to_string(),
    order,
  }
}

pub fn checkout_request(name: &str, email: &str) -> CheckoutRequest {
  CheckoutRequest {
    name: name.to_string(),
    email: email.to_string(),
    phone: Some("+91 98765 43210".to_string()),
    address: Some("12, MG Road, Ludhiana".to_string()),
    idempotency_key: Uuid::new_v4(),
  }
}

/// In-memory storage whose writes can be made to fail.
#[derive(Default)]
pub struct FlakyStorage {
  inner: MemoryStorage,
  failing: AtomicBool,
}

impl FlakyStorage {
  pub fn fail_writes(&self, failing: bool) {
    self.failing.store(failing, Ordering::SeqCst);
  }

  fn check(&self) -> Result<(), StorageError> {
    if self.failing.load(Ordering::SeqCst) {
      return Err(StorageError::Io(std::io::Error::new(
        std::io::ErrorKind::Other,
        "disk full",
      )));
    }
    Ok(())
  }
}

impl LocalStorage for FlakyStorage {
  fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
    self.inner.get_item(key)
  }

  fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
    self.check()?;
    self.inner.set_item(key, value)
  }

  fn remove_item(&self, key: &str) -> Result<(), StorageError> {
    self.check()?;
    self.inner.remove_item(key)
  }
}

/// A mail transport that always fails.
#[derive(Default)]
pub struct FailingMailTransport {
  pub attempts: AtomicUsize,
}

#[async_trait]
impl MailTransport for FailingMailTransport {
  async fn send(&self, _mail: &OutgoingMail) -> Result<SentMail, MailError> {
    self.attempts.fetch_add(1, Ordering::SeqCst);
    Err(MailError::Transport("connection refused".to_string()))
  }
}

/// Fixed rates, or a simulated outage; counts fetches either way.
pub struct StaticRateSource {
  rates: HashMap<String, Decimal>,
  fail: bool,
  pub calls: AtomicUsize,
}

impl StaticRateSource {
  pub fn with_rates(rates: &[(&str, Decimal)]) -> Self {
    Self {
      rates: rates.iter().map(|(c, r)| (c.to_string(), *r)).collect(),
      fail: false,
      calls: AtomicUsize::new(0),
    }
  }

  pub fn unreachable() -> Self {
    Self {
      rates: HashMap::new(),
      fail: true,
      calls: AtomicUsize::new(0),
    }
  }

  pub fn call_count(&self) -> usize {
    self.calls.load(Ordering::SeqCst)
  }
}

#[async_trait]
impl RateSource for StaticRateSource {
  async fn fetch_rates(&self, _base: &str) -> Result<HashMap<String, Decimal>, RateFetchError> {
    self.calls.fetch_add(1, Ordering::SeqCst);
    if self.fail {
      return Err(RateFetchError::Http("rate API unreachable".to_string()));
    }
    Ok(self.rates.clone())
  }
}

pub fn test_config() -> AppConfig {
  AppConfig {
    server_host: "127.0.0.1".to_string(),
    server_port: 0,
    relay_port: 0,
    database_url: None,
    storage_dir: std::env::temp_dir(),
    currency: CurrencySettings::default(),
    operator_email: "orders@example.com".to_string(),
    mail_sender: "noreply@example.com".to_string(),
    company_name: "Ganeshdeep Knitwear".to_string(),
    mail_api: None,
    relay_transport: RelayTransport::Log,
  }
}

/// A checkout wired to in-memory collaborators.
pub struct CheckoutHarness {
  pub store: Arc<MemoryStore>,
  pub storage: Arc<MemoryStorage>,
  pub cart: SharedCart,
  pub service: CheckoutService,
}

impl CheckoutHarness {
  pub fn new(transport: Option<Arc<dyn MailTransport>>) -> Self {
    Self::with_transport_for_cart(|_| transport)
  }

  /// Lets the mail transport hold the same cart the checkout clears.
  pub fn with_transport_for_cart(
    transport: impl FnOnce(SharedCart) -> Option<Arc<dyn MailTransport>>,
  ) -> Self {
    let store = Arc::new(MemoryStore::new());
    let storage = Arc::new(MemoryStorage::new());
    let cart = CartLedger::load(storage.clone() as Arc<dyn LocalStorage>).shared();
    let notifier = Arc::new(OrderNotifier::new(
      transport(cart.clone()),
      "orders@example.com",
      "noreply@example.com",
      "Ganeshdeep Knitwear",
    ));
    let service = CheckoutService::new(CheckoutDeps {
      customers: store.clone(),
      orders: store.clone(),
      notifier,
      cart: cart.clone(),
    });
    Self {
      store,
      storage,
      cart,
      service,
    }
  }

  pub fn with_log_mail() -> (Self, Arc<LogMailTransport>) {
    let mail = Arc::new(LogMailTransport::new());
    (Self::new(Some(mail.clone() as Arc<dyn MailTransport>)), mail)
  }

  /// Seeds a product and puts `qty` of it in the cart under `color`.
  pub fn stock_and_add(&self, product: &Product, qty: u32, color: &str) {
    self.store.add_product(product.clone());
    self
      .cart
      .lock()
      .add(product.id, &product.name, qty, color, product.price, vec![image("a.jpg", 1)])
      .unwrap();
  }

  pub fn cart_len(&self) -> usize {
    self.cart.lock().lines().len()
  }
}
