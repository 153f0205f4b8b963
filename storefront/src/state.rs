// storefront/src/state.rs

use anyhow::Context;
use std::sync::Arc;

use crate::config::AppConfig;
use crate::pipelines::{CheckoutDeps, CheckoutService};
use crate::services::{
  CartLedger, CurrencyConverter, HttpMailTransport, HttpRateSource, MailTransport, OrderNotifier, RateSource,
  SharedCart, TagService, VariantResolver,
};
use crate::storage::{FileStorage, LocalStorage};
use crate::store::{MemoryStore, PgStore, StoreHandles};

#[derive(Clone)]
pub struct AppState {
  pub config: Arc<AppConfig>,
  pub stores: StoreHandles,
  pub storage: Arc<dyn LocalStorage>,
  pub cart: SharedCart,
  pub resolver: VariantResolver,
  pub tags: TagService,
  pub converter: Arc<CurrencyConverter>,
  pub checkout: Arc<CheckoutService>,
}

impl AppState {
  /// Wires the services over already constructed collaborators.
  pub fn assemble(
    config: Arc<AppConfig>,
    stores: StoreHandles,
    storage: Arc<dyn LocalStorage>,
    rate_source: Arc<dyn RateSource>,
    mail: Option<Arc<dyn MailTransport>>,
  ) -> Self {
    let cart = CartLedger::load(storage.clone()).shared();
    let notifier = Arc::new(OrderNotifier::new(
      mail,
      config.operator_email.clone(),
      config.mail_sender.clone(),
      config.company_name.clone(),
    ));
    let checkout = Arc::new(CheckoutService::new(CheckoutDeps {
      customers: stores.customers.clone(),
      orders: stores.orders.clone(),
      notifier,
      cart: cart.clone(),
    }));
    let converter = Arc::new(CurrencyConverter::new(
      config.currency.clone(),
      stores.rates.clone(),
      rate_source,
    ));

    Self {
      resolver: VariantResolver::new(stores.catalog.clone()),
      tags: TagService::new(stores.catalog.clone()),
      config,
      stores,
      storage,
      cart,
      converter,
      checkout,
    }
  }

  /// Production wiring: Postgres when `DATABASE_URL` is set, file-backed
  /// local storage, and the HTTP rate and mail APIs.
  pub async fn from_config(config: AppConfig) -> anyhow::Result<Self> {
    let stores = match &config.database_url {
      Some(url) => {
        let store = PgStore::connect(url).await.context("connecting to the database")?;
        tracing::info!("Using the Postgres data store.");
        StoreHandles::from_store(Arc::new(store))
      }
      None => {
        tracing::warn!("DATABASE_URL not set; using an in-memory data store.");
        StoreHandles::from_store(Arc::new(MemoryStore::new()))
      }
    };
    let storage: Arc<dyn LocalStorage> =
      Arc::new(FileStorage::open(&config.storage_dir).context("opening local storage")?);
    let rate_source: Arc<dyn RateSource> = Arc::new(HttpRateSource::new(config.currency.rate_api_url.clone()));
    let mail: Option<Arc<dyn MailTransport>> = match config.mail_api.clone() {
      Some(settings) => Some(Arc::new(HttpMailTransport::new(settings))),
      None => {
        tracing::warn!("Mail API not configured; order confirmations will not be sent.");
        None
      }
    };

    Ok(Self::assemble(Arc::new(config), stores, storage, rate_source, mail))
  }
}
