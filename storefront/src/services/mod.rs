// storefront/src/services/mod.rs

pub mod cart;
pub mod currency;
pub mod mail;
pub mod notifier;
pub mod tags;
pub mod variants;

pub use cart::{CartError, CartLedger, CartTotals, SharedCart};
pub use currency::{CurrencyConverter, DisplayCurrency, HttpRateSource, RateSource};
pub use mail::{HttpMailTransport, LogMailTransport, MailError, MailTransport};
pub use notifier::{NotifyOutcome, OrderNotifier};
pub use tags::TagService;
pub use variants::{Gallery, GallerySource, VariantResolver};
