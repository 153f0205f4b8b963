// storefront/src/web/handlers/mod.rs

pub mod admin_handlers;
pub mod cart_handlers;
pub mod catalog_handlers;
pub mod checkout_handlers;
