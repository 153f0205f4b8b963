// storefront/src/admin/mod.rs

//! Back-office helpers: the order aggregation read path and product variant maintenance.

pub mod catalog;
pub mod orders;

pub use catalog::{renumber_display_order, save_product_variants, ColorDraft, ImageDraft, VariantError, VariantSet};
pub use orders::{flatten_orders, load_order_rows, orders_csv, OrderRow, CSV_HEADER};
