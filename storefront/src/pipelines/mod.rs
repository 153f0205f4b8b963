// storefront/src/pipelines/mod.rs

//! Workflows built on the knit-flow engine.

pub mod checkout_pipeline;
pub mod checkout_steps;
pub mod contexts;

pub use checkout_pipeline::{build_checkout_pipeline, CheckoutOutcome, CheckoutService};
pub use contexts::{CheckoutCtxData, CheckoutDeps, CheckoutRequest};
