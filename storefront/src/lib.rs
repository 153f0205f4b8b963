// storefront/src/lib.rs

//! Knitwear storefront: catalog variants, the device-local cart, currency
//! conversion, the checkout workflow and the admin order view, served over
//! actix-web. The checkout runs on the `knit_flow` step pipeline.

pub mod admin;
pub mod config;
pub mod errors;
pub mod models;
pub mod pipelines;
pub mod relay;
pub mod services;
pub mod state;
pub mod storage;
pub mod store;
pub mod web;
