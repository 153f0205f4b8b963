// storefront/src/pipelines/contexts.rs

//! Data the checkout pipeline runs on. Handlers receive it wrapped in
//! `knit_flow::ContextData`.

use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::models::{CartLineItem, Customer, Order, OrderItem};
use crate::services::{NotifyOutcome, OrderNotifier, SharedCart};
use crate::store::{CustomerStore, OrderStore};

/// Collaborators a checkout run talks to.
#[derive(Clone)]
pub struct CheckoutDeps {
  pub customers: Arc<dyn CustomerStore>,
  pub orders: Arc<dyn OrderStore>,
  pub notifier: Arc<OrderNotifier>,
  pub cart: SharedCart,
}

/// Buyer contact fields plus the client's idempotency key for this submission.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Validate)]
pub struct CheckoutRequest {
  pub name: String,
  #[validate(email)]
  pub email: String,
  #[serde(default)]
  pub phone: Option<String>,
  #[serde(default)]
  pub address: Option<String>,
  pub idempotency_key: Uuid,
}

pub struct CheckoutCtxData {
  pub deps: CheckoutDeps,
  pub request: CheckoutRequest,
  /// Cart lines as they were when the checkout started.
  pub lines: Vec<CartLineItem>,
  pub customer: Option<Customer>,
  pub order: Option<Order>,
  /// Items written by this run; empty when it replayed an earlier order.
  pub items: Vec<OrderItem>,
  /// The idempotency key matched an order that already has its items.
  pub replayed: bool,
  pub notification: Option<NotifyOutcome>,
}

impl CheckoutCtxData {
  pub fn new(deps: CheckoutDeps, request: CheckoutRequest, lines: Vec<CartLineItem>) -> Self {
    Self {
      deps,
      request,
      lines,
      customer: None,
      order: None,
      items: Vec::new(),
      replayed: false,
      notification: None,
    }
  }
}
