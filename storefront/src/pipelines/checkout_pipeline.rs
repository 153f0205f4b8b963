// storefront/src/pipelines/checkout_pipeline.rs

//! Turns the cart into a durable order.
//!
//! Steps run strictly in order, each needing what the previous produced:
//! customer upsert, order header, order items, then the confirmation email
//! and cart clearing. The last two are optional steps: their failures are
//! recorded in the run summary and never undo the order. A replayed
//! submission writes nothing and leaves the cart alone. Nothing written by
//! an earlier step is rolled back when a later one fails; a retry with the
//! same idempotency key picks up an order that is still missing its items.

use knit_flow::{ContextData, Pipeline, RunSummary, SkipCondition};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::errors::{CheckoutError, FailureStage};
use crate::pipelines::checkout_steps;
use crate::pipelines::contexts::{CheckoutCtxData, CheckoutDeps, CheckoutRequest};

pub const STEP_VALIDATE: &str = "validate_checkout";
pub const STEP_UPSERT_CUSTOMER: &str = "upsert_customer";
pub const STEP_CREATE_ORDER: &str = "create_order_header";
pub const STEP_CREATE_ITEMS: &str = "create_order_items";
pub const STEP_NOTIFY: &str = "notify_order_confirmation";
pub const STEP_CLEAR_CART: &str = "clear_cart";

/// What the shopper is told after one checkout attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CheckoutOutcome {
  /// Order and items are stored and the confirmation went out (or was
  /// already handled by an earlier submission with the same key).
  Placed {
    order_id: Uuid,
    email_message_id: Option<String>,
    replayed: bool,
  },
  /// Order and items are stored; only the confirmation email failed.
  PlacedWithoutEmail { order_id: Uuid, email_error: String },
  /// Rejected before any write.
  Rejected { message: String },
  Failed { stage: FailureStage, message: String },
}

impl CheckoutOutcome {
  pub fn is_placed(&self) -> bool {
    matches!(
      self,
      CheckoutOutcome::Placed { .. } | CheckoutOutcome::PlacedWithoutEmail { .. }
    )
  }

  pub fn order_id(&self) -> Option<Uuid> {
    match self {
      CheckoutOutcome::Placed { order_id, .. } | CheckoutOutcome::PlacedWithoutEmail { order_id, .. } => {
        Some(*order_id)
      }
      _ => None,
    }
  }

  fn from_error(err: CheckoutError) -> Self {
    match err.stage() {
      FailureStage::Validation => CheckoutOutcome::Rejected {
        message: err.to_string(),
      },
      stage => CheckoutOutcome::Failed {
        stage,
        message: err.to_string(),
      },
    }
  }

  /// The single alert-level message for this attempt.
  pub fn user_message(&self) -> String {
    match self {
      CheckoutOutcome::Placed { order_id, .. } => {
        format!("Order placed successfully! Your order ID is {order_id}.")
      }
      CheckoutOutcome::PlacedWithoutEmail { order_id, .. } => format!(
        "Order placed successfully! Your order ID is {order_id}. \
         We could not send the confirmation email, but your order has been received."
      ),
      CheckoutOutcome::Rejected { message } => message.clone(),
      CheckoutOutcome::Failed {
        stage: FailureStage::Configuration,
        ..
      } => "Our store is not set up to accept orders right now. Please contact us directly to place your order."
        .to_string(),
      CheckoutOutcome::Failed { .. } => {
        "Sorry, we could not place your order. Your cart has been kept; please try again.".to_string()
      }
    }
  }
}

fn skip_when_replayed() -> Option<SkipCondition<CheckoutCtxData>> {
  Some(Arc::new(|ctx_data: ContextData<CheckoutCtxData>| ctx_data.read().replayed))
}

pub fn build_checkout_pipeline() -> Pipeline<CheckoutCtxData, CheckoutError> {
  let mut p = Pipeline::<CheckoutCtxData, CheckoutError>::new(&[
    (STEP_VALIDATE, false, None),
    (STEP_UPSERT_CUSTOMER, false, None),
    (STEP_CREATE_ORDER, false, None),
    (STEP_CREATE_ITEMS, false, skip_when_replayed()),
    (STEP_NOTIFY, true, skip_when_replayed()),
    (STEP_CLEAR_CART, true, skip_when_replayed()),
  ]);

  p.on_root(STEP_VALIDATE, checkout_steps::validate_checkout);
  p.on_root(STEP_UPSERT_CUSTOMER, checkout_steps::upsert_customer);
  p.on_root(STEP_CREATE_ORDER, checkout_steps::create_order_header);
  p.on_root(STEP_CREATE_ITEMS, checkout_steps::create_order_items);
  p.on_root(STEP_NOTIFY, checkout_steps::notify_order_confirmation);
  p.on_root(STEP_CLEAR_CART, checkout_steps::clear_cart);
  p
}

/// Holds the in-flight flag for one run and releases it on drop.
struct InFlightGuard<'a>(&'a AtomicBool);

impl<'a> InFlightGuard<'a> {
  fn acquire(flag: &'a AtomicBool) -> Option<Self> {
    flag
      .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
      .ok()
      .map(|_| InFlightGuard(flag))
  }
}

impl Drop for InFlightGuard<'_> {
  fn drop(&mut self) {
    self.0.store(false, Ordering::Release);
  }
}

pub struct CheckoutService {
  pipeline: Pipeline<CheckoutCtxData, CheckoutError>,
  deps: CheckoutDeps,
  in_flight: AtomicBool,
}

impl CheckoutService {
  pub fn new(deps: CheckoutDeps) -> Self {
    Self {
      pipeline: build_checkout_pipeline(),
      deps,
      in_flight: AtomicBool::new(false),
    }
  }

  pub fn is_in_flight(&self) -> bool {
    self.in_flight.load(Ordering::Acquire)
  }

  /// Runs one checkout over a snapshot of the current cart. Never fails;
  /// every path ends in a [`CheckoutOutcome`].
  #[instrument(name = "CheckoutService::place_order", skip_all, fields(idempotency_key = %request.idempotency_key))]
  pub async fn place_order(&self, request: CheckoutRequest) -> CheckoutOutcome {
    let Some(_guard) = InFlightGuard::acquire(&self.in_flight) else {
      warn!("Checkout rejected: another checkout is in flight.");
      return CheckoutOutcome::from_error(CheckoutError::InProgress);
    };

    let lines = self.deps.cart.lock().lines().to_vec();
    let ctx_data = ContextData::new(CheckoutCtxData::new(self.deps.clone(), request, lines));

    match self.pipeline.run(ctx_data.clone()).await {
      Ok(summary) => Self::summarize(&ctx_data, &summary),
      Err(e) => {
        match e.stage() {
          FailureStage::Validation => warn!(error = %e, "Checkout rejected."),
          stage => error!(error = %e, stage = stage.as_str(), "Checkout failed."),
        }
        CheckoutOutcome::from_error(e)
      }
    }
  }

  fn summarize(ctx_data: &ContextData<CheckoutCtxData>, summary: &RunSummary) -> CheckoutOutcome {
    let guard = ctx_data.read();
    let Some(order_id) = guard.order.as_ref().map(|o| o.id).filter(|_| summary.is_completed()) else {
      error!(steps = ?summary.executed_steps, "Checkout ended without a placed order.");
      return CheckoutOutcome::Failed {
        stage: FailureStage::Order,
        message: "checkout halted before the order was placed".to_string(),
      };
    };

    if let Some(failure) = summary.soft_failure_for(STEP_CLEAR_CART) {
      warn!(%order_id, error = %failure.message, "Cart kept after a placed order.");
    }

    if guard.replayed {
      info!(%order_id, "Checkout replayed an already placed order.");
      return CheckoutOutcome::Placed {
        order_id,
        email_message_id: None,
        replayed: true,
      };
    }

    match &guard.notification {
      Some(outcome) if outcome.success => {
        info!(%order_id, "Checkout completed.");
        CheckoutOutcome::Placed {
          order_id,
          email_message_id: outcome.message_id.clone(),
          replayed: false,
        }
      }
      other => {
        let email_error = other
          .as_ref()
          .and_then(|o| o.error.clone())
          .or_else(|| summary.soft_failure_for(STEP_NOTIFY).map(|f| f.message.clone()))
          .unwrap_or_else(|| "confirmation email was not sent".to_string());
        warn!(%order_id, %email_error, "Order placed without confirmation email.");
        CheckoutOutcome::PlacedWithoutEmail { order_id, email_error }
      }
    }
  }
}
