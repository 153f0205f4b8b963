// storefront/src/pipelines/checkout_steps.rs

//! Handlers for the checkout pipeline, one per step. Each reads what it
//! needs from the context, drops the lock, then talks to the store.

use anyhow::anyhow;
use knit_flow::{ContextData, FlowError, PipelineControl};
use rust_decimal::Decimal;
use tracing::{error, info, instrument, warn};
use validator::Validate;

use crate::errors::CheckoutError;
use crate::models::{CustomerUpsert, NewOrder, NewOrderItem, OrderStatus};
use crate::pipelines::contexts::{CheckoutCtxData, CheckoutRequest};
use crate::store::StoreError;

type StepResult = Result<PipelineControl, CheckoutError>;

fn non_blank(value: &Option<String>) -> Option<String> {
  value.as_deref().map(str::trim).filter(|v| !v.is_empty()).map(str::to_string)
}

/// A best-effort step's failure, recorded by the engine as a soft failure.
fn soft_failure(message: String) -> CheckoutError {
  CheckoutError::Workflow(FlowError::from(anyhow!(message)))
}

#[instrument(name = "checkout::validate", skip(ctx_data), err)]
pub async fn validate_checkout(ctx_data: ContextData<CheckoutCtxData>) -> StepResult {
  let guard = ctx_data.read();
  if guard.lines.is_empty() {
    return Err(CheckoutError::Validation("Your cart is empty.".to_string()));
  }
  if guard.request.name.trim().is_empty() {
    return Err(CheckoutError::Validation("Please enter your name.".to_string()));
  }
  let email = guard.request.email.trim();
  if email.is_empty() {
    return Err(CheckoutError::Validation("Please enter your email address.".to_string()));
  }
  let contact = CheckoutRequest {
    email: email.to_string(),
    ..guard.request.clone()
  };
  if let Err(errors) = contact.validate() {
    warn!(%errors, "Checkout contact details failed validation.");
    return Err(CheckoutError::Validation("Please enter a valid email address.".to_string()));
  }
  if guard.lines.iter().any(|l| l.qty == 0 || i32::try_from(l.qty).is_err()) {
    return Err(CheckoutError::Validation("A cart line has an invalid quantity.".to_string()));
  }
  Ok(PipelineControl::Continue)
}

#[instrument(name = "checkout::upsert_customer", skip(ctx_data), err)]
pub async fn upsert_customer(ctx_data: ContextData<CheckoutCtxData>) -> StepResult {
  let (customers, upsert) = {
    let guard = ctx_data.read();
    let request = &guard.request;
    (
      guard.deps.customers.clone(),
      CustomerUpsert {
        name: request.name.trim().to_string(),
        email: request.email.trim().to_lowercase(),
        phone: non_blank(&request.phone),
        address: non_blank(&request.address),
      },
    )
  };

  let customer = customers.upsert_customer(upsert).await.map_err(|e| {
    error!(error = %e, "Customer upsert failed.");
    CheckoutError::Customer(e)
  })?;
  info!(customer_id = %customer.id, "Customer resolved.");
  ctx_data.write().customer = Some(customer);
  Ok(PipelineControl::Continue)
}

fn order_stage_error(e: StoreError) -> CheckoutError {
  if e.is_missing_relation() {
    error!(error = %e, "Order storage is misconfigured.");
    CheckoutError::Configuration(e.to_string())
  } else {
    error!(error = %e, "Order creation failed.");
    CheckoutError::Order(e)
  }
}

/// Creates the order header, or adopts the one an earlier attempt with the
/// same idempotency key already created.
#[instrument(name = "checkout::create_order_header", skip(ctx_data), err)]
pub async fn create_order_header(ctx_data: ContextData<CheckoutCtxData>) -> StepResult {
  let (orders, customer_id, key, total) = {
    let guard = ctx_data.read();
    let customer_id = guard
      .customer
      .as_ref()
      .map(|c| c.id)
      .ok_or_else(|| CheckoutError::Workflow(FlowError::Internal("customer not resolved".to_string())))?;
    let total: Decimal = guard.lines.iter().map(|l| l.line_total(Decimal::ONE)).sum();
    (guard.deps.orders.clone(), customer_id, guard.request.idempotency_key, total)
  };

  if let Some(existing) = orders
    .find_order_by_idempotency_key(key)
    .await
    .map_err(order_stage_error)?
  {
    if existing.customer_id != customer_id {
      return Err(CheckoutError::Validation(
        "This checkout token was already used for another customer.".to_string(),
      ));
    }
    let item_count = orders.count_order_items(existing.id).await.map_err(order_stage_error)?;
    let replayed = item_count > 0;
    info!(order_id = %existing.id, item_count, replayed, "Reusing order for repeated submission.");
    let mut guard = ctx_data.write();
    guard.order = Some(existing);
    guard.replayed = replayed;
    return Ok(PipelineControl::Continue);
  }

  let order = orders
    .insert_order(NewOrder {
      customer_id,
      status: OrderStatus::Pending,
      total_amount: Some(total).filter(|t| *t > Decimal::ZERO),
      idempotency_key: Some(key),
    })
    .await
    .map_err(order_stage_error)?;
  info!(order_id = %order.id, "Order header created.");
  ctx_data.write().order = Some(order);
  Ok(PipelineControl::Continue)
}

#[instrument(name = "checkout::create_order_items", skip(ctx_data), err)]
pub async fn create_order_items(ctx_data: ContextData<CheckoutCtxData>) -> StepResult {
  let (orders, order_id, new_items) = {
    let guard = ctx_data.read();
    let order_id = guard
      .order
      .as_ref()
      .map(|o| o.id)
      .ok_or_else(|| CheckoutError::Workflow(FlowError::Internal("order not created".to_string())))?;
    let new_items = guard
      .lines
      .iter()
      .map(|line| NewOrderItem {
        order_id,
        product_id: line.product_id,
        quantity: i32::try_from(line.qty).unwrap_or(i32::MAX),
        product_color: line.color.clone(),
      })
      .collect::<Vec<_>>();
    (guard.deps.orders.clone(), order_id, new_items)
  };

  let items = orders.insert_order_items(new_items).await.map_err(|source| {
    error!(%order_id, error = %source, "Order items failed; order header left without items.");
    CheckoutError::Items { order_id, source }
  })?;
  info!(%order_id, count = items.len(), "Order items created.");
  ctx_data.write().items = items;
  Ok(PipelineControl::Continue)
}

#[instrument(name = "checkout::notify", skip(ctx_data), err)]
pub async fn notify_order_confirmation(ctx_data: ContextData<CheckoutCtxData>) -> StepResult {
  let (notifier, order, customer, lines) = {
    let guard = ctx_data.read();
    match (&guard.order, &guard.customer) {
      (Some(order), Some(customer)) => (
        guard.deps.notifier.clone(),
        order.clone(),
        customer.clone(),
        guard.lines.clone(),
      ),
      _ => return Err(soft_failure("order or customer missing for confirmation".to_string())),
    }
  };

  let outcome = notifier.send(&order, &customer, &lines).await;
  let failure = outcome.error.clone().filter(|_| !outcome.success);
  ctx_data.write().notification = Some(outcome);
  match failure {
    Some(message) => Err(soft_failure(message)),
    None => Ok(PipelineControl::Continue),
  }
}

/// Takes the items this run ordered out of the cart. Lines added while the
/// checkout was running are left for the next one.
#[instrument(name = "checkout::clear_cart", skip(ctx_data), err)]
pub async fn clear_cart(ctx_data: ContextData<CheckoutCtxData>) -> StepResult {
  let (cart, items) = {
    let guard = ctx_data.read();
    (guard.deps.cart.clone(), guard.items.clone())
  };
  let removed = cart.lock().remove_ordered(&items);
  removed.map(|()| PipelineControl::Continue).map_err(|e| {
    warn!(error = %e, "Order placed but the cart could not be cleared.");
    soft_failure(e.to_string())
  })
}
