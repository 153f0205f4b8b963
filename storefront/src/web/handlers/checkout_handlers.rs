// storefront/src/web/handlers/checkout_handlers.rs

use actix_web::{web, HttpResponse};
use serde_json::json;
use tracing::{info, instrument, warn};

use crate::errors::{AppError, FailureStage};
use crate::pipelines::{CheckoutOutcome, CheckoutRequest};
use crate::state::AppState;

#[instrument(name = "handler::checkout", skip(app_state, payload), fields(idempotency_key = %payload.idempotency_key))]
pub async fn checkout_handler(
  app_state: web::Data<AppState>,
  payload: web::Json<CheckoutRequest>,
) -> Result<HttpResponse, AppError> {
  let outcome = app_state.checkout.place_order(payload.into_inner()).await;
  let body = json!({
    "success": outcome.is_placed(),
    "message": outcome.user_message(),
    "outcome": outcome,
  });

  let response = match &outcome {
    CheckoutOutcome::Placed { order_id, .. } | CheckoutOutcome::PlacedWithoutEmail { order_id, .. } => {
      info!(%order_id, "Checkout placed an order.");
      HttpResponse::Ok().json(body)
    }
    CheckoutOutcome::Rejected { .. } => HttpResponse::BadRequest().json(body),
    CheckoutOutcome::Failed {
      stage: FailureStage::Configuration,
      ..
    } => HttpResponse::ServiceUnavailable().json(body),
    CheckoutOutcome::Failed { stage, .. } => {
      warn!(stage = stage.as_str(), "Checkout failed.");
      HttpResponse::BadGateway().json(body)
    }
  };
  Ok(response)
}
