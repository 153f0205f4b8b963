// storefront/src/errors.rs

use actix_web::{HttpResponse, ResponseError};
use knit_flow::FlowError;
use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

use crate::services::mail::MailError;
use crate::storage::StorageError;
use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum AppError {
  #[error("Validation Error: {0}")]
  Validation(String),

  #[error("Resource Not Found: {0}")]
  NotFound(String),

  #[error("Configuration Error: {0}")]
  Config(String),

  #[error("Data Store Error: {0}")]
  Store(#[from] StoreError),

  #[error("Local Storage Error: {0}")]
  Storage(#[from] StorageError),

  #[error("Mail Error: {0}")]
  Mail(#[from] MailError),

  #[error("Checkout Error: {0}")]
  Checkout(#[from] CheckoutError),

  #[error("Workflow Error: {source}")]
  Workflow {
    #[from]
    source: FlowError,
  },

  #[error("Internal Server Error: {0}")]
  Internal(String),
}

impl From<anyhow::Error> for AppError {
  fn from(err: anyhow::Error) -> Self {
    AppError::Internal(err.to_string())
  }
}

impl ResponseError for AppError {
  fn error_response(&self) -> HttpResponse {
    tracing::error!(application_error = %self, "Responding with error");
    match self {
      AppError::Validation(m) => HttpResponse::BadRequest().json(json!({"error": m})),
      AppError::NotFound(m) => HttpResponse::NotFound().json(json!({"error": m})),
      AppError::Config(m) => {
        HttpResponse::InternalServerError().json(json!({"error": "Configuration issue", "detail": m}))
      }
      AppError::Store(StoreError::MissingRelation { relation }) => HttpResponse::ServiceUnavailable()
        .json(json!({"error": "Store is misconfigured", "detail": format!("missing relation '{relation}'")})),
      AppError::Store(StoreError::Unavailable(_)) => {
        HttpResponse::ServiceUnavailable().json(json!({"error": "Data store unavailable"}))
      }
      AppError::Store(_) => HttpResponse::InternalServerError().json(json!({"error": "Database operation failed"})),
      AppError::Storage(e) => {
        HttpResponse::InternalServerError().json(json!({"error": "Local storage failed", "detail": e.to_string()}))
      }
      AppError::Mail(e) => {
        HttpResponse::BadGateway().json(json!({"error": "Email service error", "detail": e.to_string()}))
      }
      AppError::Checkout(e) => match e.stage() {
        FailureStage::Validation => HttpResponse::BadRequest().json(json!({"error": e.to_string()})),
        FailureStage::Configuration => HttpResponse::ServiceUnavailable()
          .json(json!({"error": "Store is misconfigured", "detail": e.to_string()})),
        _ => HttpResponse::BadGateway().json(json!({"error": "Checkout failed", "detail": e.to_string()})),
      },
      AppError::Workflow { source } => {
        tracing::error!(flow_error_source = ?source, "Workflow error details");
        HttpResponse::InternalServerError()
          .json(json!({"error": "Workflow processing error", "detail": source.to_string()}))
      }
      AppError::Internal(m) => {
        HttpResponse::InternalServerError().json(json!({"error": "An internal error occurred", "detail": m}))
      }
    }
  }
}

pub type Result<T, E = AppError> = std::result::Result<T, E>;

/// Where a checkout run gave up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureStage {
  Validation,
  Customer,
  Order,
  Items,
  Configuration,
}

impl FailureStage {
  pub fn as_str(&self) -> &'static str {
    match self {
      FailureStage::Validation => "validation",
      FailureStage::Customer => "customer",
      FailureStage::Order => "order",
      FailureStage::Items => "items",
      FailureStage::Configuration => "configuration",
    }
  }
}

/// Hard failures of the checkout workflow, one variant per stage.
#[derive(Debug, Error)]
pub enum CheckoutError {
  #[error("{0}")]
  Validation(String),

  #[error("a checkout is already in progress")]
  InProgress,

  #[error("could not save customer details: {0}")]
  Customer(#[source] StoreError),

  #[error("order storage is misconfigured: {0}")]
  Configuration(String),

  #[error("could not create order: {0}")]
  Order(#[source] StoreError),

  #[error("could not save items for order {order_id}: {source}")]
  Items {
    order_id: Uuid,
    #[source]
    source: StoreError,
  },

  #[error("checkout workflow error: {0}")]
  Workflow(#[from] FlowError),
}

impl CheckoutError {
  pub fn stage(&self) -> FailureStage {
    match self {
      CheckoutError::Validation(_) | CheckoutError::InProgress => FailureStage::Validation,
      CheckoutError::Customer(_) => FailureStage::Customer,
      CheckoutError::Configuration(_) => FailureStage::Configuration,
      CheckoutError::Order(_) => FailureStage::Order,
      CheckoutError::Items { .. } => FailureStage::Items,
      // Engine errors only surface before any write; report them against the order stage.
      CheckoutError::Workflow(_) => FailureStage::Order,
    }
  }
}
