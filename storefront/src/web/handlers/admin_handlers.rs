// storefront/src/web/handlers/admin_handlers.rs

use actix_web::{http::header, web, HttpResponse};
use serde::Deserialize;
use tracing::instrument;
use uuid::Uuid;

use super::catalog_handlers::find_product;
use crate::admin::{load_order_rows, orders_csv};
use crate::errors::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ProductTagsPayload {
  pub tags: Vec<String>,
}

#[instrument(name = "handler::admin_orders", skip(app_state))]
pub async fn admin_orders_handler(app_state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
  let rows = load_order_rows(app_state.stores.orders.as_ref()).await?;
  Ok(HttpResponse::Ok().json(serde_json::json!({ "rows": rows })))
}

#[instrument(name = "handler::admin_orders_csv", skip(app_state))]
pub async fn admin_orders_csv_handler(app_state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
  let rows = load_order_rows(app_state.stores.orders.as_ref()).await?;
  let filename = format!("orders-{}.csv", chrono::Utc::now().format("%Y-%m-%d"));
  Ok(
    HttpResponse::Ok()
      .content_type("text/csv; charset=utf-8")
      .insert_header((header::CONTENT_DISPOSITION, format!("attachment; filename=\"{filename}\"")))
      .body(orders_csv(&rows)),
  )
}

#[instrument(name = "handler::set_product_tags", skip(app_state, path, payload), fields(product_id = %path.as_ref()))]
pub async fn set_product_tags_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
  payload: web::Json<ProductTagsPayload>,
) -> Result<HttpResponse, AppError> {
  let product = find_product(&app_state, path.into_inner()).await?;
  let tags = app_state.tags.set_product_tags(product.id, &payload.tags).await?;
  Ok(HttpResponse::Ok().json(serde_json::json!({ "product_id": product.id, "tags": tags })))
}
