// storefront/src/web/handlers/cart_handlers.rs

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument};
use uuid::Uuid;

use super::catalog_handlers::find_product;
use crate::errors::AppError;
use crate::models::CartImage;
use crate::services::currency::format_amount;
use crate::services::DisplayCurrency;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CartQuery {
  pub currency: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AddToCartPayload {
  pub product_id: Uuid,
  pub qty: u32,
  /// Color name as shown to the shopper.
  #[serde(default)]
  pub color: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CurrencyPayload {
  pub currency: String,
}

async fn cart_view(app_state: &AppState, requested: Option<&str>) -> Result<HttpResponse, AppError> {
  let settings = app_state.converter.settings();
  let currency = match requested.map(|c| c.trim().to_uppercase()) {
    Some(code) if settings.is_supported(&code) => code,
    Some(code) => return Err(AppError::Validation(format!("Unsupported currency '{code}'"))),
    None => DisplayCurrency::load(app_state.storage.as_ref(), settings),
  };
  let rate = app_state.converter.rate_for(&currency).await;

  let (lines, totals) = {
    let cart = app_state.cart.lock();
    (cart.lines().to_vec(), cart.totals(rate))
  };
  Ok(HttpResponse::Ok().json(json!({
    "lines": lines,
    "currency": currency,
    "rate": rate,
    "totals": totals,
    "formatted_total": format_amount(totals.grand_total, &currency),
  })))
}

#[instrument(name = "handler::get_cart", skip(app_state))]
pub async fn get_cart_handler(
  app_state: web::Data<AppState>,
  query: web::Query<CartQuery>,
) -> Result<HttpResponse, AppError> {
  cart_view(&app_state, query.currency.as_deref()).await
}

/// Adds a line, snapshotting title, price and the gallery of the chosen color.
#[instrument(
  name = "handler::add_to_cart",
  skip(app_state, payload),
  fields(product_id = %payload.product_id, qty = payload.qty)
)]
pub async fn add_to_cart_handler(
  app_state: web::Data<AppState>,
  payload: web::Json<AddToCartPayload>,
) -> Result<HttpResponse, AppError> {
  let payload = payload.into_inner();
  let product = find_product(&app_state, payload.product_id).await?;
  let color = payload.color.unwrap_or_default().trim().to_string();

  let product_color_id = if color.is_empty() {
    None
  } else {
    let options = app_state.resolver.list_product_colors(product.id).await?;
    let option = options
      .iter()
      .find(|o| o.color.name == color)
      .ok_or_else(|| AppError::Validation(format!("Color '{color}' is not available for this product.")))?;
    Some(option.product_color_id)
  };
  let gallery = app_state.resolver.gallery_for_color(product.id, product_color_id).await?;
  let images = gallery
    .images
    .iter()
    .map(|img| CartImage {
      image_url: img.image_url.clone(),
      order: img.order,
    })
    .collect();

  app_state
    .cart
    .lock()
    .add(product.id, &product.name, payload.qty, &color, product.price, images)?;
  info!("Cart updated.");
  cart_view(&app_state, None).await
}

#[instrument(name = "handler::remove_cart_line", skip(app_state))]
pub async fn remove_cart_line_handler(
  app_state: web::Data<AppState>,
  path: web::Path<usize>,
) -> Result<HttpResponse, AppError> {
  let removed = app_state.cart.lock().remove(path.into_inner())?;
  if removed.is_some() {
    info!("Cart line removed.");
  }
  cart_view(&app_state, None).await
}

#[instrument(name = "handler::clear_cart", skip(app_state))]
pub async fn clear_cart_handler(app_state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
  app_state.cart.lock().clear()?;
  info!("Cart emptied.");
  cart_view(&app_state, None).await
}

#[instrument(name = "handler::set_currency", skip(app_state))]
pub async fn set_currency_handler(
  app_state: web::Data<AppState>,
  payload: web::Json<CurrencyPayload>,
) -> Result<HttpResponse, AppError> {
  let code = DisplayCurrency::save(app_state.storage.as_ref(), app_state.converter.settings(), &payload.currency)?;
  let rate = app_state.converter.rate_for(&code).await;
  Ok(HttpResponse::Ok().json(json!({ "currency": code, "rate": rate })))
}
