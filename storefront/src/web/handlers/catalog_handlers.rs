// storefront/src/web/handlers/catalog_handlers.rs

use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::{Product, Tag};
use crate::state::AppState;

pub(crate) async fn find_product(app_state: &AppState, product_id: Uuid) -> Result<Product, AppError> {
  app_state
    .stores
    .catalog
    .get_product(product_id)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Product with ID {product_id} not found.")))
}

/// A product as listed in the gallery, with its tags.
#[derive(Debug, Serialize)]
pub struct ProductListing {
  #[serde(flatten)]
  pub product: Product,
  pub tags: Vec<Tag>,
}

#[instrument(name = "handler::list_products", skip(app_state))]
pub async fn list_products_handler(app_state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
  let products = app_state.stores.catalog.list_products().await?;
  let ids: Vec<Uuid> = products.iter().map(|p| p.id).collect();
  let mut tags = app_state.tags.tags_by_product(&ids).await?;
  let listings: Vec<ProductListing> = products
    .into_iter()
    .map(|product| ProductListing {
      tags: tags.remove(&product.id).unwrap_or_default(),
      product,
    })
    .collect();
  info!(count = listings.len(), "Products listed.");
  Ok(HttpResponse::Ok().json(json!({ "products": listings })))
}

/// Product detail: the product, its tags, its colors default-first, and the
/// gallery for the default color.
#[instrument(name = "handler::get_product", skip(app_state, path), fields(product_id = %path.as_ref()))]
pub async fn get_product_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  let product_id = path.into_inner();
  let product = find_product(&app_state, product_id).await?;
  let tags = app_state.tags.tags_for(product_id).await?;
  let colors = app_state.resolver.list_product_colors(product_id).await?;
  let default_color = colors.first().cloned();
  let gallery = app_state
    .resolver
    .gallery_for_color(product_id, default_color.as_ref().map(|c| c.product_color_id))
    .await?;

  Ok(HttpResponse::Ok().json(json!({
    "product": product,
    "tags": tags,
    "colors": colors,
    "default_color": default_color,
    "gallery": gallery,
  })))
}

#[instrument(name = "handler::product_colors", skip(app_state, path), fields(product_id = %path.as_ref()))]
pub async fn product_colors_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  let colors = app_state.resolver.list_product_colors(path.into_inner()).await?;
  Ok(HttpResponse::Ok().json(json!({ "colors": colors })))
}

#[derive(Debug, Deserialize)]
pub struct GalleryQuery {
  /// A ProductColor id; absent means the general gallery.
  pub color_id: Option<Uuid>,
}

#[instrument(name = "handler::product_gallery", skip(app_state, path), fields(product_id = %path.as_ref()))]
pub async fn product_gallery_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
  query: web::Query<GalleryQuery>,
) -> Result<HttpResponse, AppError> {
  let gallery = app_state
    .resolver
    .gallery_for_color(path.into_inner(), query.color_id)
    .await?;
  Ok(HttpResponse::Ok().json(gallery))
}

#[instrument(name = "handler::list_colors", skip(app_state))]
pub async fn list_colors_handler(app_state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
  let colors = app_state.resolver.list_colors().await?;
  Ok(HttpResponse::Ok().json(json!({ "colors": colors })))
}
