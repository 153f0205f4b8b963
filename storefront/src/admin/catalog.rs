// storefront/src/admin/catalog.rs

//! Saving a product's colors and images, and keeping display order compact.

use std::collections::{HashMap, HashSet};
use thiserror::Error;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::{NewProductColor, NewProductImage, ProductColor, ProductImage};
use crate::store::{CatalogStore, StoreError};

#[derive(Debug, Error)]
pub enum VariantError {
  #[error("invalid variant set: {0}")]
  Invalid(String),

  #[error(transparent)]
  Store(#[from] StoreError),
}

impl From<VariantError> for AppError {
  fn from(err: VariantError) -> Self {
    match err {
      VariantError::Invalid(m) => AppError::Validation(m),
      VariantError::Store(e) => AppError::Store(e),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorDraft {
  pub color_id: Uuid,
  pub is_default: bool,
}

/// `color_id` is a `Color` id; it is mapped to the product's new ProductColor row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageDraft {
  pub image_url: String,
  pub order: i32,
  pub color_id: Option<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantSet {
  pub colors: Vec<ProductColor>,
  pub images: Vec<ProductImage>,
}

fn validate(colors: &[ColorDraft], images: &[ImageDraft]) -> Result<(), VariantError> {
  let mut seen_colors = HashSet::new();
  if let Some(dup) = colors.iter().find(|c| !seen_colors.insert(c.color_id)) {
    return Err(VariantError::Invalid(format!("color {} listed twice", dup.color_id)));
  }
  if colors.iter().filter(|c| c.is_default).count() > 1 {
    return Err(VariantError::Invalid("more than one default color".to_string()));
  }
  let mut seen_orders = HashSet::new();
  if let Some(dup) = images.iter().find(|i| !seen_orders.insert(i.order)) {
    return Err(VariantError::Invalid(format!("image order {} used twice", dup.order)));
  }
  if let Some(stray) = images
    .iter()
    .filter_map(|i| i.color_id)
    .find(|id| !seen_colors.contains(id))
  {
    return Err(VariantError::Invalid(format!(
      "image refers to color {stray} which is not one of the product's colors"
    )));
  }
  Ok(())
}

/// Replaces the product's color set, then its images. Colors go first so the
/// images can reference the new ProductColor rows.
#[instrument(name = "admin::save_product_variants", skip(catalog, colors, images))]
pub async fn save_product_variants(
  catalog: &dyn CatalogStore,
  product_id: Uuid,
  colors: Vec<ColorDraft>,
  images: Vec<ImageDraft>,
) -> Result<VariantSet, VariantError> {
  validate(&colors, &images)?;

  let is_multi_color = colors.len() > 1;
  let has_default = colors.iter().any(|c| c.is_default);
  let new_colors: Vec<NewProductColor> = colors
    .iter()
    .enumerate()
    .map(|(idx, c)| NewProductColor {
      color_id: c.color_id,
      is_multi_color,
      is_default: c.is_default || (!has_default && idx == 0),
    })
    .collect();

  let saved_colors = catalog.replace_product_colors(product_id, new_colors).await?;
  let by_color: HashMap<Uuid, Uuid> = saved_colors.iter().map(|pc| (pc.color_id, pc.id)).collect();

  let new_images: Vec<NewProductImage> = images
    .into_iter()
    .map(|img| NewProductImage {
      product_color_id: img.color_id.and_then(|id| by_color.get(&id).copied()),
      image_url: img.image_url,
      order: img.order,
    })
    .collect();
  let saved_images = catalog.replace_product_images(product_id, new_images).await?;

  info!(colors = saved_colors.len(), images = saved_images.len(), "Product variants saved.");
  Ok(VariantSet {
    colors: saved_colors,
    images: saved_images,
  })
}

/// Renumbers products 1..n in their current display order. Returns the
/// `(product_id, new_order)` pairs that changed.
#[instrument(name = "admin::renumber_display_order", skip_all)]
pub async fn renumber_display_order(catalog: &dyn CatalogStore) -> Result<Vec<(Uuid, i32)>, StoreError> {
  let mut products = catalog.list_products().await?;
  products.sort_by(|a, b| {
    a.display_order
      .cmp(&b.display_order)
      .then_with(|| a.created_at.cmp(&b.created_at))
  });

  let changes: Vec<(Uuid, i32)> = products
    .iter()
    .zip(1..)
    .filter(|(p, order)| p.display_order != *order)
    .map(|(p, order)| (p.id, order))
    .collect();

  if !changes.is_empty() {
    catalog.update_display_orders(&changes).await?;
  }
  info!(changed = changes.len(), "Display order renumbered.");
  Ok(changes)
}
