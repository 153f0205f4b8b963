// storefront/src/services/variants.rs

//! Which colors a product comes in, and which images to show for each.

use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::models::{Color, ProductColorOption, ProductImage};
use crate::store::{CatalogStore, StoreResult};

/// Which gallery `gallery_for_color` ended up using.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GallerySource {
  Color,
  General,
  Empty,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Gallery {
  pub source: GallerySource,
  pub images: Vec<ProductImage>,
}

/// Default first; then lowest color name (case-insensitive), then lowest
/// color id. Applied the same way whether zero, one or several rows are
/// marked default, so the first element is always the default color.
pub fn order_product_colors(mut options: Vec<ProductColorOption>) -> Vec<ProductColorOption> {
  options.sort_by(|a, b| {
    b.is_default
      .cmp(&a.is_default)
      .then_with(|| a.color.name.to_lowercase().cmp(&b.color.name.to_lowercase()))
      .then_with(|| a.color.id.cmp(&b.color.id))
  });
  options
}

/// Images associated with exactly `product_color_id` (`None` = general), by `order`.
pub fn select_images(images: &[ProductImage], product_color_id: Option<Uuid>) -> Vec<ProductImage> {
  let mut selected: Vec<ProductImage> = images
    .iter()
    .filter(|img| img.product_color_id == product_color_id)
    .cloned()
    .collect();
  selected.sort_by_key(|img| img.order);
  selected
}

#[derive(Clone)]
pub struct VariantResolver {
  catalog: Arc<dyn CatalogStore>,
}

impl VariantResolver {
  pub fn new(catalog: Arc<dyn CatalogStore>) -> Self {
    Self { catalog }
  }

  /// All colors, by name.
  pub async fn list_colors(&self) -> StoreResult<Vec<Color>> {
    let mut colors = self.catalog.list_colors().await?;
    colors.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(colors)
  }

  pub async fn list_product_colors(&self, product_id: Uuid) -> StoreResult<Vec<ProductColorOption>> {
    let options = self.catalog.list_product_colors(product_id).await?;
    Ok(order_product_colors(options))
  }

  /// The color preselected on the product detail view.
  pub async fn default_color(&self, product_id: Uuid) -> StoreResult<Option<ProductColorOption>> {
    Ok(self.list_product_colors(product_id).await?.into_iter().next())
  }

  pub async fn images_for_color(
    &self,
    product_id: Uuid,
    product_color_id: Option<Uuid>,
  ) -> StoreResult<Vec<ProductImage>> {
    let images = self.catalog.list_product_images(product_id).await?;
    Ok(select_images(&images, product_color_id))
  }

  /// Color-specific images, else the general gallery, else nothing.
  #[instrument(name = "VariantResolver::gallery_for_color", skip(self))]
  pub async fn gallery_for_color(&self, product_id: Uuid, product_color_id: Option<Uuid>) -> StoreResult<Gallery> {
    let images = self.catalog.list_product_images(product_id).await?;

    if product_color_id.is_some() {
      let specific = select_images(&images, product_color_id);
      if !specific.is_empty() {
        return Ok(Gallery {
          source: GallerySource::Color,
          images: specific,
        });
      }
      debug!("No images for this color; falling back to the general gallery.");
    }

    let general = select_images(&images, None);
    let source = if general.is_empty() {
      GallerySource::Empty
    } else {
      GallerySource::General
    };
    Ok(Gallery {
      source,
      images: general,
    })
  }
}
