// storefront/src/services/tags.rs

//! Free-form product tags: read alongside products, set by the admin side.

use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::models::Tag;
use crate::store::{CatalogStore, StoreResult};

#[derive(Clone)]
pub struct TagService {
  catalog: Arc<dyn CatalogStore>,
}

impl TagService {
  pub fn new(catalog: Arc<dyn CatalogStore>) -> Self {
    Self { catalog }
  }

  /// Tags of each listed product, by name. Untagged products are absent.
  pub async fn tags_by_product(&self, product_ids: &[Uuid]) -> StoreResult<HashMap<Uuid, Vec<Tag>>> {
    if product_ids.is_empty() {
      return Ok(HashMap::new());
    }
    let mut grouped: HashMap<Uuid, Vec<Tag>> = HashMap::new();
    for row in self.catalog.list_product_tags(product_ids).await? {
      grouped.entry(row.product_id).or_default().push(row.tag);
    }
    for tags in grouped.values_mut() {
      tags.sort_by(|a, b| a.name.cmp(&b.name));
    }
    Ok(grouped)
  }

  pub async fn tags_for(&self, product_id: Uuid) -> StoreResult<Vec<Tag>> {
    Ok(self.tags_by_product(&[product_id]).await?.remove(&product_id).unwrap_or_default())
  }

  /// Makes `names` the product's whole tag set. Names are trimmed, blanks
  /// dropped and repeats collapsed; unknown names become new tags.
  #[instrument(name = "TagService::set_product_tags", skip(self, names), fields(requested = names.len()))]
  pub async fn set_product_tags(&self, product_id: Uuid, names: &[String]) -> StoreResult<Vec<Tag>> {
    let mut wanted: Vec<&str> = Vec::with_capacity(names.len());
    for name in names.iter().map(|n| n.trim()).filter(|n| !n.is_empty()) {
      if !wanted.contains(&name) {
        wanted.push(name);
      }
    }

    let mut tags = Vec::with_capacity(wanted.len());
    for name in wanted {
      tags.push(self.catalog.ensure_tag(name).await?);
    }
    let tag_ids: Vec<Uuid> = tags.iter().map(|t| t.id).collect();
    self.catalog.replace_product_tags(product_id, &tag_ids).await?;

    tags.sort_by(|a, b| a.name.cmp(&b.name));
    info!(%product_id, count = tags.len(), "Product tags replaced.");
    Ok(tags)
  }
}
