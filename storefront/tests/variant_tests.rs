// tests/variant_tests.rs

mod common;
use common::*;

use rust_decimal_macros::dec;
use serial_test::serial;
use std::sync::Arc;
use uuid::Uuid;

use storefront::admin::catalog::{renumber_display_order, save_product_variants, ColorDraft, ImageDraft, VariantError};
use storefront::models::{NewProductColor, NewProductImage};
use storefront::services::{GallerySource, VariantResolver};
use storefront::store::{CatalogStore, MemoryStore};

async fn seeded_store() -> (Arc<MemoryStore>, Uuid) {
  let store = Arc::new(MemoryStore::new());
  let sweater = product("Cable Knit Sweater", dec!(1500), 1);
  let id = sweater.id;
  store.add_product(sweater);
  (store, id)
}

fn draft(color_id: Uuid, is_default: bool) -> NewProductColor {
  NewProductColor {
    color_id,
    is_multi_color: true,
    is_default,
  }
}

#[tokio::test]
#[serial]
async fn default_color_comes_first_whatever_the_insert_order() {
  setup_tracing();
  let (store, product_id) = seeded_store().await;
  let blue = store.insert_color("Blue", "#0000ff").await.unwrap();
  let red = store.insert_color("Red", "#ff0000").await.unwrap();
  let green = store.insert_color("Green", "#00ff00").await.unwrap();
  store
    .replace_product_colors(
      product_id,
      vec![draft(blue.id, false), draft(red.id, true), draft(green.id, false)],
    )
    .await
    .unwrap();

  let resolver = VariantResolver::new(store.clone());
  let first = resolver.list_product_colors(product_id).await.unwrap();
  let again = resolver.list_product_colors(product_id).await.unwrap();

  let names: Vec<&str> = first.iter().map(|o| o.color.name.as_str()).collect();
  assert_eq!(names, vec!["Red", "Blue", "Green"]);
  assert_eq!(first, again);
  let default = resolver.default_color(product_id).await.unwrap().unwrap();
  assert_eq!(default.color.id, red.id);
}

#[tokio::test]
#[serial]
async fn without_a_default_the_lowest_name_wins_case_insensitively() {
  setup_tracing();
  let (store, product_id) = seeded_store().await;
  let beige = store.insert_color("beige", "#f5f5dc").await.unwrap();
  let azure = store.insert_color("Azure", "#007fff").await.unwrap();
  let crimson = store.insert_color("crimson", "#dc143c").await.unwrap();
  store
    .replace_product_colors(
      product_id,
      vec![draft(beige.id, false), draft(crimson.id, false), draft(azure.id, false)],
    )
    .await
    .unwrap();

  let resolver = VariantResolver::new(store.clone());
  let default = resolver.default_color(product_id).await.unwrap().unwrap();
  assert_eq!(default.color.name, "Azure");
}

#[tokio::test]
#[serial]
async fn product_without_colors_has_no_default() {
  setup_tracing();
  let (store, product_id) = seeded_store().await;
  let resolver = VariantResolver::new(store);

  assert!(resolver.list_product_colors(product_id).await.unwrap().is_empty());
  assert_eq!(resolver.default_color(product_id).await.unwrap(), None);
}

#[tokio::test]
#[serial]
async fn gallery_prefers_color_images_then_general_then_empty() {
  setup_tracing();
  let (store, product_id) = seeded_store().await;
  let red = store.insert_color("Red", "#ff0000").await.unwrap();
  let blue = store.insert_color("Blue", "#0000ff").await.unwrap();
  let rows = store
    .replace_product_colors(product_id, vec![draft(red.id, true), draft(blue.id, false)])
    .await
    .unwrap();
  let red_pc = rows.iter().find(|pc| pc.color_id == red.id).unwrap().id;
  let blue_pc = rows.iter().find(|pc| pc.color_id == blue.id).unwrap().id;

  store
    .replace_product_images(
      product_id,
      vec![
        NewProductImage {
          image_url: "red-2.jpg".to_string(),
          order: 3,
          product_color_id: Some(red_pc),
        },
        NewProductImage {
          image_url: "red-1.jpg".to_string(),
          order: 2,
          product_color_id: Some(red_pc),
        },
        NewProductImage {
          image_url: "general.jpg".to_string(),
          order: 1,
          product_color_id: None,
        },
      ],
    )
    .await
    .unwrap();

  let resolver = VariantResolver::new(store.clone());

  let red_gallery = resolver.gallery_for_color(product_id, Some(red_pc)).await.unwrap();
  assert_eq!(red_gallery.source, GallerySource::Color);
  let urls: Vec<&str> = red_gallery.images.iter().map(|i| i.image_url.as_str()).collect();
  assert_eq!(urls, vec!["red-1.jpg", "red-2.jpg"]);

  let blue_gallery = resolver.gallery_for_color(product_id, Some(blue_pc)).await.unwrap();
  assert_eq!(blue_gallery.source, GallerySource::General);
  assert_eq!(blue_gallery.images.len(), 1);
  assert_eq!(blue_gallery.images[0].image_url, "general.jpg");

  let blue_only = resolver.images_for_color(product_id, Some(blue_pc)).await.unwrap();
  assert!(blue_only.is_empty());

  store.replace_product_images(product_id, vec![]).await.unwrap();
  let empty = resolver.gallery_for_color(product_id, Some(blue_pc)).await.unwrap();
  assert_eq!(empty.source, GallerySource::Empty);
  assert!(empty.images.is_empty());
}

#[tokio::test]
#[serial]
async fn replacing_colors_nulls_image_associations() {
  setup_tracing();
  let (store, product_id) = seeded_store().await;
  let red = store.insert_color("Red", "#ff0000").await.unwrap();
  let rows = store
    .replace_product_colors(product_id, vec![draft(red.id, true)])
    .await
    .unwrap();
  store
    .replace_product_images(
      product_id,
      vec![NewProductImage {
        image_url: "red.jpg".to_string(),
        order: 1,
        product_color_id: Some(rows[0].id),
      }],
    )
    .await
    .unwrap();

  store.replace_product_colors(product_id, vec![]).await.unwrap();

  let images = store.list_product_images(product_id).await.unwrap();
  assert_eq!(images.len(), 1);
  assert!(images[0].is_general());
}

#[tokio::test]
#[serial]
async fn list_colors_is_sorted_and_names_are_unique() {
  setup_tracing();
  let (store, _) = seeded_store().await;
  store.insert_color("Navy", "#000080").await.unwrap();
  store.insert_color("Beige", "#f5f5dc").await.unwrap();
  assert!(store.insert_color("Navy", "#000081").await.is_err());

  let resolver = VariantResolver::new(store);
  let names: Vec<String> = resolver.list_colors().await.unwrap().into_iter().map(|c| c.name).collect();
  assert_eq!(names, vec!["Beige", "Navy"]);
}

#[tokio::test]
#[serial]
async fn saving_variants_marks_first_color_default_and_maps_images() {
  setup_tracing();
  let (store, product_id) = seeded_store().await;
  let grey = store.insert_color("Grey", "#808080").await.unwrap();
  let black = store.insert_color("Black", "#000000").await.unwrap();

  let saved = save_product_variants(
    store.as_ref(),
    product_id,
    vec![
      ColorDraft {
        color_id: grey.id,
        is_default: false,
      },
      ColorDraft {
        color_id: black.id,
        is_default: false,
      },
    ],
    vec![
      ImageDraft {
        image_url: "grey.jpg".to_string(),
        order: 1,
        color_id: Some(grey.id),
      },
      ImageDraft {
        image_url: "any.jpg".to_string(),
        order: 2,
        color_id: None,
      },
    ],
  )
  .await
  .unwrap();

  assert_eq!(saved.colors.len(), 2);
  assert!(saved.colors.iter().all(|pc| pc.is_multi_color));
  let grey_row = saved.colors.iter().find(|pc| pc.color_id == grey.id).unwrap();
  assert!(grey_row.is_default);
  assert_eq!(saved.colors.iter().filter(|pc| pc.is_default).count(), 1);

  let grey_image = saved.images.iter().find(|i| i.image_url == "grey.jpg").unwrap();
  assert_eq!(grey_image.product_color_id, Some(grey_row.id));
  let general = saved.images.iter().find(|i| i.image_url == "any.jpg").unwrap();
  assert!(general.is_general());

  let resolver = VariantResolver::new(store.clone());
  let default = resolver.default_color(product_id).await.unwrap().unwrap();
  assert_eq!(default.color.name, "Grey");
}

#[tokio::test]
#[serial]
async fn saving_variants_rejects_two_defaults_before_writing() {
  setup_tracing();
  let (store, product_id) = seeded_store().await;
  let grey = store.insert_color("Grey", "#808080").await.unwrap();
  let black = store.insert_color("Black", "#000000").await.unwrap();
  let calls_before = store.call_count();

  let result = save_product_variants(
    store.as_ref(),
    product_id,
    vec![
      ColorDraft {
        color_id: grey.id,
        is_default: true,
      },
      ColorDraft {
        color_id: black.id,
        is_default: true,
      },
    ],
    vec![],
  )
  .await;

  assert!(matches!(result, Err(VariantError::Invalid(_))));
  assert_eq!(store.call_count(), calls_before);
}

#[tokio::test]
#[serial]
async fn renumbering_compacts_display_order() {
  setup_tracing();
  let store = Arc::new(MemoryStore::new());
  let a = product("A", dec!(100), 3);
  let b = product("B", dec!(100), 7);
  let c = product("C", dec!(100), 10);
  for p in [&c, &a, &b] {
    store.add_product(p.clone());
  }

  let changed = renumber_display_order(store.as_ref()).await.unwrap();
  assert_eq!(changed.len(), 3);

  let orders: Vec<(String, i32)> = store
    .list_products()
    .await
    .unwrap()
    .into_iter()
    .map(|p| (p.name, p.display_order))
    .collect();
  assert_eq!(
    orders,
    vec![("A".to_string(), 1), ("B".to_string(), 2), ("C".to_string(), 3)]
  );

  assert!(renumber_display_order(store.as_ref()).await.unwrap().is_empty());
}
