// storefront/src/services/cart.rs

//! The device-local cart. Lines are keyed by (product, color name) and the
//! whole ledger is written back to local storage after every mutation.

use parking_lot::Mutex;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::{CartImage, CartLineItem, OrderItem};
use crate::storage::{LocalStorage, StorageError, CART_STORAGE_KEY};

#[derive(Debug, Error)]
pub enum CartError {
  #[error("quantity must be between 1 and {max}")]
  InvalidQuantity { max: u32 },

  #[error("could not persist cart: {0}")]
  Storage(#[from] StorageError),
}

impl From<CartError> for AppError {
  fn from(err: CartError) -> Self {
    match err {
      CartError::InvalidQuantity { .. } => AppError::Validation(err.to_string()),
      CartError::Storage(e) => AppError::Storage(e),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CartTotals {
  pub item_count: u64,
  /// Rounded to two places for display.
  pub grand_total: Decimal,
}

/// Largest quantity one line may hold; it must fit an order item's quantity column.
pub const MAX_LINE_QTY: u32 = i32::MAX as u32;

/// A cart shared between request handlers and the checkout.
pub type SharedCart = Arc<Mutex<CartLedger>>;

pub struct CartLedger {
  lines: Vec<CartLineItem>,
  storage: Arc<dyn LocalStorage>,
}

impl CartLedger {
  /// Loads the persisted cart. Anything that does not parse as the current
  /// line shape is dropped as a whole and the cart starts empty.
  pub fn load(storage: Arc<dyn LocalStorage>) -> Self {
    let raw = match storage.get_item(CART_STORAGE_KEY) {
      Ok(raw) => raw,
      Err(e) => {
        warn!(error = %e, "Could not read persisted cart; starting empty.");
        None
      }
    };

    let lines = match raw.as_deref().map(serde_json::from_str::<Vec<CartLineItem>>) {
      None => Vec::new(),
      Some(Ok(lines)) if lines.iter().all(|l| (1..=MAX_LINE_QTY).contains(&l.qty)) => lines,
      Some(Ok(_)) | Some(Err(_)) => {
        warn!("Persisted cart is corrupt or outdated; discarding it.");
        if let Err(e) = storage.remove_item(CART_STORAGE_KEY) {
          warn!(error = %e, "Could not remove discarded cart.");
        }
        Vec::new()
      }
    };
    debug!(lines = lines.len(), "Cart loaded.");
    Self { lines, storage }
  }

  pub fn shared(self) -> SharedCart {
    Arc::new(Mutex::new(self))
  }

  pub fn lines(&self) -> &[CartLineItem] {
    &self.lines
  }

  pub fn is_empty(&self) -> bool {
    self.lines.is_empty()
  }

  /// Adds `qty` of (product, color), merging into an existing line.
  /// `color` is the color name, or `""` when none was chosen. A merge that
  /// would push the line past [`MAX_LINE_QTY`] is rejected and the cart is
  /// left as it was.
  pub fn add(
    &mut self,
    product_id: Uuid,
    title: &str,
    qty: u32,
    color: &str,
    unit_price: Decimal,
    images: Vec<CartImage>,
  ) -> Result<(), CartError> {
    let invalid = CartError::InvalidQuantity { max: MAX_LINE_QTY };
    if qty == 0 || qty > MAX_LINE_QTY {
      return Err(invalid);
    }
    let mut next = self.lines.clone();
    match next.iter_mut().find(|l| l.matches(product_id, color)) {
      Some(line) => {
        line.qty = line
          .qty
          .checked_add(qty)
          .filter(|merged| *merged <= MAX_LINE_QTY)
          .ok_or(invalid)?;
      }
      None => next.push(CartLineItem {
        product_id,
        title: title.to_string(),
        qty,
        color: color.to_string(),
        price: unit_price,
        product_images: images,
      }),
    }
    self.commit(next)?;
    info!(%product_id, color, qty, "Cart line added.");
    Ok(())
  }

  /// Removes the line at `index`. Out of range is a no-op returning `None`.
  pub fn remove(&mut self, index: usize) -> Result<Option<CartLineItem>, CartError> {
    if index >= self.lines.len() {
      return Ok(None);
    }
    let mut next = self.lines.clone();
    let removed = next.remove(index);
    self.commit(next)?;
    Ok(Some(removed))
  }

  /// Takes what an order bought out of the cart: each item's quantity comes
  /// off the matching (product, color) line, and lines that reach zero go.
  /// Lines the order did not include stay untouched.
  pub fn remove_ordered(&mut self, ordered: &[OrderItem]) -> Result<(), CartError> {
    let mut next = self.lines.clone();
    for item in ordered {
      let bought = u32::try_from(item.quantity).unwrap_or(0);
      if let Some(line) = next.iter_mut().find(|l| l.matches(item.product_id, &item.product_color)) {
        line.qty = line.qty.saturating_sub(bought);
      }
    }
    next.retain(|l| l.qty > 0);
    let removed = self.lines.len() - next.len();
    self.commit(next)?;
    debug!(removed, remaining = self.lines.len(), "Ordered lines taken out of the cart.");
    Ok(())
  }

  pub fn totals(&self, rate: Decimal) -> CartTotals {
    let item_count = self.lines.iter().map(|l| u64::from(l.qty)).sum();
    let grand_total: Decimal = self.lines.iter().map(|l| l.line_total(rate)).sum();
    CartTotals {
      item_count,
      grand_total: grand_total.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero),
    }
  }

  pub fn clear(&mut self) -> Result<(), CartError> {
    self.commit(Vec::new())
  }

  /// Persists `next` and only then makes it the cart's contents.
  fn commit(&mut self, next: Vec<CartLineItem>) -> Result<(), CartError> {
    let encoded = serde_json::to_string(&next).map_err(StorageError::from)?;
    self.storage.set_item(CART_STORAGE_KEY, &encoded)?;
    self.lines = next;
    Ok(())
  }
}
