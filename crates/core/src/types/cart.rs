//! Cart line items and cart state snapshots.
//!
//! [`CartState`] is an immutable value: every mutation returns a new
//! snapshot and leaves the receiver untouched. The store layer commits
//! snapshots and persists them; nothing in this module performs I/O.
//!
//! # Invariants
//!
//! - At most one [`CartItem`] per [`ProductId`].
//! - Every item has a quantity of at least 1. Decrementing a line with a
//!   single unit removes it.
//! - Insertion order is preserved for stable display.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::id::ProductId;
use super::price::{Price, PriceError};
use super::quantity::Quantity;

/// Errors from cart state mutations.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CartStateError {
    /// No line exists for the product.
    #[error("item not found in cart: {0}")]
    ItemNotFound(ProductId),
    /// Two lines share the same product ID.
    #[error("duplicate cart item: {0}")]
    DuplicateItem(ProductId),
}

/// Product descriptor supplied when adding to the cart.
///
/// Same shape as [`CartItem`] without the quantity, which is implied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartProduct {
    /// Catalog key.
    pub id: ProductId,
    /// Display name.
    pub title: String,
    /// Image reference.
    #[serde(alias = "imageUrl")]
    pub image_url: String,
    /// Unit price.
    pub price: Price,
}

impl CartProduct {
    /// Create a new product descriptor.
    #[must_use]
    pub fn new(
        id: ProductId,
        title: impl Into<String>,
        image_url: impl Into<String>,
        price: Price,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            image_url: image_url.into(),
            price,
        }
    }
}

/// One product line in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    /// Catalog key.
    pub id: ProductId,
    /// Display name.
    pub title: String,
    /// Image reference.
    #[serde(alias = "imageUrl")]
    pub image_url: String,
    /// Unit price.
    pub price: Price,
    /// Units in the cart.
    pub quantity: Quantity,
}

impl CartItem {
    /// Line total (unit price times quantity).
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::Overflow`] if the total is out of range.
    pub fn line_total(&self) -> Result<Price, PriceError> {
        self.price.checked_mul(self.quantity.get())
    }
}

impl From<CartProduct> for CartItem {
    fn from(product: CartProduct) -> Self {
        Self {
            id: product.id,
            title: product.title,
            image_url: product.image_url,
            price: product.price,
            quantity: Quantity::ONE,
        }
    }
}

/// Ordered snapshot of the cart contents.
///
/// Serializes as a JSON array of [`CartItem`] records. Deserialization
/// rejects duplicate IDs, and [`Quantity`]/[`Price`] reject zero counts and
/// negative prices, so any parsed snapshot upholds the module invariants.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "Vec<CartItem>", into = "Vec<CartItem>")]
pub struct CartState {
    items: Vec<CartItem>,
}

impl CartState {
    /// Create an empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Build a snapshot from items, checking for duplicate IDs.
    ///
    /// # Errors
    ///
    /// Returns [`CartStateError::DuplicateItem`] if two items share an ID.
    pub fn from_items(items: Vec<CartItem>) -> Result<Self, CartStateError> {
        let mut seen = HashSet::with_capacity(items.len());
        for item in &items {
            if !seen.insert(&item.id) {
                return Err(CartStateError::DuplicateItem(item.id.clone()));
            }
        }
        Ok(Self { items })
    }

    /// Parse a persisted snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not a JSON array of valid cart items.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Serialize the snapshot for persistence.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.items)
    }

    /// Items in display order.
    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    /// Number of distinct lines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Look up the line for a product.
    #[must_use]
    pub fn get(&self, id: &ProductId) -> Option<&CartItem> {
        self.items.iter().find(|item| &item.id == id)
    }

    /// Total units across all lines.
    #[must_use]
    pub fn total_quantity(&self) -> u64 {
        self.items
            .iter()
            .map(|item| u64::from(item.quantity.get()))
            .sum()
    }

    /// Sum of all line totals.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::Overflow`] if any line or the sum is out of range.
    pub fn subtotal(&self) -> Result<Price, PriceError> {
        self.items
            .iter()
            .try_fold(Price::ZERO, |total, item| total.checked_add(item.line_total()?))
    }

    /// Add one unit of `product`.
    ///
    /// An existing line for the same ID gains one unit and keeps its original
    /// title, image and price; the supplied descriptor is discarded. Otherwise
    /// the product is appended with a quantity of 1.
    #[must_use]
    pub fn with_added(&self, product: CartProduct) -> Self {
        let mut items = self.items.clone();
        match items.iter_mut().find(|item| item.id == product.id) {
            Some(existing) => existing.quantity = existing.quantity.incremented(),
            None => items.push(CartItem::from(product)),
        }
        Self { items }
    }

    /// Add one unit to an existing line.
    ///
    /// # Errors
    ///
    /// Returns [`CartStateError::ItemNotFound`] if no line has this ID.
    pub fn with_incremented(&self, id: &ProductId) -> Result<Self, CartStateError> {
        let index = self.position(id)?;
        let mut items = self.items.clone();
        if let Some(item) = items.get_mut(index) {
            item.quantity = item.quantity.incremented();
        }
        Ok(Self { items })
    }

    /// Remove one unit from an existing line, dropping the line at zero.
    ///
    /// # Errors
    ///
    /// Returns [`CartStateError::ItemNotFound`] if no line has this ID.
    pub fn with_decremented(&self, id: &ProductId) -> Result<Self, CartStateError> {
        let index = self.position(id)?;
        let mut items = self.items.clone();
        match items.get(index).and_then(|item| item.quantity.decremented()) {
            Some(quantity) => {
                if let Some(item) = items.get_mut(index) {
                    item.quantity = quantity;
                }
            }
            None => {
                items.remove(index);
            }
        }
        Ok(Self { items })
    }

    fn position(&self, id: &ProductId) -> Result<usize, CartStateError> {
        self.items
            .iter()
            .position(|item| &item.id == id)
            .ok_or_else(|| CartStateError::ItemNotFound(id.clone()))
    }
}

impl TryFrom<Vec<CartItem>> for CartState {
    type Error = CartStateError;

    fn try_from(items: Vec<CartItem>) -> Result<Self, Self::Error> {
        Self::from_items(items)
    }
}

impl From<CartState> for Vec<CartItem> {
    fn from(state: CartState) -> Self {
        state.items
    }
}

impl<'a> IntoIterator for &'a CartState {
    type Item = &'a CartItem;
    type IntoIter = std::slice::Iter<'a, CartItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
