//! Shopping cart state.
//!
//! A cart is an ordered list of line items, unique by product. Each line
//! item carries a snapshot of the product taken when it was first added, so
//! later catalog price changes never touch items already in the cart.
//! Totals are derived from the items on every call and are never stored.
//!
//! [`CartStore`] wraps a [`CartState`] together with a
//! [`KeyValueStore`](crate::storage::KeyValueStore) and persists after every
//! mutation.

mod store;

pub use store::CartStore;

use serde::{Deserialize, Serialize};

use crate::types::{Price, ProductId};

/// Product fields copied into the cart at add time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSnapshot {
    pub product_id: ProductId,
    pub name: String,
    pub unit_price: Price,
    pub image: Option<String>,
}

/// One product-and-quantity pair in a cart.
///
/// `quantity` is always at least 1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineItem {
    product_id: ProductId,
    name: String,
    unit_price: Price,
    image: Option<String>,
    quantity: u32,
}

impl CartLineItem {
    fn new(product: ProductSnapshot, quantity: u32) -> Self {
        Self {
            product_id: product.product_id,
            name: product.name,
            unit_price: product.unit_price,
            image: product.image,
            quantity: quantity.max(1),
        }
    }

    #[must_use]
    pub const fn product_id(&self) -> ProductId {
        self.product_id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn unit_price(&self) -> Price {
        self.unit_price
    }

    #[must_use]
    pub fn image(&self) -> Option<&str> {
        self.image.as_deref()
    }

    #[must_use]
    pub const fn quantity(&self) -> u32 {
        self.quantity
    }

    /// `unit_price × quantity`.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.unit_price.line_total(self.quantity)
    }
}

/// The contents of a cart.
///
/// Serializes as `{ "items": [ ... ] }`, the shape persisted under
/// [`CART_KEY`](crate::storage::CART_KEY).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CartState {
    items: Vec<CartLineItem>,
}

impl CartState {
    /// An empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Rebuild a cart from a persisted snapshot.
    ///
    /// The snapshot is normalized: zero quantities are dropped and repeated
    /// products are merged into their first occurrence.
    ///
    /// # Errors
    ///
    /// Returns an error if `json` is not a valid cart snapshot.
    pub fn from_snapshot(json: &str) -> Result<Self, serde_json::Error> {
        let raw: Self = serde_json::from_str(json)?;
        Ok(raw.normalized())
    }

    /// Serialize the cart into its persisted snapshot form.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_snapshot(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Line items in insertion order.
    #[must_use]
    pub fn items(&self) -> &[CartLineItem] {
        &self.items
    }

    /// The line item for `product_id`, if present.
    #[must_use]
    pub fn get(&self, product_id: ProductId) -> Option<&CartLineItem> {
        self.items.iter().find(|item| item.product_id == product_id)
    }

    /// Sum of quantities over all line items.
    #[must_use]
    pub fn total_item_count(&self) -> u64 {
        self.items.iter().map(|item| u64::from(item.quantity)).sum()
    }

    /// Sum of `unit_price × quantity` over all line items.
    #[must_use]
    pub fn total_price(&self) -> Price {
        self.items.iter().map(CartLineItem::line_total).sum()
    }

    /// Number of distinct products in the cart.
    #[must_use]
    pub fn line_count(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub(crate) fn add(&mut self, product: ProductSnapshot, quantity: u32) {
        let quantity = quantity.max(1);

        match self.position(product.product_id) {
            Some(index) => {
                if let Some(item) = self.items.get_mut(index) {
                    item.quantity = item.quantity.saturating_add(quantity);
                }
            }
            None => self.items.push(CartLineItem::new(product, quantity)),
        }
    }

    pub(crate) fn remove(&mut self, product_id: ProductId) -> bool {
        let before = self.items.len();
        self.items.retain(|item| item.product_id != product_id);
        self.items.len() != before
    }

    pub(crate) fn set_quantity(&mut self, product_id: ProductId, quantity: u32) -> bool {
        if quantity == 0 {
            return self.remove(product_id);
        }

        match self.items.iter_mut().find(|item| item.product_id == product_id) {
            Some(item) => {
                item.quantity = quantity;
                true
            }
            None => false,
        }
    }

    pub(crate) fn clear(&mut self) {
        self.items.clear();
    }

    fn position(&self, product_id: ProductId) -> Option<usize> {
        self.items
            .iter()
            .position(|item| item.product_id == product_id)
    }

    fn normalized(self) -> Self {
        let mut merged: Vec<CartLineItem> = Vec::with_capacity(self.items.len());

        for item in self.items.into_iter().filter(|item| item.quantity > 0) {
            match merged
                .iter_mut()
                .find(|existing| existing.product_id == item.product_id)
            {
                Some(existing) => {
                    existing.quantity = existing.quantity.saturating_add(item.quantity);
                }
                None => merged.push(item),
            }
        }

        Self { items: merged }
    }
}
