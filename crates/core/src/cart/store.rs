//! Persisted cart store.

use tracing::{debug, instrument, warn};

use crate::cart::{CartLineItem, CartState, ProductSnapshot};
use crate::storage::{CART_KEY, KeyValueStore};
use crate::types::{Price, ProductId};

/// Owns the cart and keeps its persisted snapshot in step.
///
/// Construct one per session at the application root and hand it to the
/// views by reference. Every mutation is read-modify-persist inside a single
/// synchronous call. None of them can fail: a storage error is logged and
/// the in-memory cart stays authoritative for the rest of the session.
#[derive(Debug)]
pub struct CartStore<S> {
    state: CartState,
    storage: S,
}

impl<S: KeyValueStore> CartStore<S> {
    /// Open the cart, rehydrating it from `storage` when a snapshot exists.
    ///
    /// A missing snapshot yields an empty cart. So does an unreadable
    /// backend or a corrupt snapshot, after logging a warning.
    #[instrument(skip(storage))]
    pub fn open(storage: S) -> Self {
        let state = match storage.get(CART_KEY) {
            Ok(Some(json)) => CartState::from_snapshot(&json).unwrap_or_else(|e| {
                warn!(error = %e, "Discarding unreadable cart snapshot");
                CartState::new()
            }),
            Ok(None) => CartState::new(),
            Err(e) => {
                warn!(error = %e, "Cart storage unavailable, starting with an empty cart");
                CartState::new()
            }
        };

        debug!(lines = state.line_count(), "Cart opened");

        Self { state, storage }
    }

    /// Add `quantity` units of `product`.
    ///
    /// An existing line item for the product is incremented; otherwise a new
    /// line item is appended. A quantity of 0 counts as 1.
    #[instrument(skip(self, product), fields(product_id = %product.product_id))]
    pub fn add_item(&mut self, product: ProductSnapshot, quantity: u32) -> &CartState {
        self.state.add(product, quantity);
        self.persist();
        &self.state
    }

    /// Add a single unit of `product`.
    pub fn add_one(&mut self, product: ProductSnapshot) -> &CartState {
        self.add_item(product, 1)
    }

    /// Remove the line item for `product_id`. Absent products are ignored.
    #[instrument(skip(self))]
    pub fn remove_item(&mut self, product_id: ProductId) -> &CartState {
        if !self.state.remove(product_id) {
            debug!("Product not in cart");
        }
        self.persist();
        &self.state
    }

    /// Set the quantity for `product_id` to exactly `quantity`.
    ///
    /// A quantity of 0 removes the line item. Absent products are ignored.
    #[instrument(skip(self))]
    pub fn set_quantity(&mut self, product_id: ProductId, quantity: u32) -> &CartState {
        if !self.state.set_quantity(product_id, quantity) {
            debug!("Product not in cart");
        }
        self.persist();
        &self.state
    }

    /// Empty the cart.
    #[instrument(skip(self))]
    pub fn clear(&mut self) -> &CartState {
        self.state.clear();
        self.persist();
        &self.state
    }

    /// The current cart contents.
    #[must_use]
    pub const fn state(&self) -> &CartState {
        &self.state
    }

    #[must_use]
    pub fn items(&self) -> &[CartLineItem] {
        self.state.items()
    }

    #[must_use]
    pub fn total_item_count(&self) -> u64 {
        self.state.total_item_count()
    }

    #[must_use]
    pub fn total_price(&self) -> Price {
        self.state.total_price()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.state.is_empty()
    }

    /// The backing storage.
    #[must_use]
    pub const fn storage(&self) -> &S {
        &self.storage
    }

    /// Give back the backing storage, dropping the in-memory cart.
    #[must_use]
    pub fn into_storage(self) -> S {
        self.storage
    }

    fn persist(&mut self) {
        let snapshot = match self.state.to_snapshot() {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!(error = %e, "Failed to serialize cart snapshot");
                return;
            }
        };

        if let Err(e) = self.storage.set(CART_KEY, &snapshot) {
            warn!(error = %e, "Failed to persist cart, keeping in-memory state");
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::storage::{MemoryStore, StorageError};

    fn product(id: i64, minor: i64) -> ProductSnapshot {
        ProductSnapshot {
            product_id: ProductId::new(id),
            name: format!("Product {id}"),
            unit_price: Price::from_minor(minor),
            image: None,
        }
    }

    /// Storage that rejects every operation.
    #[derive(Debug, Default)]
    struct BrokenStore {
        writes_attempted: usize,
    }

    impl KeyValueStore for BrokenStore {
        fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Err(StorageError::Unavailable("disabled".to_string()))
        }

        fn set(&mut self, _key: &str, _value: &str) -> Result<(), StorageError> {
            self.writes_attempted += 1;
            Err(StorageError::QuotaExceeded)
        }

        fn remove(&mut self, _key: &str) -> Result<(), StorageError> {
            Err(StorageError::Unavailable("disabled".to_string()))
        }
    }

    #[test]
    fn test_scenarios_in_sequence() {
        let mut cart = CartStore::open(MemoryStore::new());
        let a = product(1, 100_00);

        let state = cart.add_item(a.clone(), 2);
        assert_eq!(state.line_count(), 1);
        assert_eq!(state.get(ProductId::new(1)).unwrap().quantity(), 2);
        assert_eq!(state.total_price(), Price::from_minor(200_00));

        let state = cart.add_item(a, 3);
        assert_eq!(state.get(ProductId::new(1)).unwrap().quantity(), 5);
        assert_eq!(state.total_price(), Price::from_minor(500_00));

        let state = cart.set_quantity(ProductId::new(1), 1);
        assert_eq!(state.get(ProductId::new(1)).unwrap().quantity(), 1);
        assert_eq!(state.total_price(), Price::from_minor(100_00));

        let state = cart.remove_item(ProductId::new(1));
        assert!(state.is_empty());
        assert_eq!(state.total_item_count(), 0);
    }

    #[test]
    fn test_repeated_adds_sum_into_one_line() {
        let mut cart = CartStore::open(MemoryStore::new());
        for quantity in [1, 4, 2, 7] {
            cart.add_item(product(9, 1_00), quantity);
        }

        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.items().first().unwrap().quantity(), 14);
        assert_eq!(cart.total_item_count(), 14);
    }

    #[test]
    fn test_add_one_defaults_to_single_unit() {
        let mut cart = CartStore::open(MemoryStore::new());
        cart.add_one(product(1, 5_00));
        cart.add_one(product(1, 5_00));

        assert_eq!(cart.total_item_count(), 2);
    }

    #[test]
    fn test_remove_twice_is_idempotent() {
        let mut cart = CartStore::open(MemoryStore::new());
        cart.add_one(product(1, 1_00));
        cart.add_one(product(2, 2_00));

        let first = cart.remove_item(ProductId::new(1)).clone();
        let second = cart.remove_item(ProductId::new(1)).clone();

        assert_eq!(first, second);
        assert_eq!(second.line_count(), 1);
    }

    #[test]
    fn test_set_quantity_zero_equals_remove() {
        let mut removed = CartStore::open(MemoryStore::new());
        let mut zeroed = CartStore::open(MemoryStore::new());
        for cart in [&mut removed, &mut zeroed] {
            cart.add_item(product(1, 1_00), 3);
            cart.add_item(product(2, 2_00), 1);
        }

        removed.remove_item(ProductId::new(1));
        zeroed.set_quantity(ProductId::new(1), 0);

        assert_eq!(removed.state(), zeroed.state());
        assert_eq!(
            removed.storage().get(CART_KEY).unwrap(),
            zeroed.storage().get(CART_KEY).unwrap()
        );
    }

    #[test]
    fn test_clear_empties_regardless_of_contents() {
        let mut cart = CartStore::open(MemoryStore::new());
        cart.add_one(product(1, 1_00));
        cart.add_one(product(2, 2_00));

        let state = cart.clear();
        assert!(state.is_empty());
        assert_eq!(cart.total_item_count(), 0);
        assert_eq!(cart.total_price(), Price::ZERO);
    }

    #[test]
    fn test_every_mutation_persists() {
        let mut cart = CartStore::open(MemoryStore::new());
        assert_eq!(cart.storage().get(CART_KEY).unwrap(), None);

        cart.add_item(product(1, 2_50), 2);
        let persisted = CartState::from_snapshot(&cart.storage().get(CART_KEY).unwrap().unwrap()).unwrap();
        assert_eq!(&persisted, cart.state());

        cart.clear();
        let persisted = CartState::from_snapshot(&cart.storage().get(CART_KEY).unwrap().unwrap()).unwrap();
        assert!(persisted.is_empty());
    }

    #[test]
    fn test_reopen_restores_cart() {
        let mut cart = CartStore::open(MemoryStore::new());
        cart.add_item(product(1, 19_99), 3);
        cart.add_item(product(2, 5_00), 1);
        let before = cart.state().clone();

        let reopened = CartStore::open(cart.into_storage());

        assert_eq!(reopened.state(), &before);
        assert_eq!(reopened.total_price(), Price::from_minor(64_97));
    }

    #[test]
    fn test_corrupt_snapshot_opens_empty() {
        let mut storage = MemoryStore::new();
        storage.set(CART_KEY, "{ definitely not a cart").unwrap();

        let cart = CartStore::open(storage);

        assert!(cart.is_empty());
        // Left in place until the next write replaces it.
        assert_eq!(
            cart.storage().get(CART_KEY).unwrap().as_deref(),
            Some("{ definitely not a cart")
        );
    }

    #[test]
    fn test_storage_failure_does_not_affect_state() {
        let mut cart = CartStore::open(BrokenStore::default());
        assert!(cart.is_empty());

        cart.add_item(product(1, 10_00), 2);
        cart.add_item(product(2, 1_00), 1);
        cart.set_quantity(ProductId::new(2), 4);

        assert_eq!(cart.total_item_count(), 6);
        assert_eq!(cart.total_price(), Price::from_minor(24_00));
        assert_eq!(cart.storage().writes_attempted, 3);

        cart.clear();
        assert!(cart.is_empty());
    }
}
