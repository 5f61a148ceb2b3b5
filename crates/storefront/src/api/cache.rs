//! Cache types for catalog responses.

use bazaar_core::ProductId;

use crate::models::{Category, Product};

/// Cache key for catalog lookups.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub enum CacheKey {
    Categories,
    Product(ProductId),
}

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Categories(Vec<Category>),
    Product(Box<Product>),
}
