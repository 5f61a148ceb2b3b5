//! Bazaar Core - Shared types and cart state.
//!
//! This crate provides the pieces every Bazaar component agrees on:
//! - `storefront` - API gateway, auth session and checkout flow
//! - `cli` - Command-line front end over the storefront library
//!
//! # Architecture
//!
//! The core crate contains types, the cart store and the storage port it
//! persists through - no HTTP clients, no filesystem access. Concrete
//! storage backends live next to the code that owns the I/O.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, prices, emails, and statuses
//! - [`cart`] - Line items, derived totals, and the persisted cart store
//! - [`storage`] - Key-value persistence port and an in-memory implementation

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod storage;
pub mod types;

pub use cart::{CartLineItem, CartState, CartStore, ProductSnapshot};
pub use storage::{KeyValueStore, MemoryStore, StorageError};
pub use types::*;
