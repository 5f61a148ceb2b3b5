//! Shop API resource types.
//!
//! These mirror the JSON the shop API sends and accepts. Identifiers and
//! prices use the newtypes from `bazaar_core`.

pub mod catalog;
pub mod order;
pub mod page;
pub mod user;

pub use catalog::{Category, CategoryRef, Product, ProductFilters};
pub use order::{NewOrder, NewOrderItem, Order, OrderItem, OrderProduct, ShippingError, ShippingInfo};
pub use page::Page;
pub use user::{Credentials, Profile, ProfileUpdate, Registration, UpdatedProfile, User};
