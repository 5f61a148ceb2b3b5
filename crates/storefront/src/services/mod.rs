//! Storefront services built on the API client.
//!
//! # Services
//!
//! - `auth` - Sign in/out, registration, profile, and the persisted token
//! - `checkout` - Placing orders from the cart and cancelling them

pub mod auth;
pub mod checkout;
