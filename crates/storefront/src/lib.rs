//! Bazaar Storefront library.
//!
//! Everything the storefront front end needs besides the cart itself:
//! the REST API gateway, the auth session, the checkout flow, the
//! file-backed storage the session and cart persist into, and the
//! configuration tying them together.
//!
//! # Architecture
//!
//! - [`api::ApiClient`] talks to the shop API over `reqwest` and attaches
//!   the session credential to every request
//! - [`services::auth::AuthSession`] owns the credential and current user
//! - [`services::checkout`] turns a cart into an order
//! - [`state::AppState`] is the application root that owns all of the above
//!   plus the [`bazaar_core::CartStore`]

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod state;
pub mod storage;

pub use error::{AppError, Result};
