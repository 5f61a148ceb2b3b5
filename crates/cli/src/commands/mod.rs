//! Command implementations.
//!
//! Every command renders to a `std::io::Write` sink so output can be
//! captured in tests.

pub mod account;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod orders;

use bazaar_storefront::AppError;
use bazaar_storefront::api::ApiError;
use bazaar_storefront::services::auth::AuthError;
use bazaar_storefront::services::checkout::CheckoutError;
use thiserror::Error;

/// Errors a command can end with.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    App(#[from] AppError),

    /// Writing to the terminal failed.
    #[error("output error: {0}")]
    Output(#[from] std::io::Error),
}

impl CliError {
    pub fn user_message(&self) -> String {
        match self {
            Self::App(err) => err.user_message(),
            Self::Output(err) => format!("Could not write output: {err}"),
        }
    }

    pub const fn requires_login(&self) -> bool {
        matches!(self, Self::App(err) if err.requires_login())
    }
}

impl From<ApiError> for CliError {
    fn from(err: ApiError) -> Self {
        Self::App(err.into())
    }
}

impl From<AuthError> for CliError {
    fn from(err: AuthError) -> Self {
        Self::App(err.into())
    }
}

impl From<CheckoutError> for CliError {
    fn from(err: CheckoutError) -> Self {
        Self::App(err.into())
    }
}
