//! Unified error handling.
//!
//! Provides a unified `AppError` type for everything the storefront library
//! can fail with. Front ends show [`AppError::user_message`] and keep the
//! `Display` text for logs.

use bazaar_core::StorageError;
use thiserror::Error;

use crate::api::ApiError;
use crate::config::ConfigError;
use crate::services::auth::AuthError;
use crate::services::checkout::CheckoutError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration could not be loaded.
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Shop API operation failed.
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Checkout operation failed.
    #[error("Checkout error: {0}")]
    Checkout(#[from] CheckoutError),

    /// State directory could not be used.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl AppError {
    /// Whether signing in (again) would fix this error.
    #[must_use]
    pub const fn requires_login(&self) -> bool {
        matches!(
            self,
            Self::Api(ApiError::Unauthorized(_))
                | Self::Auth(
                    AuthError::NotAuthenticated
                        | AuthError::SessionExpired
                        | AuthError::Api(ApiError::Unauthorized(_))
                )
                | Self::Checkout(
                    CheckoutError::NotAuthenticated | CheckoutError::Api(ApiError::Unauthorized(_))
                )
        )
    }

    /// Whether the API refused the held token.
    #[must_use]
    pub const fn is_token_rejected(&self) -> bool {
        matches!(
            self,
            Self::Api(ApiError::Unauthorized(_))
                | Self::Auth(AuthError::Api(ApiError::Unauthorized(_)))
                | Self::Checkout(CheckoutError::Api(ApiError::Unauthorized(_)))
        )
    }

    /// Message safe to show to the user.
    ///
    /// Transport and parse details are replaced by a generic message.
    #[must_use]
    pub fn user_message(&self) -> String {
        if self.requires_login() {
            return match self {
                Self::Auth(AuthError::SessionExpired) => {
                    "Your session has expired. Please sign in again.".to_string()
                }
                _ => "Please sign in to continue.".to_string(),
            };
        }

        match self {
            Self::Config(err) => err.to_string(),
            Self::Api(err) | Self::Auth(AuthError::Api(err)) | Self::Checkout(CheckoutError::Api(err)) => {
                api_message(err)
            }
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials(_) => {
                    "Invalid username or password.".to_string()
                }
                AuthError::InvalidEmail(_) => "Invalid email address.".to_string(),
                AuthError::PasswordMismatch => "Passwords do not match.".to_string(),
                _ => "Authentication error.".to_string(),
            },
            Self::Checkout(err) => match err {
                CheckoutError::EmptyCart => "Your cart is empty.".to_string(),
                CheckoutError::InvalidShipping(reason) => {
                    format!("Please check your shipping details: {reason}.")
                }
                CheckoutError::NotCancellable(status) => {
                    format!("This order is {status} and can no longer be cancelled.")
                }
                _ => "Checkout failed.".to_string(),
            },
            Self::Storage(_) => "Could not save local state.".to_string(),
        }
    }
}

fn api_message(err: &ApiError) -> String {
    match err {
        ApiError::Http(_) | ApiError::InvalidUrl(_) => "Could not reach the shop.".to_string(),
        ApiError::Parse(_) | ApiError::MissingToken => {
            "The shop sent an unexpected response.".to_string()
        }
        ApiError::RateLimited(secs) => {
            format!("Too many requests. Try again in {secs} seconds.")
        }
        ApiError::NotFound(_) => "Not found.".to_string(),
        ApiError::Unauthorized(message) | ApiError::Status { message, .. } => message.clone(),
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;
