//! Authentication error types.

use thiserror::Error;

use crate::api::ApiError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] bazaar_core::EmailError),

    /// Password and confirmation differ.
    #[error("passwords do not match")]
    PasswordMismatch,

    /// The API rejected the username/password pair.
    #[error("invalid credentials: {0}")]
    InvalidCredentials(String),

    /// The operation needs a signed-in user.
    #[error("not signed in")]
    NotAuthenticated,

    /// The stored token was rejected; the session has been signed out.
    #[error("session expired")]
    SessionExpired,

    /// API request failed.
    #[error("api error: {0}")]
    Api(#[from] ApiError),
}
