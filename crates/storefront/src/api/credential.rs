//! Shared credential cell.

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use secrecy::SecretString;

/// The current API token, shared between the gateway (reader) and the auth
/// session (writer).
///
/// Cloning yields another handle to the same cell.
#[derive(Clone, Default)]
pub struct CredentialSlot {
    token: Arc<RwLock<Option<SecretString>>>,
}

impl CredentialSlot {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The token to attach to outgoing requests, if any.
    #[must_use]
    pub fn current(&self) -> Option<SecretString> {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn set(&self, token: SecretString) {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = Some(token);
    }

    pub fn clear(&self) {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    #[must_use]
    pub fn is_set(&self) -> bool {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}

impl fmt::Debug for CredentialSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialSlot")
            .field("set", &self.is_set())
            .finish()
    }
}
