//! Authentication session.
//!
//! Holds the signed-in user and keeps the API token in three places in step:
//! the [`CredentialSlot`](crate::api::CredentialSlot) the gateway reads, the
//! persisted `token` key, and the session itself.

mod error;

pub use error::AuthError;

use bazaar_core::KeyValueStore;
use bazaar_core::storage::TOKEN_KEY;
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, info, instrument, warn};

use crate::api::{ApiClient, ApiError};
use crate::models::{Credentials, ProfileUpdate, Registration, UpdatedProfile, User};

/// The signed-in (or anonymous) user of this client.
#[derive(Debug)]
pub struct AuthSession<S> {
    api: ApiClient,
    storage: S,
    user: Option<User>,
}

impl<S: KeyValueStore> AuthSession<S> {
    /// A session with no credential, ignoring anything persisted.
    #[must_use]
    pub fn anonymous(api: ApiClient, storage: S) -> Self {
        api.credential().clear();
        Self {
            api,
            storage,
            user: None,
        }
    }

    /// Resume the session persisted in `storage`.
    ///
    /// Only the stored token is read; nothing is sent to the API. The user
    /// is loaded on first use with [`load_user`](Self::load_user), and a
    /// token the API rejects then signs the session out.
    #[must_use]
    pub fn restore(api: ApiClient, storage: S) -> Self {
        let session = Self::anonymous(api, storage);

        match session.storage.get(TOKEN_KEY) {
            Ok(Some(token)) if !token.trim().is_empty() => {
                session
                    .api
                    .credential()
                    .set(SecretString::from(token.trim().to_string()));
                debug!("Stored token restored");
            }
            Ok(_) => {}
            Err(e) => warn!(error = %e, "Could not read stored token, starting signed out"),
        }

        session
    }

    /// Whether a token is held.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.api.credential().is_set()
    }

    /// The user loaded for the held token.
    #[must_use]
    pub const fn current_user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    #[must_use]
    pub const fn api(&self) -> &ApiClient {
        &self.api
    }

    #[must_use]
    pub const fn storage(&self) -> &S {
        &self.storage
    }

    /// Reload the current user from the API.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::NotAuthenticated` without a token, and
    /// `AuthError::SessionExpired` (after signing out) if the token is rejected.
    #[instrument(skip(self))]
    pub async fn refresh_user(&mut self) -> Result<&User, AuthError> {
        if !self.is_authenticated() {
            return Err(AuthError::NotAuthenticated);
        }

        match self.api.fetch_current_user().await {
            Ok(user) => Ok(self.user.insert(user)),
            Err(e) => Err(self.expire_on_unauthorized(e)),
        }
    }

    /// The current user, fetched from `users/me/` if not loaded yet.
    ///
    /// # Errors
    ///
    /// Same as [`refresh_user`](Self::refresh_user).
    pub async fn load_user(&mut self) -> Result<&User, AuthError> {
        if let Some(user) = self.user.take() {
            return Ok(self.user.insert(user));
        }
        self.refresh_user().await
    }

    /// Sign in and persist the token.
    ///
    /// When the login response carries no user, it is fetched from
    /// `users/me/`; if that fails the session is signed out again.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` when the API rejects the
    /// credentials (400, 401 or 403), or `AuthError::Api` for any other
    /// failure, including server errors and a response without a token.
    #[instrument(skip(self, credentials), fields(username = %credentials.username))]
    pub async fn login(&mut self, credentials: &Credentials) -> Result<&User, AuthError> {
        let response = self.api.login(credentials).await.map_err(login_error)?;

        self.api.credential().set(response.token.clone());
        if let Err(e) = self.storage.set(TOKEN_KEY, response.token.expose_secret()) {
            warn!(error = %e, "Failed to persist token, session will not survive restart");
        }

        let user = match response.user {
            Some(user) => user,
            None => match self.api.fetch_current_user().await {
                Ok(user) => user,
                Err(e) => {
                    self.logout();
                    return Err(AuthError::Api(e));
                }
            },
        };

        info!(user_id = %user.id, "Signed in");
        Ok(self.user.insert(user))
    }

    /// Create an account. The session stays as it was.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::PasswordMismatch` before contacting the API if the
    /// confirmation differs, or `AuthError::Api` if the API rejects the form.
    #[instrument(skip(self, registration), fields(username = %registration.username))]
    pub async fn register(&self, registration: &Registration) -> Result<(), AuthError> {
        if !registration.passwords_match() {
            return Err(AuthError::PasswordMismatch);
        }

        self.api.register(registration).await?;
        info!("Account registered");
        Ok(())
    }

    /// Update profile fields and merge the result into the current user.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::NotAuthenticated` without a token, and
    /// `AuthError::SessionExpired` if the token is rejected.
    #[instrument(skip(self, update))]
    pub async fn update_profile(&mut self, update: &ProfileUpdate) -> Result<&User, AuthError> {
        if !self.is_authenticated() {
            return Err(AuthError::NotAuthenticated);
        }

        let updated = match self.api.update_profile(update).await {
            Ok(updated) => updated,
            Err(e) => return Err(self.expire_on_unauthorized(e)),
        };

        match updated {
            UpdatedProfile::User(user) => self.user = Some(user),
            UpdatedProfile::Profile(profile) => {
                if let Some(user) = self.user.as_mut() {
                    apply_update(user, update);
                    user.profile = Some(profile);
                } else {
                    self.refresh_user().await?;
                }
            }
        }

        self.user.as_ref().ok_or(AuthError::NotAuthenticated)
    }

    /// Sign out: forget the user and drop the token everywhere.
    pub fn logout(&mut self) {
        self.user = None;
        self.api.credential().clear();

        if let Err(e) = self.storage.remove(TOKEN_KEY) {
            warn!(error = %e, "Failed to remove stored token");
        }
    }

    fn expire_on_unauthorized(&mut self, error: ApiError) -> AuthError {
        if error.is_unauthorized() {
            self.logout();
            AuthError::SessionExpired
        } else {
            AuthError::Api(error)
        }
    }
}

fn login_error(error: ApiError) -> AuthError {
    match error {
        ApiError::Unauthorized(message) | ApiError::Status { status: 400, message } => {
            AuthError::InvalidCredentials(message)
        }
        other => AuthError::Api(other),
    }
}

fn apply_update(user: &mut User, update: &ProfileUpdate) {
    if let Some(first_name) = &update.first_name {
        user.first_name.clone_from(first_name);
    }
    if let Some(last_name) = &update.last_name {
        user.last_name.clone_from(last_name);
    }
    if let Some(email) = &update.email {
        user.email = email.to_string();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use bazaar_core::{Email, MemoryStore, UserId};

    use super::*;
    use crate::api::CredentialSlot;
    use crate::config::ApiConfig;

    // Nothing listens here; tests below must not reach the network.
    fn offline_api() -> ApiClient {
        let config = ApiConfig::for_base_url("http://127.0.0.1:9/").unwrap();
        ApiClient::new(&config, CredentialSlot::new()).unwrap()
    }

    #[test]
    fn test_restore_without_token_is_anonymous() {
        let session = AuthSession::restore(offline_api(), MemoryStore::new());

        assert!(!session.is_authenticated());
        assert!(session.current_user().is_none());
    }

    #[test]
    fn test_restore_reads_token_without_fetching_user() {
        let mut storage = MemoryStore::new();
        storage.set(TOKEN_KEY, " abc123\n").unwrap();
        let api = offline_api();

        let session = AuthSession::restore(api.clone(), storage);

        assert!(session.is_authenticated());
        assert!(session.current_user().is_none());
        assert_eq!(api.credential().current().unwrap().expose_secret(), "abc123");
    }

    #[test]
    fn test_login_error_mapping() {
        assert!(matches!(
            login_error(ApiError::Status {
                status: 400,
                message: "Unable to log in with provided credentials.".to_string(),
            }),
            AuthError::InvalidCredentials(message) if message == "Unable to log in with provided credentials."
        ));
        assert!(matches!(
            login_error(ApiError::Unauthorized("Invalid token.".to_string())),
            AuthError::InvalidCredentials(_)
        ));
        assert!(matches!(
            login_error(ApiError::Status {
                status: 500,
                message: "boom".to_string(),
            }),
            AuthError::Api(ApiError::Status { status: 500, .. })
        ));
        assert!(matches!(
            login_error(ApiError::RateLimited(3)),
            AuthError::Api(ApiError::RateLimited(3))
        ));
    }

    #[tokio::test]
    async fn test_load_user_requires_token() {
        let mut session = AuthSession::anonymous(offline_api(), MemoryStore::new());

        assert!(matches!(
            session.load_user().await,
            Err(AuthError::NotAuthenticated)
        ));
    }

    #[tokio::test]
    async fn test_refresh_requires_token() {
        let mut session = AuthSession::anonymous(offline_api(), MemoryStore::new());

        assert!(matches!(
            session.refresh_user().await,
            Err(AuthError::NotAuthenticated)
        ));
        assert!(matches!(
            session.update_profile(&ProfileUpdate::default()).await,
            Err(AuthError::NotAuthenticated)
        ));
    }

    #[tokio::test]
    async fn test_register_rejects_mismatched_passwords_locally() {
        let session = AuthSession::anonymous(offline_api(), MemoryStore::new());
        let registration = Registration {
            username: "anna".to_string(),
            email: Email::parse("anna@example.com").unwrap(),
            first_name: String::new(),
            last_name: String::new(),
            password: SecretString::from("one-password".to_string()),
            password2: SecretString::from("another-password".to_string()),
        };

        assert!(matches!(
            session.register(&registration).await,
            Err(AuthError::PasswordMismatch)
        ));
    }

    #[test]
    fn test_logout_clears_slot_and_storage() {
        let mut storage = MemoryStore::new();
        storage.set(TOKEN_KEY, "abc123").unwrap();
        let api = offline_api();

        let mut session = AuthSession::anonymous(api.clone(), storage);
        api.credential().set(SecretString::from("abc123".to_string()));
        assert!(session.is_authenticated());

        session.logout();

        assert!(!session.is_authenticated());
        assert!(!api.credential().is_set());
        assert_eq!(session.storage().get(TOKEN_KEY).unwrap(), None);
    }

    #[test]
    fn test_apply_update_changes_only_set_fields() {
        let mut user = User {
            id: UserId::new(1),
            username: "anna".to_string(),
            email: "old@example.com".to_string(),
            first_name: "Anna".to_string(),
            last_name: "Petrova".to_string(),
            profile: None,
        };

        apply_update(
            &mut user,
            &ProfileUpdate {
                last_name: Some("Ivanova".to_string()),
                email: Some(Email::parse("new@example.com").unwrap()),
                ..ProfileUpdate::default()
            },
        );

        assert_eq!(user.first_name, "Anna");
        assert_eq!(user.last_name, "Ivanova");
        assert_eq!(user.email, "new@example.com");
    }
}
