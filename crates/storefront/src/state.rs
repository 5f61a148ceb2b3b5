//! Application state.

use bazaar_core::{CartState, CartStore, KeyValueStore, ProductId};
use tracing::instrument;

use crate::api::{ApiClient, CredentialSlot};
use crate::config::StorefrontConfig;
use crate::error::{AppError, Result};
use crate::models::{Order, ShippingInfo};
use crate::services::auth::AuthSession;
use crate::services::checkout;
use crate::storage::DirectoryStore;

/// The application root: configuration, API client, auth session and cart.
///
/// The session and the cart persist through clones of the same storage.
#[derive(Debug)]
pub struct AppState<S = DirectoryStore> {
    config: StorefrontConfig,
    api: ApiClient,
    session: AuthSession<S>,
    cart: CartStore<S>,
}

impl AppState {
    /// Open the state directory named in `config` and restore the session
    /// and cart persisted there. Nothing is sent to the API.
    ///
    /// # Errors
    ///
    /// Returns an error if the state directory cannot be created or the HTTP
    /// client cannot be built.
    pub fn open(config: StorefrontConfig) -> Result<Self> {
        let storage = DirectoryStore::open(&config.state_dir)?;
        Self::with_storage(config, storage)
    }
}

impl<S: KeyValueStore + Clone> AppState<S> {
    /// Build the application over an arbitrary storage backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn with_storage(config: StorefrontConfig, storage: S) -> Result<Self> {
        let api = ApiClient::new(&config.api, CredentialSlot::new())?;
        let cart = CartStore::open(storage.clone());
        let session = AuthSession::restore(api.clone(), storage);

        Ok(Self {
            config,
            api,
            session,
            cart,
        })
    }

    #[must_use]
    pub const fn config(&self) -> &StorefrontConfig {
        &self.config
    }

    #[must_use]
    pub const fn api(&self) -> &ApiClient {
        &self.api
    }

    #[must_use]
    pub const fn session(&self) -> &AuthSession<S> {
        &self.session
    }

    pub const fn session_mut(&mut self) -> &mut AuthSession<S> {
        &mut self.session
    }

    #[must_use]
    pub const fn cart(&self) -> &CartStore<S> {
        &self.cart
    }

    pub const fn cart_mut(&mut self) -> &mut CartStore<S> {
        &mut self.cart
    }

    /// Sign out if `error` shows the API no longer accepts the held token.
    pub fn forget_rejected_token(&mut self, error: &AppError) {
        if error.is_token_rejected() && self.session.is_authenticated() {
            self.session.logout();
        }
    }

    /// Look up a product and add `quantity` of it to the cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the product cannot be fetched.
    #[instrument(skip(self))]
    pub async fn add_to_cart(&mut self, product_id: ProductId, quantity: u32) -> Result<&CartState> {
        let product = self.api.fetch_product(product_id).await?;
        Ok(self.cart.add_item(product.snapshot(), quantity))
    }

    /// Place an order for the cart's contents.
    ///
    /// # Errors
    ///
    /// See [`checkout::place_order`].
    pub async fn place_order(&mut self, shipping: ShippingInfo) -> Result<Order> {
        Ok(checkout::place_order(&self.session, &mut self.cart, shipping).await?)
    }
}
