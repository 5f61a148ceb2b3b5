//! Shop REST API client.
//!
//! # Architecture
//!
//! - One `reqwest::Client` behind an `Arc`, so clones share the connection pool
//! - The bearer token is read from a [`CredentialSlot`] on every request
//! - Categories and single products are cached via `moka`; listings and
//!   user-specific resources are always fetched
//!
//! # Example
//!
//! ```rust,ignore
//! use bazaar_storefront::api::{ApiClient, CredentialSlot};
//! use bazaar_storefront::models::ProductFilters;
//!
//! let api = ApiClient::new(&config.api, CredentialSlot::new())?;
//!
//! let page = api.fetch_catalog(&ProductFilters::storefront_page(1, 8)).await?;
//! let product = api.fetch_product(page.results[0].id).await?;
//! ```

mod cache;
mod credential;

pub use credential::CredentialSlot;

use std::sync::Arc;

use bazaar_core::{OrderId, OrderStatus, ProductId};
use moka::future::Cache;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, RETRY_AFTER};
use reqwest::{Method, RequestBuilder, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, instrument};
use url::Url;

use crate::config::ApiConfig;
use crate::models::{
    Category, Credentials, NewOrder, Order, Page, Product, ProductFilters, ProfileUpdate,
    Registration, UpdatedProfile, User,
};

use cache::{CacheKey, CacheValue};

/// Errors that can occur when talking to the shop API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Request URL could not be built.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Missing, invalid or expired credentials (401/403).
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rate limited by the API.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// Any other non-success response.
    #[error("API returned {status}: {message}")]
    Status { status: u16, message: String },

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// A login response without a token.
    #[error("Login response did not include a token")]
    MissingToken,
}

impl ApiError {
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized(_))
    }

    /// The API's own message for a rejected request.
    #[must_use]
    pub fn detail(&self) -> Option<&str> {
        match self {
            Self::Unauthorized(message)
            | Self::NotFound(message)
            | Self::Status { message, .. } => Some(message),
            _ => None,
        }
    }
}

/// A successful login.
#[derive(Debug, Clone)]
pub struct LoginResponse {
    pub token: SecretString,
    /// The user, when the API includes it alongside the token.
    pub user: Option<User>,
}

// =============================================================================
// ApiClient
// =============================================================================

/// Client for the shop REST API.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    base_url: Url,
    auth_scheme: String,
    credential: CredentialSlot,
    cache: Cache<CacheKey, CacheValue>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.inner.base_url.as_str())
            .field("credential", &self.inner.credential)
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Create a client that authenticates with whatever `credential` holds.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &ApiConfig, credential: CredentialSlot) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;

        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(config.cache_ttl)
            .build();

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                client,
                base_url: config.base_url.clone(),
                auth_scheme: config.auth_scheme.clone(),
                credential,
                cache,
            }),
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// The credential cell requests read their token from.
    #[must_use]
    pub fn credential(&self) -> &CredentialSlot {
        &self.inner.credential
    }

    fn url(&self, path: &str) -> Result<Url, ApiError> {
        Ok(self.inner.base_url.join(path)?)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let builder = self
            .inner
            .client
            .request(method, url)
            .header(CONTENT_TYPE, "application/json");

        match self.inner.credential.current() {
            Some(token) => builder.header(
                AUTHORIZATION,
                format!("{} {}", self.inner.auth_scheme, token.expose_secret()),
            ),
            None => builder,
        }
    }

    /// Send a request and return the body of a successful response.
    async fn execute(&self, builder: RequestBuilder) -> Result<String, ApiError> {
        let response = builder.send().await?;
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.trim().parse::<u64>().ok())
                .unwrap_or(1);
            return Err(ApiError::RateLimited(retry_after));
        }

        let body = response.text().await?;

        if status.is_success() {
            return Ok(body);
        }

        debug!(
            status = %status,
            body = %body.chars().take(500).collect::<String>(),
            "Shop API returned non-success status"
        );

        let message = extract_detail(&body).unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string()
        });

        Err(match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ApiError::Unauthorized(message),
            StatusCode::NOT_FOUND => ApiError::NotFound(message),
            _ => ApiError::Status {
                status: status.as_u16(),
                message,
            },
        })
    }

    async fn fetch_json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ApiError> {
        let body = self.execute(builder).await?;

        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %body.chars().take(500).collect::<String>(),
                "Failed to parse shop API response"
            );
            ApiError::Parse(e)
        })
    }

    // =========================================================================
    // Account Methods
    // =========================================================================

    /// Create an account. Does not sign in.
    ///
    /// # Errors
    ///
    /// Returns an error if the API rejects the registration.
    #[instrument(skip(self, registration), fields(username = %registration.username))]
    pub async fn register(&self, registration: &Registration) -> Result<(), ApiError> {
        let url = self.url("users/register/")?;
        self.execute(self.request(Method::POST, url).json(registration))
            .await?;
        Ok(())
    }

    /// Exchange credentials for a token.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::MissingToken` if the response has no token, or the
    /// API error if the credentials are rejected.
    #[instrument(skip(self, credentials), fields(username = %credentials.username))]
    pub async fn login(&self, credentials: &Credentials) -> Result<LoginResponse, ApiError> {
        let url = self.url("users/login/")?;
        let body: serde_json::Value = self
            .fetch_json(self.request(Method::POST, url).json(credentials))
            .await?;

        let token = body
            .get("token")
            .and_then(serde_json::Value::as_str)
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or(ApiError::MissingToken)?;
        let token = SecretString::from(token.to_string());

        let user = body
            .get("user")
            .cloned()
            .map_or_else(|| serde_json::from_value(body), serde_json::from_value)
            .ok();

        Ok(LoginResponse { token, user })
    }

    /// Get the signed-in user.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Unauthorized` if the token is missing or invalid.
    #[instrument(skip(self))]
    pub async fn fetch_current_user(&self) -> Result<User, ApiError> {
        let url = self.url("users/me/")?;
        self.fetch_json(self.request(Method::GET, url)).await
    }

    /// Apply a partial profile update.
    ///
    /// # Errors
    ///
    /// Returns an error if the API rejects the update.
    #[instrument(skip(self, update))]
    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<UpdatedProfile, ApiError> {
        let url = self.url("users/profile/")?;
        self.fetch_json(self.request(Method::PATCH, url).json(update))
            .await
    }

    // =========================================================================
    // Catalog Methods
    // =========================================================================

    /// Get all categories.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn fetch_categories(&self) -> Result<Vec<Category>, ApiError> {
        if let Some(CacheValue::Categories(categories)) =
            self.inner.cache.get(&CacheKey::Categories).await
        {
            debug!("Cache hit for categories");
            return Ok(categories);
        }

        let url = self.url("products/categories/")?;
        let page: Page<Category> = self.fetch_json(self.request(Method::GET, url)).await?;

        self.inner
            .cache
            .insert(CacheKey::Categories, CacheValue::Categories(page.results.clone()))
            .await;

        Ok(page.results)
    }

    /// Get one page of products matching `filters`.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn fetch_catalog(&self, filters: &ProductFilters) -> Result<Page<Product>, ApiError> {
        let mut url = self.url("products/products/")?;

        let pairs = filters.query_pairs();
        if !pairs.is_empty() {
            url.query_pairs_mut().extend_pairs(pairs);
        }

        self.fetch_json(self.request(Method::GET, url)).await
    }

    /// Get a product by ID.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` if the product does not exist.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn fetch_product(&self, id: ProductId) -> Result<Product, ApiError> {
        let cache_key = CacheKey::Product(id);

        if let Some(CacheValue::Product(product)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for product");
            return Ok(*product);
        }

        let url = self.url(&format!("products/products/{id}/"))?;
        let product: Product = self.fetch_json(self.request(Method::GET, url)).await?;

        self.inner
            .cache
            .insert(cache_key, CacheValue::Product(Box::new(product.clone())))
            .await;

        Ok(product)
    }

    // =========================================================================
    // Order Methods
    // =========================================================================

    /// Get the signed-in user's orders.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Unauthorized` when not signed in.
    #[instrument(skip(self))]
    pub async fn fetch_orders(&self) -> Result<Vec<Order>, ApiError> {
        let url = self.url("orders/orders/")?;
        let page: Page<Order> = self.fetch_json(self.request(Method::GET, url)).await?;
        Ok(page.results)
    }

    /// Get one order.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` if the order does not exist or belongs to
    /// another user.
    #[instrument(skip(self), fields(order_id = %id))]
    pub async fn fetch_order(&self, id: OrderId) -> Result<Order, ApiError> {
        let url = self.url(&format!("orders/orders/{id}/"))?;
        self.fetch_json(self.request(Method::GET, url)).await
    }

    /// Place an order.
    ///
    /// # Errors
    ///
    /// Returns an error if the API rejects the order.
    #[instrument(skip(self, order), fields(items = order.items.len(), total = %order.total_price))]
    pub async fn submit_order(&self, order: &NewOrder) -> Result<Order, ApiError> {
        let url = self.url("orders/orders/")?;
        self.fetch_json(self.request(Method::POST, url).json(order))
            .await
    }

    /// Change an order's status.
    ///
    /// # Errors
    ///
    /// Returns an error if the API rejects the change.
    #[instrument(skip(self), fields(order_id = %id, status = %status))]
    pub async fn update_order_status(&self, id: OrderId, status: OrderStatus) -> Result<(), ApiError> {
        let url = self.url(&format!("orders/orders/{id}/"))?;
        self.execute(
            self.request(Method::PATCH, url)
                .json(&serde_json::json!({ "status": status })),
        )
        .await?;
        Ok(())
    }

    /// Delete an order.
    ///
    /// # Errors
    ///
    /// Returns an error if the API rejects the deletion.
    #[instrument(skip(self), fields(order_id = %id))]
    pub async fn delete_order(&self, id: OrderId) -> Result<(), ApiError> {
        let url = self.url(&format!("orders/orders/{id}/"))?;
        self.execute(self.request(Method::DELETE, url)).await?;
        Ok(())
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Pull a readable message out of an error body.
///
/// Uses `detail` when present, otherwise joins field errors as
/// `field: message`.
fn extract_detail(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;

    if let Some(detail) = value.get("detail").and_then(serde_json::Value::as_str) {
        return Some(detail.to_string());
    }

    let messages: Vec<String> = match &value {
        serde_json::Value::Object(fields) => fields
            .iter()
            .filter_map(|(field, errors)| {
                let text = join_messages(errors)?;
                Some(if field == "non_field_errors" {
                    text
                } else {
                    format!("{field}: {text}")
                })
            })
            .collect(),
        other => join_messages(other).into_iter().collect(),
    };

    if messages.is_empty() {
        None
    } else {
        Some(messages.join("; "))
    }
}

fn join_messages(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Array(items) => {
            let parts: Vec<&str> = items.iter().filter_map(serde_json::Value::as_str).collect();
            (!parts.is_empty()).then(|| parts.join(" "))
        }
        _ => None,
    }
}
