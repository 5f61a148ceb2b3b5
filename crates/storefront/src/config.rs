//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All variables are optional.
//!
//! - `BAZAAR_API_URL` - Shop API base URL (default: `https://ruslan.diplomcomtehno.online/`)
//! - `BAZAAR_STATE_DIR` - Directory holding the persisted cart and token (default: `.bazaar`)
//! - `BAZAAR_AUTH_SCHEME` - Authorization header scheme (default: `Token`)
//! - `BAZAAR_HTTP_TIMEOUT_SECS` - Per-request timeout (default: 30)
//! - `BAZAAR_CATALOG_CACHE_TTL_SECS` - Category/product cache lifetime (default: 300)
//! - `BAZAAR_CATALOG_PAGE_SIZE` - Products per catalog page (default: 8)

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;
use url::Url;

const DEFAULT_API_URL: &str = "https://ruslan.diplomcomtehno.online/";
const DEFAULT_STATE_DIR: &str = ".bazaar";
const DEFAULT_AUTH_SCHEME: &str = "Token";
const DEFAULT_TIMEOUT_SECS: &str = "30";
const DEFAULT_CACHE_TTL_SECS: &str = "300";
const DEFAULT_PAGE_SIZE: &str = "8";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// Shop API client configuration
    pub api: ApiConfig,
    /// Directory for persisted client state (cart, token)
    pub state_dir: PathBuf,
    /// Products shown per catalog page
    pub catalog_page_size: u32,
}

/// Shop API client configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Base URL every API path is joined onto. Always ends with `/`.
    pub base_url: Url,
    /// Scheme placed before the token in the `Authorization` header
    pub auth_scheme: String,
    /// Per-request timeout
    pub timeout: Duration,
    /// Lifetime of cached categories and products
    pub cache_ttl: Duration,
}

impl ApiConfig {
    /// Configuration pointing at `base_url` with default settings otherwise.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if `base_url` is not an absolute http(s) URL.
    pub fn for_base_url(base_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: parse_base_url("BAZAAR_API_URL", base_url)?,
            auth_scheme: DEFAULT_AUTH_SCHEME.to_string(),
            timeout: Duration::from_secs(30),
            cache_ttl: Duration::from_secs(300),
        })
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set to an invalid value.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set to an invalid value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let base_url = parse_base_url("BAZAAR_API_URL", &get("BAZAAR_API_URL", DEFAULT_API_URL))?;
        let auth_scheme = get("BAZAAR_AUTH_SCHEME", DEFAULT_AUTH_SCHEME);
        if auth_scheme.trim().is_empty() || auth_scheme.contains(char::is_whitespace) {
            return Err(ConfigError::InvalidEnvVar(
                "BAZAAR_AUTH_SCHEME".to_string(),
                "must be a single word".to_string(),
            ));
        }

        let timeout = parse_number::<u64>(
            "BAZAAR_HTTP_TIMEOUT_SECS",
            &get("BAZAAR_HTTP_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS),
        )?;
        let cache_ttl = parse_number::<u64>(
            "BAZAAR_CATALOG_CACHE_TTL_SECS",
            &get("BAZAAR_CATALOG_CACHE_TTL_SECS", DEFAULT_CACHE_TTL_SECS),
        )?;
        let catalog_page_size = parse_number::<u32>(
            "BAZAAR_CATALOG_PAGE_SIZE",
            &get("BAZAAR_CATALOG_PAGE_SIZE", DEFAULT_PAGE_SIZE),
        )?;
        if catalog_page_size == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "BAZAAR_CATALOG_PAGE_SIZE".to_string(),
                "must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            api: ApiConfig {
                base_url,
                auth_scheme,
                timeout: Duration::from_secs(timeout),
                cache_ttl: Duration::from_secs(cache_ttl),
            },
            state_dir: PathBuf::from(get("BAZAAR_STATE_DIR", DEFAULT_STATE_DIR)),
            catalog_page_size,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Parse an API base URL, forcing a trailing slash so relative joins keep
/// the full path.
fn parse_base_url(key: &str, value: &str) -> Result<Url, ConfigError> {
    let mut url =
        Url::parse(value.trim()).map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("unsupported scheme '{}'", url.scheme()),
        ));
    }

    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }

    Ok(url)
}

fn parse_number<T>(key: &str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}
