//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STOREGPT_API_BASE_URL` - Base URL of the remote storefront API
//!
//! ## Optional
//! - `STOREGPT_API_TOKEN` - Bearer credential for authenticated calls
//! - `STOREGPT_CACHE_TTL_SECS` - Catalog cache time-to-live (default: 900)
//! - `STOREGPT_STORAGE_PATH` - Durable storage file; in-memory when unset

use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

/// Default catalog cache time-to-live: 15 minutes.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(15 * 60);

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront engine configuration.
///
/// Implements `Debug` manually to redact the bearer credential.
#[derive(Clone)]
pub struct StorefrontConfig {
    /// Base URL of the remote storefront API.
    pub api_base_url: Url,
    /// Optional bearer credential supplied by the identity provider at
    /// deploy time. Absence means unauthenticated browsing only.
    pub api_token: Option<SecretString>,
    /// Time-to-live for cached catalog fetches.
    pub cache_ttl: Duration,
    /// Durable storage file path; `None` selects the in-memory store.
    pub storage_path: Option<std::path::PathBuf>,
}

impl std::fmt::Debug for StorefrontConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorefrontConfig")
            .field("api_base_url", &self.api_base_url.as_str())
            .field(
                "api_token",
                &self.api_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("cache_ttl", &self.cache_ttl)
            .field("storage_path", &self.storage_path)
            .finish()
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let api_base_url = get_required_env("STOREGPT_API_BASE_URL")?
            .parse::<Url>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("STOREGPT_API_BASE_URL".to_string(), e.to_string())
            })?;

        let api_token = get_optional_env("STOREGPT_API_TOKEN").map(SecretString::from);

        let cache_ttl = match get_optional_env("STOREGPT_CACHE_TTL_SECS") {
            Some(raw) => Duration::from_secs(raw.parse::<u64>().map_err(|e| {
                ConfigError::InvalidEnvVar("STOREGPT_CACHE_TTL_SECS".to_string(), e.to_string())
            })?),
            None => DEFAULT_CACHE_TTL,
        };

        let storage_path = get_optional_env("STOREGPT_STORAGE_PATH").map(Into::into);

        Ok(Self {
            api_base_url,
            api_token,
            cache_ttl,
            storage_path,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}
