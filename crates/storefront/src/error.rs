//! Unified error handling for the storefront engine.
//!
//! Module-level errors (`ApiError`, `StorageError`, `FetchError`,
//! `NotifyError`) stay close to their sources; `AppError` unifies them for
//! callers that drive whole flows. Storage failures are normally absorbed
//! and logged before they ever reach this type (see the storage policy in
//! `cart::store`).

use thiserror::Error;

use crate::api::ApiError;
use crate::config::ConfigError;
use crate::fetch::FetchError;
use crate::notify::NotifyError;
use crate::storage::StorageError;

/// Application-level error type for the storefront engine.
#[derive(Debug, Error)]
pub enum AppError {
    /// Remote API operation failed.
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// Cached fetch failed.
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// Durable storage write failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Confirmation broker misuse.
    #[error("Notification error: {0}")]
    Notify(#[from] NotifyError),

    /// Configuration could not be loaded.
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Operation requires an authenticated user.
    #[error("Not authenticated")]
    NotAuthenticated,
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;
