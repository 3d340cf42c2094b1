//! Cart configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `GOMARKET_CART_KEY` - Storage key holding the cart (default: `@GoMarket:cart`)
//! - `GOMARKET_STORAGE_PATH` - File used by [`FileStorage`](crate::storage::FileStorage)
//!   (default: `.gomarket/storage.json`)

use std::path::PathBuf;

use thiserror::Error;

/// Default namespaced key for the persisted cart.
pub const DEFAULT_STORAGE_KEY: &str = "@GoMarket:cart";

/// Default location of the storage file.
pub const DEFAULT_STORAGE_PATH: &str = ".gomarket/storage.json";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Cart store configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartConfig {
    /// Key the cart snapshot is stored under
    pub storage_key: String,
    /// Path of the storage file for file-backed storage
    pub storage_path: PathBuf,
}

impl Default for CartConfig {
    fn default() -> Self {
        Self {
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            storage_path: PathBuf::from(DEFAULT_STORAGE_PATH),
        }
    }
}

impl CartConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if `GOMARKET_CART_KEY` is set but blank.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from a variable lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if `GOMARKET_CART_KEY` resolves to a blank value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let storage_key = get_or_default(&lookup, "GOMARKET_CART_KEY", DEFAULT_STORAGE_KEY);
        if storage_key.trim().is_empty() {
            return Err(ConfigError::InvalidEnvVar(
                "GOMARKET_CART_KEY".to_string(),
                "must not be empty".to_string(),
            ));
        }

        let storage_path = PathBuf::from(get_or_default(
            &lookup,
            "GOMARKET_STORAGE_PATH",
            DEFAULT_STORAGE_PATH,
        ));

        Ok(Self {
            storage_key,
            storage_path,
        })
    }

    /// Use a different storage key.
    #[must_use]
    pub fn with_storage_key(mut self, key: impl Into<String>) -> Self {
        self.storage_key = key.into();
        self
    }

    /// Use a different storage file.
    #[must_use]
    pub fn with_storage_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.storage_path = path.into();
        self
    }
}

/// Get a variable with a default value.
fn get_or_default(lookup: impl Fn(&str) -> Option<String>, key: &str, default: &str) -> String {
    lookup(key).unwrap_or_else(|| default.to_string())
}
