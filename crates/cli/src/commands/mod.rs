//! CLI command implementations.

pub mod cart;

use std::path::PathBuf;
use std::sync::Arc;

use gomarket_cart::{
    CartConfig, CartContext, CartError, CartProvider, CartStore, ConfigError, FileStorage,
};
use thiserror::Error;
use tracing::debug;

/// Errors from CLI commands.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("invalid {0}: {1}")]
    InvalidInput(&'static str, String),
    #[error(transparent)]
    Cart(#[from] CartError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// A cart mounted over file storage for the duration of one command.
pub struct CartSession {
    context: CartContext,
    provider: CartProvider,
}

impl CartSession {
    /// Load configuration, apply CLI overrides and mount the cart.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration is invalid or the cart cannot be mounted.
    pub async fn open(
        storage_path: Option<PathBuf>,
        key: Option<String>,
    ) -> Result<Self, CommandError> {
        let mut config = CartConfig::from_env()?;
        if let Some(path) = storage_path {
            config = config.with_storage_path(path);
        }
        if let Some(key) = key {
            config = config.with_storage_key(key);
        }
        debug!(path = %config.storage_path.display(), key = %config.storage_key, "Opening cart");

        let storage = Arc::new(FileStorage::new(config.storage_path.clone()));
        let context = CartContext::new();
        let provider = context.provide(storage, &config).await?;

        Ok(Self { context, provider })
    }

    /// The mounted cart.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::OutsideProvider`] if the cart is not mounted.
    pub fn cart(&self) -> Result<CartStore, CommandError> {
        Ok(self.context.use_cart()?)
    }

    /// Wait for pending writes and unmount the cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the persistence writer has stopped.
    pub async fn close(self) -> Result<(), CommandError> {
        self.provider.store().flush().await?;
        Ok(())
    }
}
