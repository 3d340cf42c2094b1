//! Shared access to the active cart store.
//!
//! Consumers receive a [`CartContext`] and call [`CartContext::use_cart`]
//! whenever they need the cart. The context is empty until an owner mounts
//! a store with [`CartContext::provide`]; the returned [`CartProvider`]
//! keeps it mounted until dropped.
//!
//! # Example
//!
//! ```rust,ignore
//! let context = CartContext::new();
//! let _provider = context.provide(Arc::new(MemoryStorage::new()), &config).await?;
//!
//! let cart = context.use_cart()?;
//! cart.add_to_cart(product);
//! ```

use std::sync::{Arc, PoisonError, RwLock};

use tracing::{debug, info};

use crate::config::CartConfig;
use crate::error::{CartError, Result};
use crate::storage::KeyValueStorage;
use crate::store::CartStore;

type Slot = Arc<RwLock<Option<CartStore>>>;

/// Slot through which consumers reach the mounted cart store.
///
/// Cheaply cloneable; clones observe the same slot.
#[derive(Debug, Clone, Default)]
pub struct CartContext {
    slot: Slot,
}

impl CartContext {
    /// Create a context with no store mounted.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Initialize a store over `storage` and mount it.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::AlreadyProvided`] if a store is already mounted.
    pub async fn provide(
        &self,
        storage: Arc<dyn KeyValueStorage>,
        config: &CartConfig,
    ) -> Result<CartProvider> {
        if self.is_provided() {
            return Err(CartError::AlreadyProvided);
        }

        let store = CartStore::initialize(storage, config).await;

        // Another provider may have mounted while this one was hydrating.
        let mut slot = self.slot.write().unwrap_or_else(PoisonError::into_inner);
        if slot.is_some() {
            return Err(CartError::AlreadyProvided);
        }
        *slot = Some(store.clone());
        drop(slot);

        info!(key = %config.storage_key, "Cart provider mounted");
        Ok(CartProvider {
            slot: Arc::clone(&self.slot),
            store,
        })
    }

    /// Get the mounted cart store.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::OutsideProvider`] if no store is mounted.
    pub fn use_cart(&self) -> Result<CartStore> {
        self.slot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or(CartError::OutsideProvider)
    }

    /// Whether a store is currently mounted.
    #[must_use]
    pub fn is_provided(&self) -> bool {
        self.slot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}

/// Keeps a cart store mounted in its [`CartContext`].
///
/// Dropping the provider unmounts the store. Handles already obtained through
/// `use_cart` stay usable.
#[derive(Debug)]
pub struct CartProvider {
    slot: Slot,
    store: CartStore,
}

impl CartProvider {
    /// The mounted store.
    #[must_use]
    pub const fn store(&self) -> &CartStore {
        &self.store
    }
}

impl Drop for CartProvider {
    fn drop(&mut self) {
        let mut slot = self.slot.write().unwrap_or_else(PoisonError::into_inner);
        *slot = None;
        debug!("Cart provider unmounted");
    }
}
