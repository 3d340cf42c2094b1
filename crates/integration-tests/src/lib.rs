//! Integration tests for GoMarket.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p gomarket-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `cart_persistence` - Restarting the store over the same storage
//! - `cart_properties` - Property tests over operation sequences
//!
//! This library holds the fixtures shared by those suites.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::Path;
use std::sync::Arc;

use gomarket_cart::{CartConfig, CartStore, FileStorage, KeyValueStorage};
use gomarket_core::{CartProduct, Price, ProductId, ProductIdError};

/// Build a product descriptor with a price in cents.
///
/// # Errors
///
/// Returns an error if `id` is blank.
pub fn product(id: &str, title: &str, cents: u32) -> Result<CartProduct, ProductIdError> {
    Ok(CartProduct::new(
        ProductId::parse(id)?,
        title,
        format!("https://cdn.example.com/{id}.png"),
        Price::from_cents(i64::from(cents)).unwrap_or(Price::ZERO),
    ))
}

/// Open a store over a storage file, as the app does at launch.
pub async fn launch_over_file(path: &Path) -> CartStore {
    let config = CartConfig::default().with_storage_path(path);
    let storage: Arc<dyn KeyValueStorage> = Arc::new(FileStorage::new(path));
    CartStore::initialize(storage, &config).await
}

/// Open a store over any storage with the default key.
pub async fn launch(storage: Arc<dyn KeyValueStorage>) -> CartStore {
    CartStore::initialize(storage, &CartConfig::default()).await
}
