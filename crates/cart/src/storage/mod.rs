//! Key-value persistence for the cart.
//!
//! The cart owns a single namespaced key (e.g. `@GoMarket:cart`) and stores
//! its whole snapshot there as text. Backends only move strings; they never
//! interpret the values.
//!
//! # Backends
//!
//! - [`MemoryStorage`] - In-process map. Clones share contents, which makes it
//!   a stand-in for device storage that outlives a store instance.
//! - [`FileStorage`] - A JSON object file mapping keys to values, written
//!   atomically.

mod file;
mod memory;

use async_trait::async_trait;
use thiserror::Error;

pub use file::FileStorage;
pub use memory::MemoryStorage;

/// Errors from storage backends.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Failed to read from storage.
    #[error("failed to read storage: {0}")]
    Read(String),

    /// Failed to write to storage.
    #[error("failed to write storage: {0}")]
    Write(String),

    /// Stored data could not be parsed.
    #[error("storage is corrupt: {0}")]
    Corrupt(String),
}

/// Asynchronous string key-value store.
///
/// Implementations must be thread-safe. A missing key is `Ok(None)`, not an
/// error.
#[async_trait]
pub trait KeyValueStorage: Send + Sync {
    /// Read the value stored under `key`.
    async fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Store `value` under `key`, replacing any previous value.
    async fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Delete `key`. Deleting a missing key succeeds.
    async fn remove_item(&self, key: &str) -> Result<(), StorageError>;
}
