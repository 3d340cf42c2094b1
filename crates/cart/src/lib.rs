//! GoMarket Cart - Persistent shopping cart state.
//!
//! Holds the cart's line items in memory, mirrors every change to a
//! key-value store, and hands the cart to consumers through a shared
//! context.
//!
//! # Architecture
//!
//! - [`store`] - `CartStore`: hydration, add/increment/decrement, background persistence
//! - [`context`] - `CartContext`/`CartProvider`: mounting a store and reaching it
//! - [`storage`] - `KeyValueStorage` trait with memory and file backends
//! - [`config`] - Storage key and file location from the environment
//! - [`error`] - `CartError`
//!
//! Pure cart types and mutations live in `gomarket-core`.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod context;
pub mod error;
pub mod storage;
pub mod store;

pub use config::{CartConfig, ConfigError, DEFAULT_STORAGE_KEY};
pub use context::{CartContext, CartProvider};
pub use error::CartError;
pub use storage::{FileStorage, KeyValueStorage, MemoryStorage, StorageError};
pub use store::CartStore;

pub use gomarket_core::{CartItem, CartProduct, CartState, Price, ProductId, Quantity};
