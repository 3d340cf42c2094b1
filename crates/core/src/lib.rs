//! GoMarket Core - Shared cart types.
//!
//! This crate provides the domain types used across all GoMarket components:
//! - `cart` - Cart store with persistence and the consumer context
//! - `cli` - Command-line driver for the cart
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no
//! storage access, no async runtime. Cart mutations live here as snapshot
//! transformations so they can be tested without a store.
//!
//! # Modules
//!
//! - [`types`] - Product IDs, prices, quantities, cart items and cart state

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
