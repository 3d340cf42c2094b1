//! Cart error type.
//!
//! Usage errors (no mounted store, double mount) are kept apart from data
//! errors (unknown product) so callers can tell a wiring mistake from a
//! stale product ID.

use gomarket_core::{CartStateError, ProductId};
use thiserror::Error;

/// Errors returned by the cart store and context.
#[derive(Debug, Error)]
pub enum CartError {
    /// `use_cart` was called with no store mounted.
    #[error("use_cart must be used within a CartProvider")]
    OutsideProvider,

    /// `provide` was called while a store is already mounted.
    #[error("a CartProvider is already mounted on this context")]
    AlreadyProvided,

    /// Cart mutation failed.
    #[error(transparent)]
    State(#[from] CartStateError),

    /// The background persistence task is gone.
    #[error("cart persistence writer has stopped")]
    WriterClosed,
}

impl CartError {
    /// Whether this error signals misuse of the context rather than bad data.
    #[must_use]
    pub const fn is_usage_error(&self) -> bool {
        matches!(self, Self::OutsideProvider | Self::AlreadyProvided)
    }

    /// The product ID that could not be found, if that is the cause.
    #[must_use]
    pub fn missing_item(&self) -> Option<&ProductId> {
        match self {
            Self::State(CartStateError::ItemNotFound(id)) => Some(id),
            _ => None,
        }
    }
}

/// Result type alias for `CartError`.
pub type Result<T> = std::result::Result<T, CartError>;
