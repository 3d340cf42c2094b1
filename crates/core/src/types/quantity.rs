//! Line item quantity.

use core::fmt;
use core::num::NonZeroU32;

use serde::{Deserialize, Serialize};

/// Errors that can occur when constructing a [`Quantity`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum QuantityError {
    /// A line cannot hold zero units.
    #[error("quantity must be at least 1")]
    Zero,
}

/// Number of units of one product in the cart.
///
/// Always at least 1: a line whose count would drop to zero is removed from
/// the cart instead, so [`Quantity::decremented`] returns `None` at that point.
///
/// ```
/// use gomarket_core::Quantity;
///
/// let one = Quantity::ONE;
/// assert_eq!(one.incremented().get(), 2);
/// assert!(one.decremented().is_none());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Quantity(NonZeroU32);

impl Quantity {
    /// A single unit.
    pub const ONE: Self = Self(NonZeroU32::MIN);

    /// Create a new quantity.
    ///
    /// # Errors
    ///
    /// Returns [`QuantityError::Zero`] if `count` is zero.
    pub const fn new(count: u32) -> Result<Self, QuantityError> {
        match NonZeroU32::new(count) {
            Some(count) => Ok(Self(count)),
            None => Err(QuantityError::Zero),
        }
    }

    /// Get the count as a `u32`.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0.get()
    }

    /// One more unit. Saturates at `u32::MAX`.
    #[must_use]
    pub const fn incremented(self) -> Self {
        Self(self.0.saturating_add(1))
    }

    /// One less unit, or `None` when the line should be removed.
    #[must_use]
    pub const fn decremented(self) -> Option<Self> {
        match NonZeroU32::new(self.0.get() - 1) {
            Some(count) => Some(Self(count)),
            None => None,
        }
    }
}

impl Default for Quantity {
    fn default() -> Self {
        Self::ONE
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<u32> for Quantity {
    type Error = QuantityError;

    fn try_from(count: u32) -> Result<Self, Self::Error> {
        Self::new(count)
    }
}

impl From<Quantity> for u32 {
    fn from(quantity: Quantity) -> Self {
        quantity.get()
    }
}
