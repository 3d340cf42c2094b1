//! Type-safe unit price using decimal arithmetic.
//!
//! Prices are persisted as plain JSON numbers (`"price": 1.5`) so stored carts
//! stay readable by any client of the same storage key. Internally the amount
//! is a [`Decimal`] to keep subtotals exact.

use core::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Errors that can occur when constructing a [`Price`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// The amount is below zero.
    #[error("price cannot be negative: {0}")]
    Negative(Decimal),
    /// The amount is not a finite number.
    #[error("price must be a finite number")]
    NotFinite,
    /// The input is not a decimal number.
    #[error("invalid price: {0}")]
    Invalid(String),
    /// A total exceeds the representable range.
    #[error("price total overflowed")]
    Overflow,
}

/// Non-negative unit price in the store currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Price(Decimal);

impl Price {
    /// Zero price.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a new price.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::Negative`] if `amount` is below zero.
    pub fn new(amount: Decimal) -> Result<Self, PriceError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(PriceError::Negative(amount));
        }
        Ok(Self(amount))
    }

    /// Create a price from an `f64`, as received from JSON clients.
    ///
    /// # Errors
    ///
    /// The amount is taken from the shortest decimal text of `amount`, the
    /// same conversion used when a stored JSON number is read back, so
    /// `from_f64(19.99)` is exactly `19.99`.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::NotFinite`] for NaN or infinite input,
    /// [`PriceError::Invalid`] for magnitudes a decimal cannot hold and
    /// [`PriceError::Negative`] for amounts below zero.
    pub fn from_f64(amount: f64) -> Result<Self, PriceError> {
        if !amount.is_finite() {
            return Err(PriceError::NotFinite);
        }
        let amount = amount
            .to_string()
            .parse::<Decimal>()
            .map_err(|e| PriceError::Invalid(e.to_string()))?;
        Self::new(amount.normalize())
    }

    /// Create a price from an amount in cents.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::Negative`] if `cents` is below zero.
    pub fn from_cents(cents: i64) -> Result<Self, PriceError> {
        Self::new(Decimal::new(cents, 2))
    }

    /// Get the underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Sum of two prices.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::Overflow`] if the sum is out of range.
    pub fn checked_add(self, rhs: Self) -> Result<Self, PriceError> {
        self.0
            .checked_add(rhs.0)
            .map(Self)
            .ok_or(PriceError::Overflow)
    }

    /// This price times a unit count.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::Overflow`] if the product is out of range.
    pub fn checked_mul(self, units: u32) -> Result<Self, PriceError> {
        self.0
            .checked_mul(Decimal::from(units))
            .map(Self)
            .ok_or(PriceError::Overflow)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${:.2}", self.0)
    }
}

impl std::str::FromStr for Price {
    type Err = PriceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let amount = s
            .trim()
            .trim_start_matches('$')
            .parse::<Decimal>()
            .map_err(|e| PriceError::Invalid(e.to_string()))?;
        Self::new(amount)
    }
}


impl Serialize for Price {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        rust_decimal::serde::float::serialize(&self.0, serializer)
    }
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let amount = rust_decimal::serde::float::deserialize(deserializer)?;
        Self::new(amount).map_err(serde::de::Error::custom)
    }
}
