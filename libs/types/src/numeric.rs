//! Fixed-point decimal price type
//!
//! Uses rust_decimal for deterministic arithmetic (no floating-point errors).
//! Prices are normalized to `PRICE_SCALE` fractional digits so that equal
//! values always hash and compare equal, which makes `Price` safe to use as
//! an ordered map key.

use rust_decimal::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of fractional digits a price carries.
pub const PRICE_SCALE: u32 = 8;

/// Price type with fixed-point decimal representation
///
/// Must never be negative. Zero is the sentinel carried by market and cancel
/// submissions, which have no limit price. Serialized as a string to prevent
/// JSON number precision loss.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Price(Decimal);

impl Price {
    /// Create a new Price from a Decimal
    ///
    /// # Panics
    /// Panics if the value is negative
    pub fn new(value: Decimal) -> Self {
        Self::try_new(value).expect("Price must be non-negative")
    }

    /// Try to create a Price, returning None if negative
    pub fn try_new(value: Decimal) -> Option<Self> {
        if value < Decimal::ZERO {
            return None;
        }
        Some(Self(value.round_dp_with_strategy(
            PRICE_SCALE,
            RoundingStrategy::MidpointAwayFromZero,
        )))
    }

    /// The zero price (market / cancel sentinel)
    pub fn zero() -> Self {
        Self(Decimal::ZERO)
    }

    /// Create from integer (for testing/convenience)
    pub fn from_u64(value: u64) -> Self {
        Self::new(Decimal::from(value))
    }

    /// Create from string
    pub fn from_str(s: &str) -> Result<Self, rust_decimal::Error> {
        let decimal = Decimal::from_str(s)?;
        Ok(Self::new(decimal))
    }

    /// Get the inner decimal value
    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    /// Check if the price is the zero sentinel
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }
}

// Custom serialization to preserve precision
impl Serialize for Price {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let decimal = Decimal::from_str(&s).map_err(serde::de::Error::custom)?;
        Self::try_new(decimal).ok_or_else(|| serde::de::Error::custom("Price must be non-negative"))
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
