//! Fixed-point decimal types for prices and quantities
//!
//! Uses rust_decimal for deterministic arithmetic (no floating-point errors).
//! Both types are non-negative; zero is a valid quantity (a fully filled
//! order) but never a valid limit price, which `NewOrder::validate` enforces.
//!
//! Accepted submissions are bounded by `MAX_UNITS` and `MAX_SCALE`, which
//! keeps every notional and level total inside `Decimal` range. The checked
//! operations below still report overflow instead of panicking.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::OrderError;

/// Largest accepted price or quantity, in whole units
pub const MAX_UNITS: u64 = 1_000_000_000_000;

/// Most fractional digits accepted on a price or quantity
pub const MAX_SCALE: u32 = 12;

fn within_bounds(value: Decimal) -> bool {
    value <= Decimal::from(MAX_UNITS) && value.normalize().scale() <= MAX_SCALE
}

/// Limit or execution price
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(Decimal);

impl Price {
    /// Create a price, rejecting negative values
    pub fn try_new(value: Decimal) -> Result<Self, OrderError> {
        if value.is_sign_negative() && !value.is_zero() {
            return Err(OrderError::InvalidPrice(value.to_string()));
        }
        Ok(Self(value.normalize()))
    }

    /// Whole-unit price
    pub fn from_u64(value: u64) -> Self {
        Self(Decimal::from(value))
    }

    /// Parse an exact decimal string such as "41000.25"
    pub fn from_str(s: &str) -> Result<Self, OrderError> {
        let value = s
            .parse::<Decimal>()
            .map_err(|_| OrderError::InvalidPrice(s.to_string()))?;
        Self::try_new(value)
    }

    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// At most `MAX_UNITS` with at most `MAX_SCALE` fractional digits
    pub fn is_within_bounds(&self) -> bool {
        within_bounds(self.0)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Order, level or trade quantity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Quantity(Decimal);

impl Quantity {
    /// Create a quantity, rejecting negative values
    pub fn try_new(value: Decimal) -> Result<Self, OrderError> {
        if value.is_sign_negative() && !value.is_zero() {
            return Err(OrderError::InvalidQuantity(value.to_string()));
        }
        Ok(Self(value.normalize()))
    }

    pub fn zero() -> Self {
        Self(Decimal::ZERO)
    }

    pub fn from_u64(value: u64) -> Self {
        Self(Decimal::from(value))
    }

    /// Parse an exact decimal string such as "0.5"
    pub fn from_str(s: &str) -> Result<Self, OrderError> {
        let value = s
            .parse::<Decimal>()
            .map_err(|_| OrderError::InvalidQuantity(s.to_string()))?;
        Self::try_new(value)
    }

    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// At most `MAX_UNITS` with at most `MAX_SCALE` fractional digits
    pub fn is_within_bounds(&self) -> bool {
        within_bounds(self.0)
    }

    pub fn min(self, other: Self) -> Self {
        if self <= other {
            self
        } else {
            other
        }
    }

    /// Subtract, returning None if the result would go negative
    pub fn checked_sub(self, other: Self) -> Option<Self> {
        if other > self {
            return None;
        }
        Some(Self((self.0 - other.0).normalize()))
    }

    /// Add, returning None if the total leaves `Decimal` range
    pub fn checked_add(self, other: Self) -> Option<Self> {
        self.0.checked_add(other.0).map(|total| Self(total.normalize()))
    }

    /// Value of this quantity at `price`, None on overflow
    pub fn notional(&self, price: Price) -> Option<Decimal> {
        self.0.checked_mul(price.as_decimal())
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
