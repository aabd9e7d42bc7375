//! Order lifecycle types
//!
//! An order is created `OPEN`, loses quantity only through matching, and
//! ends `FILLED` (remaining reached zero) or `CANCELLED`. Terminal orders
//! are never mutated again.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::OrderError;
use crate::ids::{OrderId, PairId, UserId};
use crate::numeric::{Price, Quantity};

/// Order side (buyer or seller)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    /// Buy order (bid)
    Buy,
    /// Sell order (ask)
    Sell,
}

impl Side {
    /// Wire and storage form
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Buy => "BUY",
            Side::Sell => "SELL",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "BUY" => Some(Side::Buy),
            "SELL" => Some(Side::Sell),
            _ => None,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Order status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderStatus {
    /// Resting and eligible for matching
    Open,
    /// Remaining quantity reached zero (terminal)
    Filled,
    /// Withdrawn before completion (terminal)
    Cancelled,
}

impl OrderStatus {
    /// Check if status is terminal (no further transitions possible)
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Filled | OrderStatus::Cancelled)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Open => "OPEN",
            OrderStatus::Filled => "FILLED",
            OrderStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "OPEN" => Some(OrderStatus::Open),
            "FILLED" => Some(OrderStatus::Filled),
            "CANCELLED" => Some(OrderStatus::Cancelled),
            _ => None,
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A limit order submission, before the venue assigns identity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewOrder {
    pub user_id: UserId,
    pub pair: PairId,
    pub side: Side,
    pub price: Price,
    pub quantity: Quantity,
}

impl NewOrder {
    /// Reject submissions that must never reach the book
    pub fn validate(&self) -> Result<(), OrderError> {
        if self.price.is_zero() || self.price.as_decimal().is_sign_negative() {
            return Err(OrderError::InvalidPrice(self.price.to_string()));
        }
        if !self.price.is_within_bounds() {
            return Err(OrderError::InvalidPrice(format!("{} is out of range", self.price)));
        }
        if self.quantity.is_zero() || self.quantity.as_decimal().is_sign_negative() {
            return Err(OrderError::InvalidQuantity(self.quantity.to_string()));
        }
        if !self.quantity.is_within_bounds() {
            return Err(OrderError::InvalidQuantity(format!("{} is out of range", self.quantity)));
        }
        Ok(())
    }

    /// Materialize as a fresh `OPEN` order
    pub fn into_order(self, created_at: DateTime<Utc>) -> Order {
        Order {
            id: OrderId::new(),
            user_id: self.user_id,
            pair: self.pair,
            side: self.side,
            price: self.price,
            quantity: self.quantity,
            remaining_quantity: self.quantity,
            status: OrderStatus::Open,
            created_at,
        }
    }
}

/// Resting limit order
///
/// Invariant: `0 <= remaining_quantity <= quantity`, and `status` is
/// `Filled` exactly when a match drove `remaining_quantity` to zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub pair: PairId,
    pub side: Side,
    pub price: Price,
    /// Original quantity
    pub quantity: Quantity,
    pub remaining_quantity: Quantity,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Check quantity invariant
    pub fn check_invariant(&self) -> bool {
        let bounded = self.remaining_quantity <= self.quantity;
        let status_consistent = match self.status {
            OrderStatus::Filled => self.remaining_quantity.is_zero(),
            OrderStatus::Open => !self.remaining_quantity.is_zero(),
            OrderStatus::Cancelled => true,
        };
        bounded && status_consistent
    }

    pub fn is_open(&self) -> bool {
        self.status == OrderStatus::Open
    }

    /// Quantity already executed
    pub fn filled_quantity(&self) -> Quantity {
        self.quantity
            .checked_sub(self.remaining_quantity)
            .unwrap_or_else(Quantity::zero)
    }

    /// Compute the post-fill remaining quantity and status without mutating
    pub fn fill(&self, fill_quantity: Quantity) -> Result<(Quantity, OrderStatus), OrderError> {
        if self.status.is_terminal() {
            return Err(OrderError::AlreadyTerminal {
                status: self.status.to_string(),
            });
        }

        let remaining = self
            .remaining_quantity
            .checked_sub(fill_quantity)
            .ok_or_else(|| OrderError::Overfill {
                fill: fill_quantity.to_string(),
                remaining: self.remaining_quantity.to_string(),
            })?;

        let status = if remaining.is_zero() {
            OrderStatus::Filled
        } else {
            OrderStatus::Open
        };

        Ok((remaining, status))
    }

    /// Apply a fill in place
    pub fn apply_fill(&mut self, fill_quantity: Quantity) -> Result<(), OrderError> {
        let (remaining, status) = self.fill(fill_quantity)?;
        self.remaining_quantity = remaining;
        self.status = status;
        debug_assert!(self.check_invariant(), "Invariant violated after fill");
        Ok(())
    }
}
