//! Error types for the venue domain
//!
//! Validation and lifecycle errors using thiserror

use thiserror::Error;

/// Order-specific errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum OrderError {
    #[error("Invalid price: {0}")]
    InvalidPrice(String),

    #[error("Invalid quantity: {0}")]
    InvalidQuantity(String),

    #[error("Invalid pair: {0:?}")]
    InvalidPair(String),

    #[error("Order already in terminal state: {status}")]
    AlreadyTerminal { status: String },

    #[error("Fill of {fill} exceeds remaining quantity {remaining}")]
    Overfill { fill: String, remaining: String },
}

impl OrderError {
    /// True for malformed submissions, as opposed to lifecycle violations
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            OrderError::InvalidPrice(_) | OrderError::InvalidQuantity(_) | OrderError::InvalidPair(_)
        )
    }
}

/// Trade-specific errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TradeError {
    #[error("Orders do not cross: bid {bid} < ask {ask}")]
    NoCross { bid: String, ask: String },

    #[error("Invalid trade: {reason}")]
    InvalidTrade { reason: String },

    #[error("Order error: {0}")]
    Order(#[from] OrderError),
}
