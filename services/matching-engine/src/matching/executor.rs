//! Trade execution logic
//!
//! Computes the terms of a single bid/ask execution: quantity is the smaller
//! remaining quantity and the price is always the ask's limit price, no
//! matter which order rested first. Both orders' post-fill state is derived
//! here so the engine only has to persist it.

use chrono::{DateTime, Utc};
use types::errors::TradeError;
use types::ids::OrderId;
use types::numeric::{Price, Quantity};
use types::order::{Order, OrderStatus, Side};
use types::trade::Trade;

use super::crossing;

/// Post-fill state of one participant
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrderFill {
    pub order_id: OrderId,
    pub remaining: Quantity,
    pub status: OrderStatus,
}

/// Everything a match commits: one trade and both order updates
#[derive(Debug, Clone, PartialEq)]
pub struct Execution {
    pub trade: Trade,
    pub buy: OrderFill,
    pub sell: OrderFill,
}

/// Stateless trade-term calculator
pub struct MatchExecutor;

impl MatchExecutor {
    /// Execute `bid` against `ask`
    pub fn execute(bid: &Order, ask: &Order, executed_at: DateTime<Utc>) -> Result<Execution, TradeError> {
        if bid.side != Side::Buy || ask.side != Side::Sell {
            return Err(TradeError::InvalidTrade {
                reason: format!("expected BUY against SELL, got {} against {}", bid.side, ask.side),
            });
        }
        if bid.pair != ask.pair {
            return Err(TradeError::InvalidTrade {
                reason: format!("orders belong to different pairs: {} and {}", bid.pair, ask.pair),
            });
        }
        if !crossing::can_match(bid.price, ask.price) {
            return Err(TradeError::NoCross {
                bid: bid.price.to_string(),
                ask: ask.price.to_string(),
            });
        }

        let quantity = bid.remaining_quantity.min(ask.remaining_quantity);
        if quantity.is_zero() {
            return Err(TradeError::InvalidTrade {
                reason: "nothing left to fill".to_string(),
            });
        }
        let price = Self::execution_price(bid, ask);

        if quantity.notional(price).is_none() {
            return Err(TradeError::InvalidTrade {
                reason: format!("notional of {quantity} at {price} is out of range"),
            });
        }

        let (buy_remaining, buy_status) = bid.fill(quantity)?;
        let (sell_remaining, sell_status) = ask.fill(quantity)?;

        Ok(Execution {
            trade: Trade::new(bid.pair.clone(), bid.id, ask.id, price, quantity, executed_at),
            buy: OrderFill {
                order_id: bid.id,
                remaining: buy_remaining,
                status: buy_status,
            },
            sell: OrderFill {
                order_id: ask.id,
                remaining: sell_remaining,
                status: sell_status,
            },
        })
    }

    /// Trades always print at the ask
    fn execution_price(_bid: &Order, ask: &Order) -> Price {
        ask.price
    }
}
