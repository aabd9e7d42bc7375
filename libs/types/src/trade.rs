//! Trade execution types

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::ids::{OrderId, PairId, TradeId};
use crate::numeric::{Price, Quantity};

/// Immutable record of one execution between a buy and a sell order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub id: TradeId,
    pub pair: PairId,
    pub buy_order_id: OrderId,
    pub sell_order_id: OrderId,
    pub price: Price,
    pub quantity: Quantity,
    pub executed_at: DateTime<Utc>,
}

impl Trade {
    /// Create a new trade with a fresh id
    pub fn new(
        pair: PairId,
        buy_order_id: OrderId,
        sell_order_id: OrderId,
        price: Price,
        quantity: Quantity,
        executed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: TradeId::new(),
            pair,
            buy_order_id,
            sell_order_id,
            price,
            quantity,
            executed_at,
        }
    }

    /// Calculate trade value (price × quantity), None on overflow
    pub fn notional(&self) -> Option<Decimal> {
        self.quantity.notional(self.price)
    }
}
