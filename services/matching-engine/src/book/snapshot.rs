//! Aggregated depth snapshots
//!
//! A snapshot is a point-in-time read of the open orders on both sides of
//! a pair, grouped by exact price. It never locks or mutates orders.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use types::ids::PairId;
use types::numeric::{Price, Quantity};
use types::order::{Order, Side};

/// Depth returned when the caller does not ask for one
pub const DEFAULT_BOOK_DEPTH: usize = 50;

/// One aggregated price level: the summed remaining quantity at `price`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceLevelView {
    pub price: Price,
    pub quantity: Quantity,
}

impl PriceLevelView {
    pub fn new(price: Price, quantity: Quantity) -> Self {
        Self { price, quantity }
    }
}

/// Both sides of a pair's book, best levels first
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookSnapshot {
    pub pair: PairId,
    /// Price descending
    pub bids: Vec<PriceLevelView>,
    /// Price ascending
    pub asks: Vec<PriceLevelView>,
}

impl BookSnapshot {
    pub fn empty(pair: PairId) -> Self {
        Self {
            pair,
            bids: Vec::new(),
            asks: Vec::new(),
        }
    }

    pub fn best_bid(&self) -> Option<Price> {
        self.bids.first().map(|level| level.price)
    }

    pub fn best_ask(&self) -> Option<Price> {
        self.asks.first().map(|level| level.price)
    }

    /// A crossed book still has work for the match engine
    pub fn is_crossed(&self) -> bool {
        matches!((self.best_bid(), self.best_ask()), (Some(bid), Some(ask)) if bid >= ask)
    }
}

/// Group open orders of `side` by exact price and keep the best `depth` levels
///
/// Orders on the other side or no longer open are ignored, so callers may
/// pass an unfiltered listing. None if a level total leaves `Decimal` range.
pub fn aggregate_levels<'a>(
    orders: impl IntoIterator<Item = &'a Order>,
    side: Side,
    depth: usize,
) -> Option<Vec<PriceLevelView>> {
    let mut levels: BTreeMap<Price, Quantity> = BTreeMap::new();
    for order in orders {
        if order.side != side || !order.is_open() {
            continue;
        }
        let total = levels.entry(order.price).or_insert_with(Quantity::zero);
        *total = total.checked_add(order.remaining_quantity)?;
    }

    let levels = levels
        .into_iter()
        .map(|(price, quantity)| PriceLevelView::new(price, quantity));

    Some(match side {
        Side::Buy => levels.rev().take(depth).collect(),
        Side::Sell => levels.take(depth).collect(),
    })
}
