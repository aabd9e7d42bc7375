//! Bid (buy-side) order book
//!
//! Maintains buy orders sorted by price descending (best bid first).
//! BTreeMap keeps iteration deterministic.

use std::collections::BTreeMap;
use types::ids::OrderId;
use types::numeric::{Price, Quantity};
use types::order::Order;

use super::price_level::PriceLevel;
use super::snapshot::PriceLevelView;

/// Bid (buy) side order book
///
/// Orders are sorted by price descending, so the highest bid is first.
/// At each price level, orders are maintained in FIFO order.
#[derive(Debug, Clone, Default)]
pub struct BidBook {
    /// BTreeMap iterates ascending, so the best bid is the last key
    levels: BTreeMap<Price, PriceLevel>,
}

impl BidBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an order at the back of its price level
    ///
    /// Returns false, leaving the book untouched, if the level total would
    /// leave `Decimal` range.
    pub fn insert(&mut self, order: &Order) -> bool {
        self.levels
            .entry(order.price)
            .or_default()
            .insert(order.id, order.remaining_quantity)
    }

    /// Set a resting order's remaining quantity; zero removes it
    pub fn update(&mut self, order_id: &OrderId, price: Price, remaining: Quantity) -> bool {
        let Some(level) = self.levels.get_mut(&price) else {
            return false;
        };
        let updated = level.update_quantity(order_id, remaining);
        if level.is_empty() {
            self.levels.remove(&price);
        }
        updated
    }

    /// Highest-priced, earliest order
    pub fn best_order_id(&self) -> Option<OrderId> {
        self.levels
            .values()
            .next_back()
            .and_then(|level| level.peek_front())
            .map(|(order_id, _)| order_id)
    }

    /// All order ids in price-time priority
    pub fn order_ids(&self) -> Vec<OrderId> {
        self.levels
            .values()
            .rev()
            .flat_map(|level| level.order_ids())
            .collect()
    }

    /// Get depth snapshot (top N price levels)
    pub fn depth_snapshot(&self, depth: usize) -> Vec<PriceLevelView> {
        self.levels
            .iter()
            .rev()
            .take(depth)
            .map(|(price, level)| PriceLevelView::new(*price, level.total_quantity()))
            .collect()
    }
}
