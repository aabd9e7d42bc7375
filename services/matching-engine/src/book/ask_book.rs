//! Ask (sell-side) order book
//!
//! Maintains sell orders sorted by price ascending (best ask first).

use std::collections::BTreeMap;
use types::ids::OrderId;
use types::numeric::{Price, Quantity};
use types::order::Order;

use super::price_level::PriceLevel;
use super::snapshot::PriceLevelView;

/// Ask (sell) side order book
///
/// Orders are sorted by price ascending, so the lowest ask is first.
/// At each price level, orders are maintained in FIFO order.
#[derive(Debug, Clone, Default)]
pub struct AskBook {
    levels: BTreeMap<Price, PriceLevel>,
}

impl AskBook {
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

    /// Lowest-priced, earliest order
    pub fn best_order_id(&self) -> Option<OrderId> {
        self.levels
            .values()
            .next()
            .and_then(|level| level.peek_front())
            .map(|(order_id, _)| order_id)
    }

    /// All order ids in price-time priority
    pub fn order_ids(&self) -> Vec<OrderId> {
        self.levels
            .values()
            .flat_map(|level| level.order_ids())
            .collect()
    }

    /// Get depth snapshot (top N price levels)
    pub fn depth_snapshot(&self, depth: usize) -> Vec<PriceLevelView> {
        self.levels
            .iter()
            .take(depth)
            .map(|(price, level)| PriceLevelView::new(*price, level.total_quantity()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use types::ids::{PairId, UserId};
    use types::order::{NewOrder, Side};

    fn create_test_order(price_val: u64, qty_str: &str) -> Order {
        NewOrder {
            user_id: UserId::new(),
            pair: PairId::try_new("BTCUSDT").unwrap(),
            side: Side::Sell,
            price: Price::from_u64(price_val),
            quantity: Quantity::from_str(qty_str).unwrap(),
        }
        .into_order(Utc::now())
    }

    #[test]
    fn test_ask_book_best_order() {
        let mut book = AskBook::new();

        let order1 = create_test_order(50000, "1.0");
        let order2 = create_test_order(51000, "2.0");
        let order3 = create_test_order(49000, "1.5");

        assert!(book.insert(&order1));
        assert!(book.insert(&order2));
        assert!(book.insert(&order3));

        assert_eq!(book.best_order_id(), Some(order3.id));
        let top = book.depth_snapshot(1);
        assert_eq!(top[0].price, Price::from_u64(49000));
        assert_eq!(top[0].quantity, Quantity::from_str("1.5").unwrap());
    }

    #[test]
    fn test_ask_book_fill_to_zero_drops_level() {
        let mut book = AskBook::new();
        let order = create_test_order(50000, "1.0");
        book.insert(&order);

        assert!(book.update(&order.id, order.price, Quantity::from_str("0.4").unwrap()));
        assert_eq!(book.depth_snapshot(1)[0].quantity, Quantity::from_str("0.4").unwrap());

        assert!(book.update(&order.id, order.price, Quantity::zero()));
        assert!(book.depth_snapshot(10).is_empty());
        assert_eq!(book.best_order_id(), None);
        assert!(!book.update(&order.id, order.price, Quantity::zero()));
    }

    #[test]
    fn test_ask_book_depth_snapshot() {
        let mut book = AskBook::new();

        book.insert(&create_test_order(50000, "1.0"));
        book.insert(&create_test_order(51000, "2.0"));
        book.insert(&create_test_order(49000, "1.5"));
        book.insert(&create_test_order(52000, "0.5"));

        let depth = book.depth_snapshot(2);

        assert_eq!(depth.len(), 2);
        assert_eq!(depth[0].price, Price::from_u64(49000));
        assert_eq!(depth[1].price, Price::from_u64(50000));
    }

    #[test]
    fn test_ask_book_price_time_priority() {
        let mut book = AskBook::new();

        let order1 = create_test_order(50000, "1.0");
        let order2 = create_test_order(50000, "2.0");
        let order3 = create_test_order(49500, "0.1");

        book.insert(&order1);
        book.insert(&order2);
        book.insert(&order3);

        assert_eq!(book.depth_snapshot(10).len(), 2);
        assert_eq!(book.order_ids(), vec![order3.id, order1.id, order2.id]);

        book.update(&order3.id, order3.price, Quantity::zero());
        assert_eq!(book.best_order_id(), Some(order1.id));
        assert_eq!(book.depth_snapshot(1)[0].quantity, Quantity::from_str("3.0").unwrap());

        book.update(&order1.id, order1.price, Quantity::zero());
        assert_eq!(book.best_order_id(), Some(order2.id));
    }
}
