//! Read-side view of a pair's book
//!
//! `OrderBook` answers best-bid / best-ask / depth queries against the
//! injected store without taking any order claims, so it can run freely
//! alongside match attempts.

use std::sync::Arc;
use types::ids::PairId;
use types::order::{Order, Side};

use super::snapshot::BookSnapshot;
use crate::store::{OrderStore, StoreError};

#[derive(Clone)]
pub struct OrderBook {
    store: Arc<dyn OrderStore>,
}

impl OrderBook {
    pub fn new(store: Arc<dyn OrderStore>) -> Self {
        Self { store }
    }

    /// Highest-priced open buy order, earliest first on ties
    pub async fn best_bid(&self, pair: &PairId) -> Result<Option<Order>, StoreError> {
        self.store.peek_best_open(pair, Side::Buy).await
    }

    /// Lowest-priced open sell order, earliest first on ties
    pub async fn best_ask(&self, pair: &PairId) -> Result<Option<Order>, StoreError> {
        self.store.peek_best_open(pair, Side::Sell).await
    }

    /// Aggregated depth of both sides, at most `depth` levels each
    ///
    /// The two sides are read concurrently and joined before assembly.
    pub async fn snapshot(&self, pair: &PairId, depth: usize) -> Result<BookSnapshot, StoreError> {
        let (bids, asks) = tokio::join!(
            self.store.price_levels(pair, Side::Buy, depth),
            self.store.price_levels(pair, Side::Sell, depth),
        );

        Ok(BookSnapshot {
            pair: pair.clone(),
            bids: bids?,
            asks: asks?,
        })
    }
}
