//! Matching engine core
//!
//! Main coordinator between order submission, the store's transactional
//! boundary and the trade-term executor.

use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info, warn};
use types::ids::PairId;
use types::order::{NewOrder, Order, Side};

use crate::error::EngineError;
use crate::matching::{crossing, Execution, MatchExecutor};
use crate::outcome::MatchOutcome;
use crate::store::{MatchTransaction, OrderStore, Selection, StoreError};

/// Main matching engine
///
/// Holds no per-pair state of its own, so any number of callers may run
/// `attempt_match` concurrently on the same or different pairs.
#[derive(Clone)]
pub struct MatchEngine {
    store: Arc<dyn OrderStore>,
}

impl MatchEngine {
    pub fn new(store: Arc<dyn OrderStore>) -> Self {
        Self { store }
    }

    /// Validate a submission and persist it as an `OPEN` order
    pub async fn submit_order(&self, order: NewOrder) -> Result<Order, EngineError> {
        order.validate()?;
        let order = self.store.insert_order(order).await?;

        debug!(
            pair = %order.pair,
            order_id = %order.id,
            side = %order.side,
            price = %order.price,
            quantity = %order.quantity,
            "Order accepted"
        );
        Ok(order)
    }

    /// Run one match cycle on `pair`
    ///
    /// Commits at most one trade. Draining a crossed book is the caller's
    /// loop. Contention is reported, never waited on or retried.
    pub async fn attempt_match(&self, pair: &PairId) -> Result<MatchOutcome, EngineError> {
        let mut tx = self.store.begin().await?;

        let bid = match tx.select_best_open(pair, Side::Buy).await? {
            Selection::Selected(order) => order,
            other => return Self::finish_without_trade(tx, pair, other).await,
        };
        let ask = match tx.select_best_open(pair, Side::Sell).await? {
            Selection::Selected(order) => order,
            other => return Self::finish_without_trade(tx, pair, other).await,
        };

        if !crossing::can_match(bid.price, ask.price) {
            debug!(pair = %pair, bid = %bid.price, ask = %ask.price, "Book not crossed");
            tx.rollback().await?;
            return Ok(MatchOutcome::NoCross);
        }

        let execution = MatchExecutor::execute(&bid, &ask, Utc::now())?;

        if let Err(err) = Self::stage(tx.as_mut(), &execution).await {
            warn!(pair = %pair, error = %err, "Match aborted while staging");
            if let Err(rollback_err) = tx.rollback().await {
                warn!(pair = %pair, error = %rollback_err, "Rollback failed");
            }
            return Err(err.into());
        }

        if let Err(err) = tx.commit().await {
            warn!(pair = %pair, error = %err, "Match commit aborted");
            return Err(err.into());
        }

        let trade = execution.trade;
        info!(
            pair = %pair,
            trade_id = %trade.id,
            price = %trade.price,
            quantity = %trade.quantity,
            buy_order_id = %trade.buy_order_id,
            sell_order_id = %trade.sell_order_id,
            "Trade executed"
        );
        Ok(MatchOutcome::Executed(trade))
    }

    async fn stage(
        tx: &mut dyn MatchTransaction,
        execution: &Execution,
    ) -> Result<(), StoreError> {
        tx.insert_trade(&execution.trade).await?;
        for fill in [&execution.buy, &execution.sell] {
            tx.update_order_quantity_and_status(fill.order_id, fill.remaining, fill.status)
                .await?;
        }
        Ok(())
    }

    async fn finish_without_trade(
        tx: Box<dyn MatchTransaction>,
        pair: &PairId,
        selection: Selection,
    ) -> Result<MatchOutcome, EngineError> {
        tx.rollback().await?;
        match selection {
            Selection::Contended => {
                debug!(pair = %pair, "Skipped match, candidate held by another attempt");
                Ok(MatchOutcome::Contended)
            }
            _ => {
                debug!(pair = %pair, "Nothing to match, one side is empty");
                Ok(MatchOutcome::NoCross)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use types::ids::UserId;
    use types::numeric::{Price, Quantity};
    use types::order::OrderStatus;

    fn pair() -> PairId {
        PairId::try_new("BTCUSDT").unwrap()
    }

    fn submission(side: Side, price: u64, qty: &str) -> NewOrder {
        NewOrder {
            user_id: UserId::new(),
            pair: pair(),
            side,
            price: Price::from_u64(price),
            quantity: Quantity::from_str(qty).unwrap(),
        }
    }

    fn engine() -> (MatchEngine, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        (MatchEngine::new(store.clone()), store)
    }

    #[tokio::test]
    async fn test_engine_resting_order() {
        let (engine, _) = engine();
        let order = engine.submit_order(submission(Side::Buy, 50000, "1.0")).await.unwrap();

        assert_eq!(order.status, OrderStatus::Open);
        assert_eq!(engine.attempt_match(&pair()).await.unwrap(), MatchOutcome::NoCross);
    }

    #[tokio::test]
    async fn test_engine_rejects_invalid_submission() {
        let (engine, store) = engine();
        let err = engine.submit_order(submission(Side::Buy, 0, "1.0")).await.unwrap_err();

        assert!(matches!(err, EngineError::Validation(_)));
        assert!(store.list_open_orders(&pair(), Side::Buy).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_engine_full_match() {
        let (engine, store) = engine();
        let sell = engine.submit_order(submission(Side::Sell, 50000, "1.0")).await.unwrap();
        let buy = engine.submit_order(submission(Side::Buy, 50000, "1.0")).await.unwrap();

        let outcome = engine.attempt_match(&pair()).await.unwrap();
        let trade = outcome.trade().unwrap();
        assert_eq!(trade.quantity, Quantity::from_u64(1));

        for id in [sell.id, buy.id] {
            let order = store.get_order(id).await.unwrap().unwrap();
            assert_eq!(order.status, OrderStatus::Filled);
        }
    }

    #[tokio::test]
    async fn test_engine_partial_match() {
        let (engine, store) = engine();
        engine.submit_order(submission(Side::Sell, 50000, "0.5")).await.unwrap();
        let buy = engine.submit_order(submission(Side::Buy, 50000, "1.0")).await.unwrap();

        let outcome = engine.attempt_match(&pair()).await.unwrap();
        assert_eq!(outcome.trade().unwrap().quantity, Quantity::from_str("0.5").unwrap());

        let buy = store.get_order(buy.id).await.unwrap().unwrap();
        assert_eq!(buy.remaining_quantity, Quantity::from_str("0.5").unwrap());
        assert_eq!(buy.status, OrderStatus::Open);
    }

    #[tokio::test]
    async fn test_engine_no_cross() {
        let (engine, store) = engine();
        engine.submit_order(submission(Side::Sell, 51000, "1.0")).await.unwrap();
        engine.submit_order(submission(Side::Buy, 50000, "1.0")).await.unwrap();

        assert_eq!(engine.attempt_match(&pair()).await.unwrap(), MatchOutcome::NoCross);
        assert_eq!(store.claim_count(&pair()), 0);
    }

    #[tokio::test]
    async fn test_engine_reports_contention() {
        let (engine, store) = engine();
        engine.submit_order(submission(Side::Sell, 100, "1")).await.unwrap();
        engine.submit_order(submission(Side::Buy, 100, "1")).await.unwrap();

        let mut holder = store.begin().await.unwrap();
        assert!(matches!(
            holder.select_best_open(&pair(), Side::Sell).await.unwrap(),
            Selection::Selected(_)
        ));

        assert_eq!(engine.attempt_match(&pair()).await.unwrap(), MatchOutcome::Contended);
        // The skipped attempt released its own bid claim
        assert_eq!(store.claim_count(&pair()), 1);

        holder.rollback().await.unwrap();
        assert!(engine.attempt_match(&pair()).await.unwrap().is_executed());
    }
}
