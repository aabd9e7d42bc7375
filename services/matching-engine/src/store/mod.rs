//! Order Store adapter contract
//!
//! The engine owns no durable state. Orders, trades and wallets live behind
//! these traits; every mutation made by a match goes through one
//! `MatchTransaction`, which either commits whole or leaves nothing behind.
//!
//! Exclusivity is lock-or-skip: `select_best_open` claims the best candidate
//! for the calling transaction, and reports `Selection::Contended` instead
//! of waiting when another live transaction already holds it. Claims end
//! with the transaction (commit, rollback or drop).

use async_trait::async_trait;
use thiserror::Error;
use types::ids::{OrderId, PairId, UserId};
use types::numeric::Quantity;
use types::order::{NewOrder, Order, OrderStatus, Side};
use types::trade::Trade;
use types::wallet::Wallet;

use crate::book::snapshot::{aggregate_levels, PriceLevelView};

pub mod memory;
#[cfg(feature = "postgres")]
pub mod postgres;

pub use memory::MemoryStore;
#[cfg(feature = "postgres")]
pub use postgres::PgStore;

/// Persistence errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Transaction conflict: {0}")]
    Conflict(String),

    #[error("Order {0} is not held by this transaction")]
    NotHeld(OrderId),

    #[error("Storage backend error: {0}")]
    Backend(String),

    #[error("Corrupt record: {0}")]
    Corrupt(String),
}

impl StoreError {
    /// Whether the caller may simply try again later
    pub fn is_retryable(&self) -> bool {
        matches!(self, StoreError::Unavailable(_) | StoreError::Conflict(_))
    }
}

/// Result of trying to claim the best open order of one side
#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    /// Claimed for this transaction
    Selected(Order),
    /// No open order on this side
    Empty,
    /// Best candidate is held by another transaction
    Contended,
}

/// Durable order records
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Persist a validated submission as an `OPEN` order
    ///
    /// The store assigns the id and a creation timestamp that never goes
    /// backwards within a pair.
    async fn insert_order(&self, order: NewOrder) -> Result<Order, StoreError>;

    async fn get_order(&self, order_id: OrderId) -> Result<Option<Order>, StoreError>;

    /// Open orders of one side in price-time priority, without claiming them
    async fn list_open_orders(&self, pair: &PairId, side: Side) -> Result<Vec<Order>, StoreError>;

    /// Best open order of one side, without claiming it
    async fn peek_best_open(&self, pair: &PairId, side: Side) -> Result<Option<Order>, StoreError> {
        Ok(self.list_open_orders(pair, side).await?.into_iter().next())
    }

    /// Aggregated depth of one side, best level first
    async fn price_levels(
        &self,
        pair: &PairId,
        side: Side,
        depth: usize,
    ) -> Result<Vec<PriceLevelView>, StoreError> {
        let orders = self.list_open_orders(pair, side).await?;
        aggregate_levels(&orders, side, depth)
            .ok_or_else(|| StoreError::Corrupt(format!("level totals on {pair} are out of range")))
    }

    /// Open one atomic unit of work for a match attempt
    async fn begin(&self) -> Result<Box<dyn MatchTransaction>, StoreError>;
}

/// One match attempt's unit of work
///
/// Dropping a transaction without committing rolls it back and releases
/// its claims.
#[async_trait]
pub trait MatchTransaction: Send {
    /// Claim the best open order of `side` (lock-or-skip, never waits)
    async fn select_best_open(&mut self, pair: &PairId, side: Side) -> Result<Selection, StoreError>;

    async fn insert_trade(&mut self, trade: &Trade) -> Result<(), StoreError>;

    /// Only orders claimed by this transaction may be updated
    async fn update_order_quantity_and_status(
        &mut self,
        order_id: OrderId,
        remaining: Quantity,
        status: OrderStatus,
    ) -> Result<(), StoreError>;

    async fn commit(self: Box<Self>) -> Result<(), StoreError>;

    async fn rollback(self: Box<Self>) -> Result<(), StoreError>;
}

/// Per-user, per-currency holdings (read-only)
#[async_trait]
pub trait WalletStore: Send + Sync {
    async fn wallets_of(&self, user_id: UserId) -> Result<Vec<Wallet>, StoreError>;
}
