//! In-memory Order Store
//!
//! Each pair owns a `PairBook` behind its own mutex, registered in a
//! `DashMap`, so no lock ever spans two pairs outside of a commit that
//! touches both. Claims are a per-pair set of order ids held by live
//! transactions.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::{Mutex, MutexGuard};
use rust_decimal::Decimal;
use std::collections::hash_map::Entry;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;
use tracing::debug;
use types::ids::{OrderId, PairId, UserId};
use types::numeric::Quantity;
use types::order::{NewOrder, Order, OrderStatus, Side};
use types::trade::Trade;
use types::wallet::Wallet;

use super::{MatchTransaction, OrderStore, Selection, StoreError, WalletStore};
use crate::book::{AskBook, BidBook, PriceLevelView};

/// Process-local store backing tests and single-node deployments
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    pairs: DashMap<PairId, Arc<Mutex<PairBook>>>,
    order_index: DashMap<OrderId, PairId>,
    wallets: DashMap<UserId, Vec<Wallet>>,
}

#[derive(Default)]
struct PairBook {
    /// Every order ever submitted on the pair, terminal ones included
    orders: HashMap<OrderId, Order>,
    bids: BidBook,
    asks: AskBook,
    trades: Vec<Trade>,
    /// Orders held by a live transaction
    claims: HashSet<OrderId>,
    last_created_at: Option<DateTime<Utc>>,
}

impl PairBook {
    /// Clamp `now` so creation time never goes backwards within the pair
    fn next_timestamp(&mut self, now: DateTime<Utc>) -> DateTime<Utc> {
        let stamped = match self.last_created_at {
            Some(last) if now < last => last,
            _ => now,
        };
        self.last_created_at = Some(stamped);
        stamped
    }

    /// Index and record a new order; nothing changes if indexing fails
    fn rest(&mut self, order: Order) -> Result<(), StoreError> {
        let indexed = match order.side {
            Side::Buy => self.bids.insert(&order),
            Side::Sell => self.asks.insert(&order),
        };
        if !indexed {
            return Err(StoreError::Backend(format!(
                "level total at {} {} is out of range",
                order.side, order.price
            )));
        }
        self.orders.insert(order.id, order);
        Ok(())
    }

    fn best_order_id(&self, side: Side) -> Option<OrderId> {
        match side {
            Side::Buy => self.bids.best_order_id(),
            Side::Sell => self.asks.best_order_id(),
        }
    }

    fn open_orders(&self, side: Side) -> Vec<Order> {
        let ids = match side {
            Side::Buy => self.bids.order_ids(),
            Side::Sell => self.asks.order_ids(),
        };
        ids.iter().filter_map(|id| self.orders.get(id).cloned()).collect()
    }

    fn record(&self, order_id: &OrderId) -> Result<&Order, StoreError> {
        self.orders
            .get(order_id)
            .ok_or_else(|| StoreError::Corrupt(format!("indexed order {order_id} has no record")))
    }

    /// Write a validated order state back, keeping the side index in step
    fn replace(&mut self, order: Order) {
        let indexed = match order.side {
            Side::Buy => self.bids.update(&order.id, order.price, order.remaining_quantity),
            Side::Sell => self.asks.update(&order.id, order.price, order.remaining_quantity),
        };
        debug_assert!(indexed, "updated order was not resting in the book");
        self.orders.insert(order.id, order);
    }
}

impl Inner {
    fn pair(&self, pair: &PairId) -> Option<Arc<Mutex<PairBook>>> {
        self.pairs.get(pair).map(|entry| Arc::clone(entry.value()))
    }

    fn pair_or_insert(&self, pair: &PairId) -> Arc<Mutex<PairBook>> {
        Arc::clone(self.pairs.entry(pair.clone()).or_default().value())
    }

    /// Run `f` under the pair lock; None if the pair has never seen an order
    fn with_pair<R>(&self, pair: &PairId, f: impl FnOnce(&mut PairBook) -> R) -> Option<R> {
        let shared = self.pair(pair)?;
        let mut book = shared.lock();
        Some(f(&mut book))
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load or overwrite a wallet balance
    ///
    /// The venue defines no balance write path; this exists for fixtures
    /// and for seeding a local deployment.
    pub fn seed_wallet(&self, user_id: UserId, currency: &str, balance: Decimal) -> Wallet {
        let mut wallets = self.inner.wallets.entry(user_id).or_default();
        if let Some(wallet) = wallets.iter_mut().find(|w| w.currency == currency) {
            wallet.balance = balance;
            return wallet.clone();
        }
        let wallet = Wallet::new(user_id, currency, balance);
        wallets.push(wallet.clone());
        wallet
    }

    /// Trades committed on `pair`, oldest first
    pub fn trades(&self, pair: &PairId) -> Vec<Trade> {
        self.inner
            .with_pair(pair, |book| book.trades.clone())
            .unwrap_or_default()
    }

    /// Number of orders on `pair` currently held by live transactions
    pub fn claim_count(&self, pair: &PairId) -> usize {
        self.inner
            .with_pair(pair, |book| book.claims.len())
            .unwrap_or(0)
    }
}

#[async_trait]
impl OrderStore for MemoryStore {
    async fn insert_order(&self, order: NewOrder) -> Result<Order, StoreError> {
        let shared = self.inner.pair_or_insert(&order.pair);
        let mut book = shared.lock();

        let created_at = book.next_timestamp(Utc::now());
        let order = order.into_order(created_at);
        book.rest(order.clone())?;
        self.inner.order_index.insert(order.id, order.pair.clone());

        Ok(order)
    }

    async fn get_order(&self, order_id: OrderId) -> Result<Option<Order>, StoreError> {
        let Some(pair) = self.inner.order_index.get(&order_id).map(|p| p.value().clone()) else {
            return Ok(None);
        };
        Ok(self
            .inner
            .with_pair(&pair, |book| book.orders.get(&order_id).cloned())
            .flatten())
    }

    async fn list_open_orders(&self, pair: &PairId, side: Side) -> Result<Vec<Order>, StoreError> {
        Ok(self
            .inner
            .with_pair(pair, |book| book.open_orders(side))
            .unwrap_or_default())
    }

    async fn peek_best_open(&self, pair: &PairId, side: Side) -> Result<Option<Order>, StoreError> {
        let best = self.inner.with_pair(pair, |book| match book.best_order_id(side) {
            Some(order_id) => book.record(&order_id).map(|order| Some(order.clone())),
            None => Ok(None),
        });
        best.unwrap_or(Ok(None))
    }

    async fn price_levels(
        &self,
        pair: &PairId,
        side: Side,
        depth: usize,
    ) -> Result<Vec<PriceLevelView>, StoreError> {
        Ok(self
            .inner
            .with_pair(pair, |book| match side {
                Side::Buy => book.bids.depth_snapshot(depth),
                Side::Sell => book.asks.depth_snapshot(depth),
            })
            .unwrap_or_default())
    }

    async fn begin(&self) -> Result<Box<dyn MatchTransaction>, StoreError> {
        Ok(Box::new(MemoryTransaction {
            inner: Arc::clone(&self.inner),
            held: HashMap::new(),
            trades: Vec::new(),
            updates: Vec::new(),
        }))
    }
}

#[async_trait]
impl WalletStore for MemoryStore {
    async fn wallets_of(&self, user_id: UserId) -> Result<Vec<Wallet>, StoreError> {
        Ok(self
            .inner
            .wallets
            .get(&user_id)
            .map(|wallets| wallets.value().clone())
            .unwrap_or_default())
    }
}

struct StagedUpdate {
    pair: PairId,
    order_id: OrderId,
    remaining: Quantity,
    status: OrderStatus,
}

/// Staged writes plus the claims this attempt holds
struct MemoryTransaction {
    inner: Arc<Inner>,
    held: HashMap<OrderId, PairId>,
    trades: Vec<Trade>,
    updates: Vec<StagedUpdate>,
}

impl MemoryTransaction {
    fn release_claims(&mut self) {
        for (order_id, pair) in self.held.drain() {
            self.inner.with_pair(&pair, |book| book.claims.remove(&order_id));
        }
    }

    /// Check every staged write against current state, returning the
    /// post-commit order records without touching the books
    fn validate(
        &self,
        books: &HashMap<PairId, MutexGuard<'_, PairBook>>,
    ) -> Result<Vec<(PairId, Order)>, StoreError> {
        let mut projected: HashMap<OrderId, (PairId, Order)> = HashMap::new();

        for update in &self.updates {
            let book = books
                .get(&update.pair)
                .ok_or_else(|| StoreError::Conflict(format!("unknown pair {}", update.pair)))?;

            let (_, order) = match projected.entry(update.order_id) {
                Entry::Occupied(entry) => entry.into_mut(),
                Entry::Vacant(entry) => {
                    let current = book.record(&update.order_id)?.clone();
                    entry.insert((update.pair.clone(), current))
                }
            };

            if !order.is_open() {
                return Err(StoreError::Conflict(format!(
                    "order {} is already {}",
                    order.id, order.status
                )));
            }
            if update.remaining > order.remaining_quantity {
                return Err(StoreError::Conflict(format!(
                    "order {} remaining would grow from {} to {}",
                    order.id, order.remaining_quantity, update.remaining
                )));
            }
            let consistent = match update.status {
                OrderStatus::Filled => update.remaining.is_zero(),
                OrderStatus::Open => !update.remaining.is_zero(),
                OrderStatus::Cancelled => false,
            };
            if !consistent {
                return Err(StoreError::Corrupt(format!(
                    "order {} cannot be {} with remaining {}",
                    order.id, update.status, update.remaining
                )));
            }

            order.remaining_quantity = update.remaining;
            order.status = update.status;
        }

        for trade in &self.trades {
            let book = books
                .get(&trade.pair)
                .ok_or_else(|| StoreError::Conflict(format!("unknown pair {}", trade.pair)))?;
            for order_id in [trade.buy_order_id, trade.sell_order_id] {
                if !self.held.contains_key(&order_id) {
                    return Err(StoreError::NotHeld(order_id));
                }
                book.record(&order_id)?;
            }
        }

        Ok(projected.into_values().collect())
    }
}

#[async_trait]
impl MatchTransaction for MemoryTransaction {
    async fn select_best_open(&mut self, pair: &PairId, side: Side) -> Result<Selection, StoreError> {
        let Some(shared) = self.inner.pair(pair) else {
            return Ok(Selection::Empty);
        };
        let mut book = shared.lock();

        let Some(order_id) = book.best_order_id(side) else {
            return Ok(Selection::Empty);
        };
        let order = book.record(&order_id)?.clone();

        if self.held.contains_key(&order_id) {
            return Ok(Selection::Selected(order));
        }
        if !book.claims.insert(order_id) {
            debug!(pair = %pair, side = %side, order_id = %order_id, "Best order held elsewhere");
            return Ok(Selection::Contended);
        }

        self.held.insert(order_id, pair.clone());
        Ok(Selection::Selected(order))
    }

    async fn insert_trade(&mut self, trade: &Trade) -> Result<(), StoreError> {
        self.trades.push(trade.clone());
        Ok(())
    }

    async fn update_order_quantity_and_status(
        &mut self,
        order_id: OrderId,
        remaining: Quantity,
        status: OrderStatus,
    ) -> Result<(), StoreError> {
        let pair = self
            .held
            .get(&order_id)
            .cloned()
            .ok_or(StoreError::NotHeld(order_id))?;

        self.updates.push(StagedUpdate {
            pair,
            order_id,
            remaining,
            status,
        });
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        let mut this = self;
        let pairs: BTreeSet<PairId> = this
            .updates
            .iter()
            .map(|u| u.pair.clone())
            .chain(this.trades.iter().map(|t| t.pair.clone()))
            .collect();

        let shared = pairs
            .into_iter()
            .map(|pair| {
                let book = this
                    .inner
                    .pair(&pair)
                    .ok_or_else(|| StoreError::Conflict(format!("unknown pair {pair}")))?;
                Ok((pair, book))
            })
            .collect::<Result<Vec<_>, StoreError>>()?;

        {
            // Pairs are locked in sorted order
            let mut books: HashMap<PairId, MutexGuard<'_, PairBook>> = shared
                .iter()
                .map(|(pair, book)| (pair.clone(), book.lock()))
                .collect();

            let projected = this.validate(&books)?;

            for (pair, order) in projected {
                if let Some(book) = books.get_mut(&pair) {
                    book.replace(order);
                }
            }
            for trade in this.trades.drain(..) {
                if let Some(book) = books.get_mut(&trade.pair) {
                    book.trades.push(trade);
                }
            }
        }

        this.release_claims();
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), StoreError> {
        let mut this = self;
        this.updates.clear();
        this.trades.clear();
        this.release_claims();
        Ok(())
    }
}

impl Drop for MemoryTransaction {
    fn drop(&mut self) {
        self.release_claims();
    }
}
