//! PostgreSQL Order Store
//!
//! Candidate selection is a plain indexed read followed by a row lock taken
//! with `FOR UPDATE SKIP LOCKED` on that one id. Zero rows from the lock
//! query means another transaction holds the order, which surfaces as
//! `Selection::Contended`. Row locks live exactly as long as the
//! `sqlx::Transaction`; dropping it rolls back.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::{Postgres, Row, Transaction};
use std::collections::HashSet;
use std::time::Duration;
use tracing::{debug, info};
use types::ids::{OrderId, PairId, UserId, WalletId};
use types::numeric::{Price, Quantity};
use types::order::{NewOrder, Order, OrderStatus, Side};
use types::trade::Trade;
use types::wallet::Wallet;
use uuid::Uuid;

use super::{MatchTransaction, OrderStore, Selection, StoreError, WalletStore};
use crate::book::PriceLevelView;

const SELECT_ORDER_BY_ID: &str = r#"
    SELECT id, user_id, pair, side, price, quantity, remaining_quantity, status, created_at
    FROM orders
    WHERE id = $1
"#;

const LOCK_OPEN_ORDER: &str = r#"
    SELECT id, user_id, pair, side, price, quantity, remaining_quantity, status, created_at
    FROM orders
    WHERE id = $1 AND status = 'OPEN'
    FOR UPDATE SKIP LOCKED
"#;

const BEST_BID_ID: &str = r#"
    SELECT id FROM orders
    WHERE pair = $1 AND side = 'BUY' AND status = 'OPEN'
    ORDER BY price DESC, created_at ASC, id ASC
    LIMIT 1
"#;

const BEST_ASK_ID: &str = r#"
    SELECT id FROM orders
    WHERE pair = $1 AND side = 'SELL' AND status = 'OPEN'
    ORDER BY price ASC, created_at ASC, id ASC
    LIMIT 1
"#;

const OPEN_BIDS: &str = r#"
    SELECT id, user_id, pair, side, price, quantity, remaining_quantity, status, created_at
    FROM orders
    WHERE pair = $1 AND side = 'BUY' AND status = 'OPEN'
    ORDER BY price DESC, created_at ASC, id ASC
"#;

const OPEN_ASKS: &str = r#"
    SELECT id, user_id, pair, side, price, quantity, remaining_quantity, status, created_at
    FROM orders
    WHERE pair = $1 AND side = 'SELL' AND status = 'OPEN'
    ORDER BY price ASC, created_at ASC, id ASC
"#;

const BID_LEVELS: &str = r#"
    SELECT price, SUM(remaining_quantity) AS quantity
    FROM orders
    WHERE pair = $1 AND side = 'BUY' AND status = 'OPEN'
    GROUP BY price
    ORDER BY price DESC
    LIMIT $2
"#;

const ASK_LEVELS: &str = r#"
    SELECT price, SUM(remaining_quantity) AS quantity
    FROM orders
    WHERE pair = $1 AND side = 'SELL' AND status = 'OPEN'
    GROUP BY price
    ORDER BY price ASC
    LIMIT $2
"#;

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) | sqlx::Error::Tls(_) => {
                StoreError::Unavailable(err.to_string())
            }
            sqlx::Error::Database(ref db)
                // serialization_failure, deadlock_detected
                if matches!(db.code().as_deref(), Some("40001") | Some("40P01")) =>
            {
                StoreError::Conflict(err.to_string())
            }
            sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) | sqlx::Error::ColumnNotFound(_) => {
                StoreError::Corrupt(err.to_string())
            }
            _ => StoreError::Backend(err.to_string()),
        }
    }
}

fn corrupt(err: impl std::fmt::Display) -> StoreError {
    StoreError::Corrupt(err.to_string())
}

fn order_from_row(row: &PgRow) -> Result<Order, StoreError> {
    let pair: String = row.try_get("pair")?;
    let side: String = row.try_get("side")?;
    let status: String = row.try_get("status")?;

    Ok(Order {
        id: OrderId::from_uuid(row.try_get("id")?),
        user_id: UserId::from_uuid(row.try_get("user_id")?),
        pair: PairId::try_new(pair).map_err(corrupt)?,
        side: Side::parse(&side).ok_or_else(|| corrupt(format!("unknown side {side:?}")))?,
        price: Price::try_new(row.try_get("price")?).map_err(corrupt)?,
        quantity: Quantity::try_new(row.try_get("quantity")?).map_err(corrupt)?,
        remaining_quantity: Quantity::try_new(row.try_get("remaining_quantity")?).map_err(corrupt)?,
        status: OrderStatus::parse(&status).ok_or_else(|| corrupt(format!("unknown status {status:?}")))?,
        created_at: row.try_get("created_at")?,
    })
}

fn level_from_row(row: &PgRow) -> Result<PriceLevelView, StoreError> {
    Ok(PriceLevelView::new(
        Price::try_new(row.try_get("price")?).map_err(corrupt)?,
        Quantity::try_new(row.try_get("quantity")?).map_err(corrupt)?,
    ))
}

/// Pooled PostgreSQL adapter
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Build the process-wide pool
    pub async fn connect(
        database_url: &str,
        max_connections: u32,
        acquire_timeout: Duration,
    ) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(acquire_timeout)
            .connect(database_url)
            .await?;

        info!(max_connections, "Connected to PostgreSQL");
        Ok(Self { pool })
    }

    /// Apply `migrations/` in order
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::Backend(format!("migration failed: {e}")))?;

        info!("Database migrations completed");
        Ok(())
    }

    /// Wait for checked-out connections to return, then close the pool
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl OrderStore for PgStore {
    async fn insert_order(&self, order: NewOrder) -> Result<Order, StoreError> {
        let order = order.into_order(Utc::now());

        let row = sqlx::query(
            r#"
            INSERT INTO orders (
                id, user_id, pair, side, price, quantity, remaining_quantity, status, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id, user_id, pair, side, price, quantity, remaining_quantity, status, created_at
            "#,
        )
        .bind(*order.id.as_uuid())
        .bind(*order.user_id.as_uuid())
        .bind(order.pair.as_str())
        .bind(order.side.as_str())
        .bind(order.price.as_decimal())
        .bind(order.quantity.as_decimal())
        .bind(order.remaining_quantity.as_decimal())
        .bind(order.status.as_str())
        .bind(order.created_at)
        .fetch_one(&self.pool)
        .await?;

        order_from_row(&row)
    }

    async fn get_order(&self, order_id: OrderId) -> Result<Option<Order>, StoreError> {
        let row = sqlx::query(SELECT_ORDER_BY_ID)
            .bind(*order_id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(order_from_row).transpose()
    }

    async fn list_open_orders(&self, pair: &PairId, side: Side) -> Result<Vec<Order>, StoreError> {
        let sql = match side {
            Side::Buy => OPEN_BIDS,
            Side::Sell => OPEN_ASKS,
        };
        let rows = sqlx::query(sql)
            .bind(pair.as_str())
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(order_from_row).collect()
    }

    async fn peek_best_open(&self, pair: &PairId, side: Side) -> Result<Option<Order>, StoreError> {
        let sql = match side {
            Side::Buy => BEST_BID_ID,
            Side::Sell => BEST_ASK_ID,
        };
        let id: Option<Uuid> = sqlx::query_scalar(sql)
            .bind(pair.as_str())
            .fetch_optional(&self.pool)
            .await?;

        match id {
            Some(id) => self.get_order(OrderId::from_uuid(id)).await,
            None => Ok(None),
        }
    }

    async fn price_levels(
        &self,
        pair: &PairId,
        side: Side,
        depth: usize,
    ) -> Result<Vec<PriceLevelView>, StoreError> {
        let sql = match side {
            Side::Buy => BID_LEVELS,
            Side::Sell => ASK_LEVELS,
        };
        let limit = i64::try_from(depth).unwrap_or(i64::MAX);
        let rows = sqlx::query(sql)
            .bind(pair.as_str())
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(level_from_row).collect()
    }

    async fn begin(&self) -> Result<Box<dyn MatchTransaction>, StoreError> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgMatchTransaction {
            tx,
            held: HashSet::new(),
        }))
    }
}

#[async_trait]
impl WalletStore for PgStore {
    async fn wallets_of(&self, user_id: UserId) -> Result<Vec<Wallet>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, currency, balance
            FROM wallets
            WHERE user_id = $1
            ORDER BY currency
            "#,
        )
        .bind(*user_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| -> Result<Wallet, StoreError> {
                Ok(Wallet {
                    id: WalletId::from_uuid(row.try_get("id")?),
                    user_id: UserId::from_uuid(row.try_get("user_id")?),
                    currency: row.try_get("currency")?,
                    balance: row.try_get("balance")?,
                })
            })
            .collect()
    }
}

struct PgMatchTransaction {
    tx: Transaction<'static, Postgres>,
    held: HashSet<OrderId>,
}

#[async_trait]
impl MatchTransaction for PgMatchTransaction {
    async fn select_best_open(&mut self, pair: &PairId, side: Side) -> Result<Selection, StoreError> {
        let sql = match side {
            Side::Buy => BEST_BID_ID,
            Side::Sell => BEST_ASK_ID,
        };
        let candidate: Option<Uuid> = sqlx::query_scalar(sql)
            .bind(pair.as_str())
            .fetch_optional(&mut *self.tx)
            .await?;

        let Some(candidate) = candidate else {
            return Ok(Selection::Empty);
        };

        let row = sqlx::query(LOCK_OPEN_ORDER)
            .bind(candidate)
            .fetch_optional(&mut *self.tx)
            .await?;

        match row {
            Some(row) => {
                let order = order_from_row(&row)?;
                self.held.insert(order.id);
                Ok(Selection::Selected(order))
            }
            None => {
                debug!(pair = %pair, side = %side, order_id = %candidate, "Best order locked elsewhere");
                Ok(Selection::Contended)
            }
        }
    }

    async fn insert_trade(&mut self, trade: &Trade) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO trades (id, pair, buy_order_id, sell_order_id, price, quantity, executed_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(*trade.id.as_uuid())
        .bind(trade.pair.as_str())
        .bind(*trade.buy_order_id.as_uuid())
        .bind(*trade.sell_order_id.as_uuid())
        .bind(trade.price.as_decimal())
        .bind(trade.quantity.as_decimal())
        .bind(trade.executed_at)
        .execute(&mut *self.tx)
        .await?;

        Ok(())
    }

    async fn update_order_quantity_and_status(
        &mut self,
        order_id: OrderId,
        remaining: Quantity,
        status: OrderStatus,
    ) -> Result<(), StoreError> {
        if !self.held.contains(&order_id) {
            return Err(StoreError::NotHeld(order_id));
        }

        let result = sqlx::query(
            r#"
            UPDATE orders
            SET remaining_quantity = $2, status = $3
            WHERE id = $1 AND status = 'OPEN' AND remaining_quantity >= $2
            "#,
        )
        .bind(*order_id.as_uuid())
        .bind(remaining.as_decimal())
        .bind(status.as_str())
        .execute(&mut *self.tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::Conflict(format!(
                "order {order_id} is no longer open with at least {remaining} remaining"
            )));
        }
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), StoreError> {
        self.tx.rollback().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_errors_are_retryable() {
        assert!(StoreError::from(sqlx::Error::PoolTimedOut).is_retryable());
        assert!(StoreError::from(sqlx::Error::PoolClosed).is_retryable());
    }

    #[test]
    fn test_missing_row_is_not_retryable() {
        let err = StoreError::from(sqlx::Error::RowNotFound);
        assert!(matches!(err, StoreError::Backend(_)));
        assert!(!err.is_retryable());
    }
}
