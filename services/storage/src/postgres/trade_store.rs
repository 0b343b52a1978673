//! Postgres-backed trade store
//!
//! Trades are insert-only; the store never updates or deletes a row. The
//! relation assigns `trade_id` from a sequence.

use super::{new_pool, PgPool};
use crate::config::DurableConfig;
use crate::error::{StoreError, StoreResult};
use crate::TradeStore;
use rust_decimal::Decimal;
use std::sync::atomic::{AtomicBool, Ordering};
use types::numeric::Price;
use types::Trade;

const INSERT_SQL: &str = "\
    INSERT INTO trades (buy_order_id, sell_order_id, price, quantity, timestamp) \
    VALUES ($1, $2, $3, $4, $5)";

const DEFAULT_RECENT_LIMIT: usize = 100;

/// Durable trade store
pub struct PostgresTradeStore {
    pool: PgPool,
    closed: AtomicBool,
}

impl PostgresTradeStore {
    /// Connect to the configured database and apply the schema
    pub fn connect(cfg: &DurableConfig) -> StoreResult<Self> {
        Ok(Self {
            pool: new_pool(cfg)?,
            closed: AtomicBool::new(false),
        })
    }

    fn check_open(&self) -> StoreResult<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(StoreError::Closed);
        }
        Ok(())
    }

    fn trade_from_row(row: &postgres::Row) -> Option<Trade> {
        let price = Price::try_new(row.get::<_, Decimal>("price"))?;
        Some(Trade {
            trade_id: Some(row.get::<_, i64>("trade_id") as u64),
            buy_order_id: row.get::<_, i64>("buy_order_id") as u64,
            sell_order_id: row.get::<_, i64>("sell_order_id") as u64,
            price,
            size: row.get::<_, i64>("quantity") as u64,
            timestamp: row.get("timestamp"),
        })
    }
}

impl TradeStore for PostgresTradeStore {
    fn save(&self, trade: &Trade) -> StoreResult<()> {
        self.check_open()?;
        let mut client = self.pool.get()?;
        client.execute(
            INSERT_SQL,
            &[
                &(trade.buy_order_id as i64),
                &(trade.sell_order_id as i64),
                &trade.price.as_decimal(),
                &(trade.size as i64),
                &trade.timestamp,
            ],
        )?;
        Ok(())
    }

    fn save_batch(&self, trades: &[Trade]) -> StoreResult<()> {
        self.check_open()?;
        if trades.is_empty() {
            return Ok(());
        }
        // One transaction so a batch lands atomically in this backend.
        let mut client = self.pool.get()?;
        let mut tx = client.transaction()?;
        let statement = tx.prepare(INSERT_SQL)?;
        for trade in trades {
            tx.execute(
                &statement,
                &[
                    &(trade.buy_order_id as i64),
                    &(trade.sell_order_id as i64),
                    &trade.price.as_decimal(),
                    &(trade.size as i64),
                    &trade.timestamp,
                ],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    fn get_recent(&self, limit: usize) -> StoreResult<Vec<Trade>> {
        self.check_open()?;
        let limit = if limit == 0 { DEFAULT_RECENT_LIMIT } else { limit };

        let mut client = self.pool.get()?;
        let rows = client.query(
            "SELECT trade_id, buy_order_id, sell_order_id, price, quantity, timestamp \
             FROM trades ORDER BY timestamp DESC LIMIT $1",
            &[&(limit as i64)],
        )?;
        Ok(rows.iter().filter_map(Self::trade_from_row).collect())
    }

    fn close(&self) -> StoreResult<()> {
        self.closed.store(true, Ordering::Release);
        Ok(())
    }
}
