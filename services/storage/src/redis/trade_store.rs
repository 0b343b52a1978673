//! Redis-backed recent-trade store
//!
//! Trades live in a single sorted set scored by execution instant, trimmed
//! to a bounded cardinality on every write.

use super::{checkout, new_pool, RedisPool, READ_TIMEOUT};
use crate::config::CacheConfig;
use crate::error::{StoreError, StoreResult};
use crate::TradeStore;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::debug;
use types::Trade;

const TRADES_KEY: &str = "trades:recent";
const DEFAULT_RECENT_LIMIT: usize = 100;

/// Distributed-cache trade store
pub struct RedisTradeStore {
    pool: RedisPool,
    max_trades: usize,
    closed: AtomicBool,
}

impl RedisTradeStore {
    /// Connect to the configured redis server
    pub fn connect(cfg: &CacheConfig) -> StoreResult<Self> {
        Ok(Self {
            pool: new_pool(cfg)?,
            max_trades: cfg.max_trades,
            closed: AtomicBool::new(false),
        })
    }

    fn check_open(&self) -> StoreResult<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(StoreError::Closed);
        }
        Ok(())
    }

    fn trade_score(trade: &Trade) -> f64 {
        trade.timestamp.timestamp_nanos_opt().unwrap_or(0) as f64
    }

    fn add_to_pipe(pipe: &mut redis::Pipeline, trade: &Trade) -> StoreResult<()> {
        let payload = serde_json::to_string(trade)?;
        pipe.cmd("ZADD")
            .arg(TRADES_KEY)
            .arg(Self::trade_score(trade))
            .arg(payload)
            .ignore();
        Ok(())
    }

    fn trim(&self, pipe: &mut redis::Pipeline) {
        pipe.cmd("ZREMRANGEBYRANK")
            .arg(TRADES_KEY)
            .arg(0)
            .arg(-(self.max_trades as i64) - 1)
            .ignore();
    }
}

impl TradeStore for RedisTradeStore {
    fn save(&self, trade: &Trade) -> StoreResult<()> {
        self.check_open()?;
        let mut conn = checkout(&self.pool, READ_TIMEOUT)?;
        let mut pipe = redis::pipe();
        Self::add_to_pipe(&mut pipe, trade)?;
        self.trim(&mut pipe);
        pipe.query::<()>(&mut *conn)?;
        Ok(())
    }

    fn save_batch(&self, trades: &[Trade]) -> StoreResult<()> {
        self.check_open()?;
        if trades.is_empty() {
            return Ok(());
        }
        let mut conn = checkout(&self.pool, READ_TIMEOUT)?;
        let mut pipe = redis::pipe();
        for trade in trades {
            Self::add_to_pipe(&mut pipe, trade)?;
        }
        self.trim(&mut pipe);
        pipe.query::<()>(&mut *conn)?;
        Ok(())
    }

    fn get_recent(&self, limit: usize) -> StoreResult<Vec<Trade>> {
        self.check_open()?;
        let limit = if limit == 0 { DEFAULT_RECENT_LIMIT } else { limit };

        let mut conn = checkout(&self.pool, READ_TIMEOUT)?;
        // Highest score first = newest first.
        let values: Vec<String> = redis::cmd("ZREVRANGE")
            .arg(TRADES_KEY)
            .arg(0)
            .arg((limit - 1) as i64)
            .query(&mut *conn)?;

        let mut trades = Vec::with_capacity(values.len());
        for value in values {
            match serde_json::from_str::<Trade>(&value) {
                Ok(trade) => trades.push(trade),
                Err(e) => debug!(error = %e, "skipping unparsable cached trade"),
            }
        }
        Ok(trades)
    }

    fn close(&self) -> StoreResult<()> {
        self.closed.store(true, Ordering::Release);
        Ok(())
    }
}
