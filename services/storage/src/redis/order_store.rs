//! Redis-backed order store with FIFO eviction
//!
//! Orders are JSON values under `order:{id}` with secondary index sets per
//! participant and side. A timeline sorted set scored by submission instant
//! bounds cardinality: the oldest entries are trimmed on every write.

use super::{checkout, new_pool, RedisPool, LIST_TIMEOUT, READ_TIMEOUT};
use crate::config::CacheConfig;
use crate::error::{StoreError, StoreResult};
use crate::OrderStore;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::debug;
use types::order::Side;
use types::Order;

const ORDER_KEY_PREFIX: &str = "order:";
const USER_ORDERS_PREFIX: &str = "user_orders:";
const SIDE_ORDERS_PREFIX: &str = "side_orders:";
const ORDERS_TIMELINE_KEY: &str = "orders:timeline";

/// Distributed-cache order store
pub struct RedisOrderStore {
    pool: RedisPool,
    order_ttl: Duration,
    max_orders: usize,
    closed: AtomicBool,
}

impl RedisOrderStore {
    /// Connect to the configured redis server
    pub fn connect(cfg: &CacheConfig) -> StoreResult<Self> {
        Ok(Self {
            pool: new_pool(cfg)?,
            order_ttl: cfg.order_ttl,
            max_orders: cfg.max_orders,
            closed: AtomicBool::new(false),
        })
    }

    fn check_open(&self) -> StoreResult<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(StoreError::Closed);
        }
        Ok(())
    }

    fn order_key(order_id: u64) -> String {
        format!("{}{}", ORDER_KEY_PREFIX, order_id)
    }

    fn user_key(user_id: &str) -> String {
        format!("{}{}", USER_ORDERS_PREFIX, user_id)
    }

    fn side_key(side: Side) -> String {
        format!("{}{}", SIDE_ORDERS_PREFIX, side as u8)
    }

    fn timeline_score(order: &Order) -> f64 {
        order.timestamp.timestamp_nanos_opt().unwrap_or(0) as f64
    }

    /// Fetch multiple orders by key with one MGET, skipping entries that are
    /// missing or unparsable.
    fn orders_by_keys(&self, keys: &[String]) -> StoreResult<Vec<Order>> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }
        let mut conn = checkout(&self.pool, LIST_TIMEOUT)?;
        let values: Vec<Option<String>> = redis::cmd("MGET").arg(keys).query(&mut *conn)?;

        let mut orders = Vec::with_capacity(values.len());
        for value in values.into_iter().flatten() {
            match serde_json::from_str::<Order>(&value) {
                Ok(order) => orders.push(order),
                Err(e) => debug!(error = %e, "skipping unparsable cached order"),
            }
        }
        Ok(orders)
    }

    fn list_or_empty(&self, result: StoreResult<Vec<Order>>, what: &str) -> Vec<Order> {
        match result {
            Ok(orders) => orders,
            Err(e) => {
                debug!(error = %e, what, "redis list read failed");
                Vec::new()
            }
        }
    }

    fn ids_to_keys(ids: Vec<String>) -> Vec<String> {
        ids.into_iter()
            .map(|id| format!("{}{}", ORDER_KEY_PREFIX, id))
            .collect()
    }
}

impl OrderStore for RedisOrderStore {
    fn save(&self, order: &Order) -> StoreResult<()> {
        self.check_open()?;
        let payload = serde_json::to_string(order)?;
        let ttl = self.order_ttl.as_secs();
        let mut conn = checkout(&self.pool, READ_TIMEOUT)?;

        let mut pipe = redis::pipe();
        pipe.cmd("SET")
            .arg(Self::order_key(order.id))
            .arg(payload)
            .arg("EX")
            .arg(ttl)
            .ignore();
        pipe.cmd("SADD")
            .arg(Self::user_key(&order.user_id))
            .arg(order.id)
            .ignore();
        pipe.cmd("EXPIRE")
            .arg(Self::user_key(&order.user_id))
            .arg(ttl)
            .ignore();
        pipe.cmd("SADD")
            .arg(Self::side_key(order.side))
            .arg(order.id)
            .ignore();
        pipe.cmd("EXPIRE")
            .arg(Self::side_key(order.side))
            .arg(ttl)
            .ignore();
        pipe.cmd("ZADD")
            .arg(ORDERS_TIMELINE_KEY)
            .arg(Self::timeline_score(order))
            .arg(order.id)
            .ignore();
        // FIFO eviction: keep only the newest max_orders timeline entries.
        pipe.cmd("ZREMRANGEBYRANK")
            .arg(ORDERS_TIMELINE_KEY)
            .arg(0)
            .arg(-(self.max_orders as i64) - 1)
            .ignore();

        pipe.query::<()>(&mut *conn)?;
        Ok(())
    }

    fn get(&self, order_id: u64) -> StoreResult<Order> {
        self.check_open()?;
        let mut conn = checkout(&self.pool, READ_TIMEOUT)?;
        let value: Option<String> = redis::cmd("GET")
            .arg(Self::order_key(order_id))
            .query(&mut *conn)?;
        match value {
            Some(payload) => Ok(serde_json::from_str(&payload)?),
            None => Err(StoreError::NotFound(order_id)),
        }
    }

    fn remove(&self, order_id: u64) -> StoreResult<()> {
        self.check_open()?;
        // Fetch first so the secondary indexes can be cleaned up; an absent
        // order makes the removal a no-op.
        let order = match self.get(order_id) {
            Ok(order) => order,
            Err(StoreError::NotFound(_)) => return Ok(()),
            Err(e) => return Err(e),
        };

        let mut conn = checkout(&self.pool, READ_TIMEOUT)?;
        let mut pipe = redis::pipe();
        pipe.cmd("DEL").arg(Self::order_key(order_id)).ignore();
        pipe.cmd("SREM")
            .arg(Self::user_key(&order.user_id))
            .arg(order_id)
            .ignore();
        pipe.cmd("SREM")
            .arg(Self::side_key(order.side))
            .arg(order_id)
            .ignore();
        pipe.cmd("ZREM")
            .arg(ORDERS_TIMELINE_KEY)
            .arg(order_id)
            .ignore();
        pipe.query::<()>(&mut *conn)?;
        Ok(())
    }

    fn update(&self, order: &Order) -> StoreResult<()> {
        // Cache entries expire; an update is an upsert.
        self.save(order)
    }

    fn get_all(&self) -> Vec<Order> {
        if self.check_open().is_err() {
            return Vec::new();
        }
        let result = (|| {
            let mut conn = checkout(&self.pool, LIST_TIMEOUT)?;
            let keys: Vec<String> = redis::cmd("KEYS")
                .arg(format!("{}*", ORDER_KEY_PREFIX))
                .query(&mut *conn)?;
            drop(conn);
            self.orders_by_keys(&keys)
        })();
        self.list_or_empty(result, "get_all")
    }

    fn get_by_user(&self, user_id: &str) -> Vec<Order> {
        if self.check_open().is_err() {
            return Vec::new();
        }
        let result = (|| {
            let mut conn = checkout(&self.pool, LIST_TIMEOUT)?;
            let ids: Vec<String> = redis::cmd("SMEMBERS")
                .arg(Self::user_key(user_id))
                .query(&mut *conn)?;
            drop(conn);
            self.orders_by_keys(&Self::ids_to_keys(ids))
        })();
        self.list_or_empty(result, "get_by_user")
    }

    fn get_by_side(&self, side: Side) -> Vec<Order> {
        if self.check_open().is_err() {
            return Vec::new();
        }
        let result = (|| {
            let mut conn = checkout(&self.pool, LIST_TIMEOUT)?;
            let ids: Vec<String> = redis::cmd("SMEMBERS")
                .arg(Self::side_key(side))
                .query(&mut *conn)?;
            drop(conn);
            self.orders_by_keys(&Self::ids_to_keys(ids))
        })();
        self.list_or_empty(result, "get_by_side")
    }

    fn close(&self) -> StoreResult<()> {
        self.closed.store(true, Ordering::Release);
        Ok(())
    }
}
