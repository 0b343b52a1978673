//! Distributed cache backends (redis)
//!
//! Pooled synchronous connections with bounded deadlines: remote operations
//! time out rather than block the caller indefinitely. Key layout:
//!
//! ```text
//! order:{id}          serialized order, TTL-bound
//! user_orders:{user}  set of order ids, TTL refreshed on write
//! side_orders:{side}  set of order ids, TTL refreshed on write
//! orders:timeline     sorted set scored by submission instant, FIFO-trimmed
//! trades:recent       sorted set scored by trade instant, FIFO-trimmed
//! ```

pub mod order_store;
pub mod trade_store;

pub use order_store::RedisOrderStore;
pub use trade_store::RedisTradeStore;

use crate::config::CacheConfig;
use crate::error::{StoreError, StoreResult};
use std::time::Duration;

pub(crate) const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
pub(crate) const READ_TIMEOUT: Duration = Duration::from_secs(3);
pub(crate) const WRITE_TIMEOUT: Duration = Duration::from_secs(3);
/// List operations scan sets and fetch in bulk; they get a longer deadline.
pub(crate) const LIST_TIMEOUT: Duration = Duration::from_secs(5);

pub(crate) type RedisPool = r2d2::Pool<redis::Client>;
pub(crate) type RedisConnection = r2d2::PooledConnection<redis::Client>;

fn redis_url(cfg: &CacheConfig) -> String {
    let scheme = if cfg.tls { "rediss" } else { "redis" };
    match &cfg.auth {
        Some(password) => format!("{}://:{}@{}:{}", scheme, password, cfg.host, cfg.port),
        None => format!("{}://{}:{}", scheme, cfg.host, cfg.port),
    }
}

/// Build a connection pool and verify the server is reachable.
pub(crate) fn new_pool(cfg: &CacheConfig) -> StoreResult<RedisPool> {
    let client = redis::Client::open(redis_url(cfg))?;
    let pool = r2d2::Pool::builder()
        .max_size(cfg.pool_size)
        .connection_timeout(CONNECT_TIMEOUT)
        .build(client)?;

    // Ping with a bounded number of attempts before declaring the backend
    // unavailable.
    let attempts = cfg.retries.max(1);
    let mut last_err: Option<StoreError> = None;
    for _ in 0..attempts {
        match ping(&pool) {
            Ok(()) => return Ok(pool),
            Err(e) => last_err = Some(e),
        }
    }
    Err(last_err.unwrap_or_else(|| StoreError::Unavailable("redis ping failed".to_string())))
}

fn ping(pool: &RedisPool) -> StoreResult<()> {
    let mut conn = pool.get()?;
    conn.set_read_timeout(Some(READ_TIMEOUT))?;
    conn.set_write_timeout(Some(WRITE_TIMEOUT))?;
    redis::cmd("PING").query::<String>(&mut *conn)?;
    Ok(())
}

/// Check out a connection with the given read deadline applied.
pub(crate) fn checkout(pool: &RedisPool, read_deadline: Duration) -> StoreResult<RedisConnection> {
    let conn = pool.get()?;
    conn.set_read_timeout(Some(read_deadline))?;
    conn.set_write_timeout(Some(WRITE_TIMEOUT))?;
    Ok(conn)
}
