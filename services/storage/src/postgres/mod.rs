//! Durable storage backends (postgres)
//!
//! Pooled synchronous connections. Every statement runs under a server-side
//! deadline (`statement_timeout`) so a wedged database cannot block the
//! caller indefinitely. The schema is applied idempotently when the pool is
//! built.

pub mod order_store;
pub mod trade_store;

pub use order_store::PostgresOrderStore;
pub use trade_store::PostgresTradeStore;

use crate::config::DurableConfig;
use crate::error::StoreResult;
use postgres::config::SslMode;
use postgres::NoTls;
use r2d2_postgres::PostgresConnectionManager;
use std::time::Duration;
use types::order::{OrderKind, Side};

const SCHEMA: &str = include_str!("schema.sql");
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

pub(crate) type PgPool = r2d2::Pool<PostgresConnectionManager<NoTls>>;

/// Build a connection pool, verify connectivity, and apply the schema.
pub(crate) fn new_pool(cfg: &DurableConfig) -> StoreResult<PgPool> {
    let mut pg = postgres::Config::new();
    pg.host(&cfg.host)
        .port(cfg.port)
        .dbname(&cfg.db)
        .user(&cfg.user)
        .password(&cfg.password)
        .connect_timeout(CONNECT_TIMEOUT)
        .options("-c statement_timeout=10000")
        .ssl_mode(if cfg.ssl { SslMode::Prefer } else { SslMode::Disable });

    let manager = PostgresConnectionManager::new(pg, NoTls);
    let pool = r2d2::Pool::builder()
        .max_size(cfg.pool_size)
        .max_lifetime(Some(cfg.conn_lifetime))
        .connection_timeout(CONNECT_TIMEOUT)
        .build(manager)?;

    let mut client = pool.get()?;
    client.batch_execute(SCHEMA)?;
    Ok(pool)
}

pub(crate) fn kind_from_wire(value: i16) -> Option<OrderKind> {
    match value {
        0 => Some(OrderKind::NoAction),
        1 => Some(OrderKind::Market),
        2 => Some(OrderKind::Limit),
        3 => Some(OrderKind::Cancel),
        4 => Some(OrderKind::StopMarket),
        5 => Some(OrderKind::StopLimit),
        _ => None,
    }
}

pub(crate) fn side_from_wire(value: i16) -> Option<Side> {
    match value {
        0 => Some(Side::NoAction),
        1 => Some(Side::Buy),
        2 => Some(Side::Sell),
        _ => None,
    }
}
