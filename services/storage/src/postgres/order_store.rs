//! Postgres-backed order store
//!
//! Orders live in the `orders` relation, keyed by identity, with secondary
//! indexes on participant and side. `save` upserts so replayed writes are
//! harmless.

use super::{kind_from_wire, new_pool, side_from_wire, PgPool};
use crate::config::DurableConfig;
use crate::error::{StoreError, StoreResult};
use crate::OrderStore;
use chrono::Utc;
use rust_decimal::Decimal;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::debug;
use types::numeric::Price;
use types::order::Side;
use types::Order;

const SAVE_SQL: &str = "\
    INSERT INTO orders (order_id, user_id, symbol, order_type, side, price, stop_price, size, created_at, updated_at) \
    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
    ON CONFLICT (order_id) DO UPDATE SET \
        size = EXCLUDED.size, \
        updated_at = EXCLUDED.updated_at";

const SELECT_COLUMNS: &str =
    "order_id, user_id, symbol, order_type, side, price, stop_price, size, created_at";

/// Durable order store
pub struct PostgresOrderStore {
    pool: PgPool,
    closed: AtomicBool,
}

impl PostgresOrderStore {
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

    fn order_from_row(row: &postgres::Row) -> Option<Order> {
        let kind = kind_from_wire(row.get("order_type"))?;
        let side = side_from_wire(row.get("side"))?;
        let price = Price::try_new(row.get::<_, Decimal>("price"))?;
        let stop_price = Price::try_new(row.get::<_, Decimal>("stop_price"))?;
        Some(Order {
            id: row.get::<_, i64>("order_id") as u64,
            user_id: row.get("user_id"),
            symbol: row.get("symbol"),
            kind,
            side,
            price,
            stop_price,
            size: row.get::<_, i64>("size") as u64,
            timestamp: row.get("created_at"),
        })
    }

    fn collect_orders(rows: Vec<postgres::Row>) -> Vec<Order> {
        rows.iter().filter_map(Self::order_from_row).collect()
    }

    fn query_orders(&self, sql: &str, params: &[&(dyn postgres::types::ToSql + Sync)]) -> Vec<Order> {
        if self.check_open().is_err() {
            return Vec::new();
        }
        let result = (|| -> StoreResult<Vec<Order>> {
            let mut client = self.pool.get()?;
            let rows = client.query(sql, params)?;
            Ok(Self::collect_orders(rows))
        })();
        match result {
            Ok(orders) => orders,
            Err(e) => {
                debug!(error = %e, "postgres order query failed");
                Vec::new()
            }
        }
    }
}

impl OrderStore for PostgresOrderStore {
    fn save(&self, order: &Order) -> StoreResult<()> {
        self.check_open()?;
        let mut client = self.pool.get()?;
        client.execute(
            SAVE_SQL,
            &[
                &(order.id as i64),
                &order.user_id,
                &order.symbol,
                &(order.kind as i16),
                &(order.side as i16),
                &order.price.as_decimal(),
                &order.stop_price.as_decimal(),
                &(order.size as i64),
                &order.timestamp,
                &Utc::now(),
            ],
        )?;
        Ok(())
    }

    fn get(&self, order_id: u64) -> StoreResult<Order> {
        self.check_open()?;
        let mut client = self.pool.get()?;
        let sql = format!("SELECT {} FROM orders WHERE order_id = $1", SELECT_COLUMNS);
        let row = client
            .query_opt(sql.as_str(), &[&(order_id as i64)])?
            .ok_or(StoreError::NotFound(order_id))?;
        Self::order_from_row(&row).ok_or(StoreError::NotFound(order_id))
    }

    fn remove(&self, order_id: u64) -> StoreResult<()> {
        self.check_open()?;
        let mut client = self.pool.get()?;
        client.execute("DELETE FROM orders WHERE order_id = $1", &[&(order_id as i64)])?;
        Ok(())
    }

    fn update(&self, order: &Order) -> StoreResult<()> {
        self.check_open()?;
        let mut client = self.pool.get()?;
        let updated = client.execute(
            "UPDATE orders SET size = $2, price = $3, updated_at = $4 WHERE order_id = $1",
            &[
                &(order.id as i64),
                &(order.size as i64),
                &order.price.as_decimal(),
                &Utc::now(),
            ],
        )?;
        if updated == 0 {
            return Err(StoreError::NotFound(order.id));
        }
        Ok(())
    }

    fn get_all(&self) -> Vec<Order> {
        let sql = format!(
            "SELECT {} FROM orders ORDER BY created_at DESC",
            SELECT_COLUMNS
        );
        self.query_orders(&sql, &[])
    }

    fn get_by_user(&self, user_id: &str) -> Vec<Order> {
        let sql = format!(
            "SELECT {} FROM orders WHERE user_id = $1 ORDER BY created_at DESC",
            SELECT_COLUMNS
        );
        self.query_orders(&sql, &[&user_id])
    }

    fn get_by_side(&self, side: Side) -> Vec<Order> {
        let sql = format!(
            "SELECT {} FROM orders WHERE side = $1 ORDER BY created_at DESC",
            SELECT_COLUMNS
        );
        self.query_orders(&sql, &[&(side as i16)])
    }

    fn close(&self) -> StoreResult<()> {
        self.closed.store(true, Ordering::Release);
        Ok(())
    }
}
