//! Layered order and trade storage
//!
//! Store contracts plus the backends that implement them: in-process bounded
//! maps, a redis cache layer, a postgres durable layer, and an append-only
//! NDJSON audit sink. Composite stores fan writes across every configured
//! layer and read from the first layer with data.

pub mod audit;
pub mod composite;
pub mod config;
pub mod error;
pub mod layered;
pub mod memory;
pub mod postgres;
pub mod redis;

pub use audit::AuditTradeStore;
pub use composite::{CompositeOrderStore, CompositeTradeStore};
pub use config::{AuditConfig, CacheConfig, DurableConfig, MemoryConfig, StorageConfig};
pub use error::{StoreError, StoreResult};
pub use layered::{build_order_store, build_trade_store};
pub use memory::{MemoryOrderStore, MemoryTradeStore};

use types::order::Side;
use types::{Order, Trade};

/// Order storage contract
///
/// Implementations must be safe to share across threads; interior mutability
/// is the backend's concern. List operations return snapshots whose ordering
/// is undefined unless the backend documents one.
pub trait OrderStore: Send + Sync {
    /// Upsert an order by identity.
    fn save(&self, order: &Order) -> StoreResult<()>;

    /// Retrieve an order by identity.
    fn get(&self, order_id: u64) -> StoreResult<Order>;

    /// Delete an order. Idempotent: removing an absent id succeeds.
    fn remove(&self, order_id: u64) -> StoreResult<()>;

    /// Update an existing order (partial fills). Fails with
    /// [`StoreError::NotFound`] if the order is absent.
    fn update(&self, order: &Order) -> StoreResult<()>;

    /// Snapshot of all stored orders.
    fn get_all(&self) -> Vec<Order>;

    /// Snapshot of all orders for one participant.
    fn get_by_user(&self, user_id: &str) -> Vec<Order>;

    /// Snapshot of all orders on one side.
    fn get_by_side(&self, side: Side) -> Vec<Order>;

    /// Release resources. Subsequent calls fail with [`StoreError::Closed`].
    fn close(&self) -> StoreResult<()>;
}

/// Trade storage contract
///
/// Trades are append-only; there is no update or delete.
pub trait TradeStore: Send + Sync {
    /// Persist a single trade.
    fn save(&self, trade: &Trade) -> StoreResult<()>;

    /// Persist multiple trades. Atomic within a single backend, never across
    /// backends.
    fn save_batch(&self, trades: &[Trade]) -> StoreResult<()>;

    /// Up to `limit` most recent trades, newest first. A zero limit means
    /// the backend's default window.
    fn get_recent(&self, limit: usize) -> StoreResult<Vec<Trade>>;

    /// Release resources. Subsequent calls fail with [`StoreError::Closed`].
    fn close(&self) -> StoreResult<()>;
}
