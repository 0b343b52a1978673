//! Storage layer configuration
//!
//! Plain structs with explicit defaults, passed to constructors. There is no
//! process-global configuration holder: every engine instance owns its own
//! settings.

use std::path::PathBuf;
use std::time::Duration;

/// In-process layer settings
#[derive(Debug, Clone)]
pub struct MemoryConfig {
    pub enabled: bool,
    /// Capacity of the FIFO-evicting order map.
    pub max_orders: usize,
    /// Capacity of the trade ring buffer.
    pub max_trades: usize,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_orders: 100_000,
            max_trades: 1_000,
        }
    }
}

/// Distributed cache (redis) layer settings
#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub enabled: bool,
    pub host: String,
    pub port: u16,
    pub auth: Option<String>,
    pub tls: bool,
    /// TTL applied to order keys and their secondary indexes.
    pub order_ttl: Duration,
    /// Timeline cardinality bound (FIFO eviction).
    pub max_orders: usize,
    /// Recent-trade set cardinality bound.
    pub max_trades: usize,
    pub pool_size: u32,
    /// Connection attempts before the backend is declared unavailable.
    pub retries: u32,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            host: "localhost".to_string(),
            port: 6379,
            auth: None,
            tls: false,
            order_ttl: Duration::from_secs(24 * 60 * 60),
            max_orders: 50_000,
            max_trades: 10_000,
            pool_size: 10,
            retries: 3,
        }
    }
}

/// Durable (postgres) layer settings
#[derive(Debug, Clone)]
pub struct DurableConfig {
    pub enabled: bool,
    pub host: String,
    pub port: u16,
    pub db: String,
    pub user: String,
    pub password: String,
    pub ssl: bool,
    pub pool_size: u32,
    pub conn_lifetime: Duration,
}

impl Default for DurableConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            host: "localhost".to_string(),
            port: 5432,
            db: "matching_engine".to_string(),
            user: "postgres".to_string(),
            password: String::new(),
            ssl: false,
            pool_size: 20,
            conn_lifetime: Duration::from_secs(5 * 60),
        }
    }
}

/// Audit sink settings
///
/// `path = None` disables the sink.
#[derive(Debug, Clone, Default)]
pub struct AuditConfig {
    pub path: Option<PathBuf>,
}

/// Complete storage configuration: one field per layer
#[derive(Debug, Clone, Default)]
pub struct StorageConfig {
    pub memory: MemoryConfig,
    pub cache: CacheConfig,
    pub durable: DurableConfig,
    pub audit: AuditConfig,
}
