//! Layered store assembly
//!
//! Builds the composite stores from configuration: `memory -> cache ->
//! durable`, plus the write-only audit sink on the trade side. A backend
//! that fails to initialize is dropped with a warning and the engine
//! continues on the remaining layers.

use crate::audit::AuditTradeStore;
use crate::composite::{CompositeOrderStore, CompositeTradeStore};
use crate::config::StorageConfig;
use crate::memory::{MemoryOrderStore, MemoryTradeStore};
use crate::postgres::{PostgresOrderStore, PostgresTradeStore};
use crate::redis::{RedisOrderStore, RedisTradeStore};
use crate::{OrderStore, TradeStore};
use tracing::warn;

/// Assemble the order store layers described by `config`
pub fn build_order_store(config: &StorageConfig) -> CompositeOrderStore {
    let mut layers: Vec<Box<dyn OrderStore>> = Vec::new();

    if config.memory.enabled {
        layers.push(Box::new(MemoryOrderStore::new(config.memory.max_orders)));
    }

    if config.cache.enabled {
        match RedisOrderStore::connect(&config.cache) {
            Ok(store) => layers.push(Box::new(store)),
            Err(e) => warn!(error = %e, "cache order store unavailable, continuing without it"),
        }
    }

    if config.durable.enabled {
        match PostgresOrderStore::connect(&config.durable) {
            Ok(store) => layers.push(Box::new(store)),
            Err(e) => warn!(error = %e, "durable order store unavailable, continuing without it"),
        }
    }

    CompositeOrderStore::new(layers)
}

/// Assemble the trade store layers described by `config`
pub fn build_trade_store(config: &StorageConfig) -> CompositeTradeStore {
    let mut layers: Vec<Box<dyn TradeStore>> = Vec::new();

    if config.memory.enabled {
        layers.push(Box::new(MemoryTradeStore::new(config.memory.max_trades)));
    }

    if config.cache.enabled {
        match RedisTradeStore::connect(&config.cache) {
            Ok(store) => layers.push(Box::new(store)),
            Err(e) => warn!(error = %e, "cache trade store unavailable, continuing without it"),
        }
    }

    if config.durable.enabled {
        match PostgresTradeStore::connect(&config.durable) {
            Ok(store) => layers.push(Box::new(store)),
            Err(e) => warn!(error = %e, "durable trade store unavailable, continuing without it"),
        }
    }

    // Audit participates in the write fan-out only; reads return empty.
    if let Some(path) = &config.audit.path {
        match AuditTradeStore::open(path) {
            Ok(store) => layers.push(Box::new(store)),
            Err(e) => warn!(error = %e, "audit sink unavailable, continuing without it"),
        }
    }

    CompositeTradeStore::new(layers)
}
