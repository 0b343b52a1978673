//! Store error taxonomy
//!
//! Transient backend failures are surfaced to the composite layer, never to
//! the matching core: matching success is independent of durable
//! acknowledgement.

use thiserror::Error;

/// Errors produced by storage backends
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("order {0} not found")]
    NotFound(u64),

    #[error("store is closed")]
    Closed,

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("redis error: {0}")]
    Redis(#[from] ::redis::RedisError),

    #[error("postgres error: {0}")]
    Postgres(#[from] ::postgres::Error),

    #[error("connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("backend unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// Whether this error is an authoritative miss rather than a backend
    /// failure. The composite read path treats a miss as final instead of
    /// falling through to slower layers.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}

/// Convenience alias for store operation results
pub type StoreResult<T> = Result<T, StoreError>;
