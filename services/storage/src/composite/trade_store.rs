//! Composite trade store
//!
//! Trade writes fan out to every layer (including the write-only audit
//! sink); `get_recent` returns the first non-error, non-empty answer so the
//! hot ring buffer serves reads while slower layers only back it up.

use crate::error::{StoreError, StoreResult};
use crate::TradeStore;
use tracing::debug;
use types::Trade;

/// Ordered fan-out over multiple trade stores
pub struct CompositeTradeStore {
    stores: Vec<Box<dyn TradeStore>>,
}

impl CompositeTradeStore {
    /// Create a composite from layers ordered fastest first
    pub fn new(stores: Vec<Box<dyn TradeStore>>) -> Self {
        Self { stores }
    }

    /// Number of configured layers
    pub fn layer_count(&self) -> usize {
        self.stores.len()
    }

    fn write_all<F>(&self, op_name: &str, op: F) -> StoreResult<()>
    where
        F: Fn(&dyn TradeStore) -> StoreResult<()>,
    {
        let mut last_err = None;
        let mut succeeded = false;
        for store in &self.stores {
            match op(store.as_ref()) {
                Ok(()) => succeeded = true,
                Err(e) => {
                    debug!(op = op_name, error = %e, "trade store layer write failed");
                    last_err = Some(e);
                }
            }
        }
        match (succeeded, last_err) {
            (true, _) | (false, None) => Ok(()),
            (false, Some(e)) => Err(e),
        }
    }
}

impl TradeStore for CompositeTradeStore {
    fn save(&self, trade: &Trade) -> StoreResult<()> {
        self.write_all("save", |s| s.save(trade))
    }

    fn save_batch(&self, trades: &[Trade]) -> StoreResult<()> {
        self.write_all("save_batch", |s| s.save_batch(trades))
    }

    fn get_recent(&self, limit: usize) -> StoreResult<Vec<Trade>> {
        for store in &self.stores {
            match store.get_recent(limit) {
                Ok(trades) if !trades.is_empty() => return Ok(trades),
                Ok(_) => continue,
                Err(e) => {
                    debug!(error = %e, "trade store layer read failed");
                    continue;
                }
            }
        }
        Ok(Vec::new())
    }

    fn close(&self) -> StoreResult<()> {
        let mut last_err = None;
        for store in &self.stores {
            if let Err(e) = store.close() {
                last_err = Some(e);
            }
        }
        match last_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
