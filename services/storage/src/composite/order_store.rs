//! Composite order store
//!
//! Writes go to ALL layers in order; the last error is recorded and the write
//! succeeds if at least one layer accepted it. Reads consult layers in order:
//! a found record wins, and an authoritative NOT-FOUND stops the search -- a
//! miss at a hot layer must not be shadowed by stale data further down only
//! because the hot layer evicted. Only layer *failures* fall through.

use crate::error::{StoreError, StoreResult};
use crate::OrderStore;
use tracing::debug;
use types::order::Side;
use types::Order;

/// Ordered fan-out over multiple order stores
pub struct CompositeOrderStore {
    stores: Vec<Box<dyn OrderStore>>,
}

impl CompositeOrderStore {
    /// Create a composite from layers ordered fastest first
    pub fn new(stores: Vec<Box<dyn OrderStore>>) -> Self {
        Self { stores }
    }

    /// Number of configured layers
    pub fn layer_count(&self) -> usize {
        self.stores.len()
    }

    fn write_all<F>(&self, op_name: &str, op: F) -> StoreResult<()>
    where
        F: Fn(&dyn OrderStore) -> StoreResult<()>,
    {
        let mut last_err = None;
        let mut succeeded = false;
        for store in &self.stores {
            match op(store.as_ref()) {
                Ok(()) => succeeded = true,
                Err(e) => {
                    debug!(op = op_name, error = %e, "order store layer write failed");
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

impl OrderStore for CompositeOrderStore {
    fn save(&self, order: &Order) -> StoreResult<()> {
        self.write_all("save", |s| s.save(order))
    }

    fn get(&self, order_id: u64) -> StoreResult<Order> {
        let mut last_err = None;
        for store in &self.stores {
            match store.get(order_id) {
                Ok(order) => return Ok(order),
                Err(e) if e.is_not_found() => return Err(e),
                Err(e) => {
                    debug!(error = %e, "order store layer read failed");
                    last_err = Some(e);
                }
            }
        }
        Err(last_err.unwrap_or(StoreError::NotFound(order_id)))
    }

    fn remove(&self, order_id: u64) -> StoreResult<()> {
        self.write_all("remove", |s| s.remove(order_id))
    }

    fn update(&self, order: &Order) -> StoreResult<()> {
        self.write_all("update", |s| s.update(order))
    }

    fn get_all(&self) -> Vec<Order> {
        for store in &self.stores {
            let orders = store.get_all();
            if !orders.is_empty() {
                return orders;
            }
        }
        Vec::new()
    }

    fn get_by_user(&self, user_id: &str) -> Vec<Order> {
        for store in &self.stores {
            let orders = store.get_by_user(user_id);
            if !orders.is_empty() {
                return orders;
            }
        }
        Vec::new()
    }

    fn get_by_side(&self, side: Side) -> Vec<Order> {
        for store in &self.stores {
            let orders = store.get_by_side(side);
            if !orders.is_empty() {
                return orders;
            }
        }
        Vec::new()
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
