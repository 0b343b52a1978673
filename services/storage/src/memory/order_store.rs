//! In-process order store with FIFO eviction
//!
//! A bounded map guarded by a readers-writer lock. When the capacity is
//! reached, the oldest *inserted* entry is evicted (not the oldest accessed).
//! Eviction is best-effort: the durable layer is the source of truth for
//! older data.

use crate::error::{StoreError, StoreResult};
use crate::OrderStore;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;
use types::order::Side;
use types::Order;

#[derive(Debug, Default)]
struct Inner {
    orders: HashMap<u64, Order>,
    /// Insertion order, used for FIFO eviction.
    queue: VecDeque<u64>,
}

/// Bounded in-memory order store
#[derive(Debug)]
pub struct MemoryOrderStore {
    inner: RwLock<Inner>,
    max_orders: usize,
    closed: AtomicBool,
}

impl MemoryOrderStore {
    /// Create a store holding at most `max_orders` entries
    pub fn new(max_orders: usize) -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
            max_orders,
            closed: AtomicBool::new(false),
        }
    }

    fn check_open(&self) -> StoreResult<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(StoreError::Closed);
        }
        Ok(())
    }

    /// Number of stored orders
    pub fn len(&self) -> usize {
        self.inner.read().expect("order store lock poisoned").orders.len()
    }

    /// Whether the store holds no orders
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl OrderStore for MemoryOrderStore {
    fn save(&self, order: &Order) -> StoreResult<()> {
        self.check_open()?;
        let mut inner = self.inner.write().expect("order store lock poisoned");

        if !inner.orders.contains_key(&order.id) {
            inner.queue.push_back(order.id);
            if inner.queue.len() > self.max_orders {
                if let Some(oldest) = inner.queue.pop_front() {
                    inner.orders.remove(&oldest);
                }
            }
        }
        inner.orders.insert(order.id, order.clone());
        Ok(())
    }

    fn get(&self, order_id: u64) -> StoreResult<Order> {
        self.check_open()?;
        let inner = self.inner.read().expect("order store lock poisoned");
        inner
            .orders
            .get(&order_id)
            .cloned()
            .ok_or(StoreError::NotFound(order_id))
    }

    fn remove(&self, order_id: u64) -> StoreResult<()> {
        self.check_open()?;
        let mut inner = self.inner.write().expect("order store lock poisoned");
        inner.orders.remove(&order_id);
        if let Some(pos) = inner.queue.iter().position(|id| *id == order_id) {
            inner.queue.remove(pos);
        }
        Ok(())
    }

    fn update(&self, order: &Order) -> StoreResult<()> {
        self.check_open()?;
        let mut inner = self.inner.write().expect("order store lock poisoned");
        if !inner.orders.contains_key(&order.id) {
            return Err(StoreError::NotFound(order.id));
        }
        inner.orders.insert(order.id, order.clone());
        Ok(())
    }

    fn get_all(&self) -> Vec<Order> {
        let inner = self.inner.read().expect("order store lock poisoned");
        inner.orders.values().cloned().collect()
    }

    fn get_by_user(&self, user_id: &str) -> Vec<Order> {
        let inner = self.inner.read().expect("order store lock poisoned");
        inner
            .orders
            .values()
            .filter(|o| o.user_id == user_id)
            .cloned()
            .collect()
    }

    fn get_by_side(&self, side: Side) -> Vec<Order> {
        let inner = self.inner.read().expect("order store lock poisoned");
        inner
            .orders
            .values()
            .filter(|o| o.side == side)
            .cloned()
            .collect()
    }

    fn close(&self) -> StoreResult<()> {
        self.closed.store(true, Ordering::Release);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::numeric::Price;

    fn order(id: u64, user: &str, side: Side) -> Order {
        Order::limit(id, user, "BTC-USD", side, Price::from_u64(100), 10)
    }

    #[test]
    fn test_save_and_get() {
        let store = MemoryOrderStore::new(10);
        store.save(&order(1, "alice", Side::Buy)).unwrap();

        let fetched = store.get(1).unwrap();
        assert_eq!(fetched.id, 1);
        assert_eq!(fetched.user_id, "alice");
    }

    #[test]
    fn test_get_missing_is_not_found() {
        let store = MemoryOrderStore::new(10);
        assert!(matches!(store.get(99), Err(StoreError::NotFound(99))));
    }

    #[test]
    fn test_remove_is_idempotent() {
        let store = MemoryOrderStore::new(10);
        store.save(&order(1, "alice", Side::Buy)).unwrap();
        store.remove(1).unwrap();
        store.remove(1).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_update_missing_fails() {
        let store = MemoryOrderStore::new(10);
        let result = store.update(&order(1, "alice", Side::Buy));
        assert!(matches!(result, Err(StoreError::NotFound(1))));
    }

    #[test]
    fn test_update_replaces() {
        let store = MemoryOrderStore::new(10);
        let mut o = order(1, "alice", Side::Buy);
        store.save(&o).unwrap();

        o.size = 4;
        store.update(&o).unwrap();
        assert_eq!(store.get(1).unwrap().size, 4);
    }

    #[test]
    fn test_fifo_eviction_by_insertion_order() {
        let store = MemoryOrderStore::new(3);
        for id in 1..=3 {
            store.save(&order(id, "alice", Side::Buy)).unwrap();
        }
        // Touch order 1 with an update; eviction must still hit it first.
        let mut o = order(1, "alice", Side::Buy);
        o.size = 5;
        store.update(&o).unwrap();

        store.save(&order(4, "alice", Side::Buy)).unwrap();

        assert_eq!(store.len(), 3);
        assert!(store.get(1).is_err());
        assert!(store.get(2).is_ok());
        assert!(store.get(4).is_ok());
    }

    #[test]
    fn test_resave_does_not_duplicate_queue_entry() {
        let store = MemoryOrderStore::new(2);
        store.save(&order(1, "alice", Side::Buy)).unwrap();
        store.save(&order(1, "alice", Side::Buy)).unwrap();
        store.save(&order(2, "bob", Side::Sell)).unwrap();

        assert_eq!(store.len(), 2);
        assert!(store.get(1).is_ok());
        assert!(store.get(2).is_ok());
    }

    #[test]
    fn test_query_by_user_and_side() {
        let store = MemoryOrderStore::new(10);
        store.save(&order(1, "alice", Side::Buy)).unwrap();
        store.save(&order(2, "alice", Side::Sell)).unwrap();
        store.save(&order(3, "bob", Side::Sell)).unwrap();

        assert_eq!(store.get_by_user("alice").len(), 2);
        assert_eq!(store.get_by_user("carol").len(), 0);
        assert_eq!(store.get_by_side(Side::Sell).len(), 2);
        assert_eq!(store.get_all().len(), 3);
    }

    #[test]
    fn test_closed_store_fails() {
        let store = MemoryOrderStore::new(10);
        store.save(&order(1, "alice", Side::Buy)).unwrap();
        store.close().unwrap();

        assert!(matches!(store.get(1), Err(StoreError::Closed)));
        assert!(matches!(
            store.save(&order(2, "bob", Side::Sell)),
            Err(StoreError::Closed)
        ));
    }
}
