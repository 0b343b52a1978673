//! Order tracker
//!
//! O(1) lookup of any live order by identity: resting orders plus inert
//! stop submissions. Participant and side queries are linear scans, which is
//! acceptable at this cardinality.

use std::collections::HashMap;
use types::order::Side;
use types::Order;

/// Identity index over live orders
#[derive(Debug, Default)]
pub struct OrderTracker {
    orders: HashMap<u64, Order>,
}

impl OrderTracker {
    /// Create an empty tracker
    pub fn new() -> Self {
        Self::default()
    }

    /// Start tracking an order, replacing any entry under the same id.
    pub fn track(&mut self, order: Order) {
        self.orders.insert(order.id, order);
    }

    /// Stop tracking an order, returning the entry if it was live.
    pub fn untrack(&mut self, order_id: u64) -> Option<Order> {
        self.orders.remove(&order_id)
    }

    /// Look up a live order.
    pub fn get(&self, order_id: u64) -> Option<&Order> {
        self.orders.get(&order_id)
    }

    /// Whether an order is live.
    pub fn contains(&self, order_id: u64) -> bool {
        self.orders.contains_key(&order_id)
    }

    /// Keep a tracked residual in sync with the book after a fill.
    pub fn sync_size(&mut self, order_id: u64, size: u64) {
        if let Some(order) = self.orders.get_mut(&order_id) {
            order.size = size;
        }
    }

    /// Snapshot of every live order.
    pub fn get_all(&self) -> Vec<Order> {
        self.orders.values().cloned().collect()
    }

    /// Snapshot of one participant's live orders.
    pub fn get_by_user(&self, user_id: &str) -> Vec<Order> {
        self.orders
            .values()
            .filter(|o| o.user_id == user_id)
            .cloned()
            .collect()
    }

    /// Snapshot of the live orders on one side.
    pub fn get_by_side(&self, side: Side) -> Vec<Order> {
        self.orders
            .values()
            .filter(|o| o.side == side)
            .cloned()
            .collect()
    }

    /// Identities of every live order.
    pub fn ids(&self) -> Vec<u64> {
        self.orders.keys().copied().collect()
    }

    /// Number of live orders.
    pub fn len(&self) -> usize {
        self.orders.len()
    }

    /// Whether no orders are live.
    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }
}
