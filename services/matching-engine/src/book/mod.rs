//! Two-sided limit order book
//!
//! Bids and asks are `BTreeMap`s keyed by the fixed-point price, giving
//! O(log P) extremum access in the number of price levels. Each level chains
//! its orders through the shared arena, and a side map from order id to
//! arena slot makes cancellation O(1) once the level is located.

pub mod price_level;

pub use price_level::PriceLevel;

use price_level::OrderNode;
use slab::Slab;
use std::collections::{BTreeMap, HashMap};
use types::numeric::Price;
use types::order::Side;
use types::Order;

/// Result of filling a resting order.
#[derive(Debug)]
pub enum FillOutcome {
    /// The order was partially filled and keeps resting with this residual.
    Remaining(u64),
    /// The order was fully filled and has been removed from the book.
    Removed(Order),
}

/// Price-indexed structure of resting orders for a single instrument
#[derive(Debug, Default)]
pub struct OrderBook {
    arena: Slab<OrderNode>,
    slots: HashMap<u64, usize>,
    bids: BTreeMap<Price, PriceLevel>,
    asks: BTreeMap<Price, PriceLevel>,
}

impl OrderBook {
    /// Create an empty book
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a buy order to the queue at its price, creating the level if
    /// absent. Returns false if the id is already resting.
    pub fn add_bid(&mut self, order: Order) -> bool {
        self.insert(Side::Buy, order)
    }

    /// Append a sell order to the queue at its price, creating the level if
    /// absent. Returns false if the id is already resting.
    pub fn add_ask(&mut self, order: Order) -> bool {
        self.insert(Side::Sell, order)
    }

    fn insert(&mut self, side: Side, order: Order) -> bool {
        debug_assert!(order.size > 0, "resting orders must have positive residual");
        if self.slots.contains_key(&order.id) {
            return false;
        }

        let id = order.id;
        let price = order.price;
        let slot = self.arena.insert(OrderNode::new(order));
        self.slots.insert(id, slot);

        let level = match side {
            Side::Buy => self.bids.entry(price).or_default(),
            Side::Sell => self.asks.entry(price).or_default(),
            Side::NoAction => return false,
        };
        level.push_back(&mut self.arena, slot);
        true
    }

    /// Highest resting buy: price and the time-priority head order.
    pub fn best_bid(&self) -> Option<(Price, &Order)> {
        let (price, level) = self.bids.last_key_value()?;
        let slot = level.head().expect("book holds an empty bid level");
        Some((*price, &self.arena[slot].order))
    }

    /// Lowest resting sell: price and the time-priority head order.
    pub fn best_ask(&self) -> Option<(Price, &Order)> {
        let (price, level) = self.asks.first_key_value()?;
        let slot = level.head().expect("book holds an empty ask level");
        Some((*price, &self.arena[slot].order))
    }

    /// Best level on `side` as (price, head id, head residual).
    pub(crate) fn peek_best(&self, side: Side) -> Option<(Price, u64, u64)> {
        let (price, order) = match side {
            Side::Buy => self.best_bid()?,
            Side::Sell => self.best_ask()?,
            Side::NoAction => return None,
        };
        Some((price, order.id, order.size))
    }

    /// Apply a fill to a resting order, unlinking it when exhausted.
    pub(crate) fn fill(&mut self, order_id: u64, amount: u64) -> FillOutcome {
        let slot = *self
            .slots
            .get(&order_id)
            .expect("fill target is not resting");
        let (side, price, residual) = {
            let order = &self.arena[slot].order;
            (order.side, order.price, order.size)
        };
        assert!(amount <= residual, "fill exceeds resting residual");

        if amount == residual {
            FillOutcome::Removed(self.remove_slot(side, price, slot))
        } else {
            self.arena[slot].order.size -= amount;
            let level = self
                .level_mut(side, price)
                .expect("resting order has no level");
            level.reduce(amount);
            FillOutcome::Remaining(residual - amount)
        }
    }

    /// Remove an order from whichever side holds it. Deletes the level if it
    /// becomes empty. Returns whether a removal occurred.
    pub fn remove(&mut self, order_id: u64) -> bool {
        let Some(&slot) = self.slots.get(&order_id) else {
            return false;
        };
        let (side, price) = {
            let order = &self.arena[slot].order;
            (order.side, order.price)
        };
        self.remove_slot(side, price, slot);
        true
    }

    /// Remove an entire level, returning its orders in FIFO order.
    pub fn drain_level(&mut self, side: Side, price: Price) -> Vec<Order> {
        let mut removed = Vec::new();
        while let Some(slot) = self.level(side, price).and_then(|l| l.head()) {
            removed.push(self.remove_slot(side, price, slot));
        }
        removed
    }

    /// Read-only FIFO view of the orders at a price.
    pub fn get_level(&self, side: Side, price: Price) -> Vec<&Order> {
        let mut orders = Vec::new();
        let Some(level) = self.level(side, price) else {
            return orders;
        };
        let mut cursor = level.head();
        while let Some(slot) = cursor {
            let node = &self.arena[slot];
            orders.push(&node.order);
            cursor = node.next;
        }
        orders
    }

    /// Aggregates for the level at a price: (total size, order count).
    pub fn level_summary(&self, side: Side, price: Price) -> Option<(u64, usize)> {
        self.level(side, price)
            .map(|l| (l.total_size(), l.order_count()))
    }

    /// All bid prices, best (highest) first.
    pub fn bid_prices(&self) -> Vec<Price> {
        self.bids.keys().rev().copied().collect()
    }

    /// All ask prices, best (lowest) first.
    pub fn ask_prices(&self) -> Vec<Price> {
        self.asks.keys().copied().collect()
    }

    /// Look up a resting order by id.
    pub fn get(&self, order_id: u64) -> Option<&Order> {
        let slot = self.slots.get(&order_id)?;
        Some(&self.arena[*slot].order)
    }

    /// Whether an order is resting in the book.
    pub fn contains(&self, order_id: u64) -> bool {
        self.slots.contains_key(&order_id)
    }

    /// Total number of resting orders across both sides.
    pub fn order_count(&self) -> usize {
        self.slots.len()
    }

    /// Whether both sides are empty.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    fn level(&self, side: Side, price: Price) -> Option<&PriceLevel> {
        match side {
            Side::Buy => self.bids.get(&price),
            Side::Sell => self.asks.get(&price),
            Side::NoAction => None,
        }
    }

    fn level_mut(&mut self, side: Side, price: Price) -> Option<&mut PriceLevel> {
        match side {
            Side::Buy => self.bids.get_mut(&price),
            Side::Sell => self.asks.get_mut(&price),
            Side::NoAction => None,
        }
    }

    fn remove_slot(&mut self, side: Side, price: Price, slot: usize) -> Order {
        {
            let level = match side {
                Side::Buy => self.bids.get_mut(&price),
                Side::Sell => self.asks.get_mut(&price),
                Side::NoAction => None,
            }
            .expect("resting order has no level");
            level.unlink(&mut self.arena, slot);
        }

        let emptied = self
            .level(side, price)
            .map(|l| l.is_empty())
            .unwrap_or(false);
        if emptied {
            match side {
                Side::Buy => self.bids.remove(&price),
                Side::Sell => self.asks.remove(&price),
                Side::NoAction => None,
            };
        }

        let node = self.arena.remove(slot);
        self.slots.remove(&node.order.id);
        node.order
    }
}
