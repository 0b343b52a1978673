//! Matching engine core
//!
//! Applies incoming orders to the book under price-time priority, emits the
//! resulting trades, and writes through the layered stores. The book and
//! tracker share one readers-writer lock: `place` and `cancel` are writers,
//! snapshot queries are readers. Store IO runs on the caller thread after
//! the book lock is released, under a commit mutex that pins durable trade
//! order to matching order.

use crate::book::{FillOutcome, OrderBook};
use crate::config::{EngineConfig, LimitsConfig};
use crate::matching::crossing;
use crate::tracker::OrderTracker;
use chrono::Utc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, RwLock};
use storage::{build_order_store, build_trade_store};
use storage::{CompositeOrderStore, CompositeTradeStore, OrderStore, StoreError, TradeStore};
use tracing::debug;
use types::numeric::Price;
use types::order::{OrderKind, Side};
use types::{Order, Trade};

const LOCK: &str = "engine lock poisoned";

#[derive(Debug, Default)]
struct EngineState {
    book: OrderBook,
    tracker: OrderTracker,
}

/// Continuous double-auction matching engine for a single instrument
pub struct Engine {
    state: RwLock<EngineState>,
    /// Held across store fan-out so trades from an earlier match commit
    /// before trades from a later one. Acquired while still holding the
    /// writer lock; released after the stores have been written.
    commit: Mutex<()>,
    next_order_id: AtomicU64,
    order_store: CompositeOrderStore,
    trade_store: CompositeTradeStore,
    limits: LimitsConfig,
}

impl Engine {
    /// Build an engine with the stores described by `config`
    pub fn new(config: EngineConfig) -> Self {
        let order_store = build_order_store(&config.storage);
        let trade_store = build_trade_store(&config.storage);
        Self::with_stores(order_store, trade_store, config.limits)
    }

    /// Build an engine over pre-assembled stores
    pub fn with_stores(
        order_store: CompositeOrderStore,
        trade_store: CompositeTradeStore,
        limits: LimitsConfig,
    ) -> Self {
        Self {
            state: RwLock::new(EngineState::default()),
            commit: Mutex::new(()),
            next_order_id: AtomicU64::new(1),
            order_store,
            trade_store,
            limits,
        }
    }

    /// Next order identity. Strictly monotonic for the process lifetime;
    /// identities are never reused after cancellation.
    pub fn generate_order_id(&self) -> u64 {
        self.next_order_id.fetch_add(1, Ordering::SeqCst)
    }

    /// Apply an order to the book, returning the trades it produced.
    ///
    /// Cancels, no-ops, and inert stop submissions produce no trades. Market
    /// orders never rest: any residual that finds no liquidity is discarded.
    /// A limit order's residual rests at its own price, at the tail of that
    /// level.
    pub fn place(&self, order: Order) -> Vec<Trade> {
        match order.kind {
            OrderKind::Market | OrderKind::Limit => self.execute(order),
            OrderKind::Cancel => {
                self.cancel(order.id);
                Vec::new()
            }
            OrderKind::StopMarket | OrderKind::StopLimit => {
                // Accepted but inert: tracked and persisted, never matched.
                let mut state = self.state.write().expect(LOCK);
                state.tracker.track(order.clone());
                let _commit = self.commit.lock().expect(LOCK);
                drop(state);
                if let Err(e) = self.order_store.save(&order) {
                    debug!(order_id = order.id, error = %e, "stop order persist failed");
                }
                Vec::new()
            }
            OrderKind::NoAction => Vec::new(),
        }
    }

    fn execute(&self, mut order: Order) -> Vec<Trade> {
        let mut trades = Vec::new();
        // Resting orders consumed entirely by this call, for store removal.
        let mut filled: Vec<Order> = Vec::new();
        // A partial fill can only hit the last counterparty.
        let mut partial: Option<Order> = None;

        let mut state = self.state.write().expect(LOCK);
        state.tracker.track(order.clone());

        let opposite = order.side.opposite();
        while order.size > 0 {
            let Some((best_price, resting_id, resting_size)) = state.book.peek_best(opposite)
            else {
                // No liquidity: market residual is discarded, limit residual
                // will rest below.
                break;
            };
            if order.kind == OrderKind::Limit
                && !crossing::crosses(order.side, order.price, best_price)
            {
                break;
            }

            let fill = order.size.min(resting_size);
            // Price improvement: execute at the resting order's price.
            trades.push(trade_between(&order, resting_id, best_price, fill));
            order.size -= fill;

            match state.book.fill(resting_id, fill) {
                FillOutcome::Removed(resting) => {
                    state.tracker.untrack(resting.id);
                    filled.push(resting);
                }
                FillOutcome::Remaining(residual) => {
                    state.tracker.sync_size(resting_id, residual);
                    partial = state.tracker.get(resting_id).cloned();
                }
            }
        }

        let mut rested: Option<Order> = None;
        if order.kind == OrderKind::Limit && order.size > 0 {
            state.tracker.sync_size(order.id, order.size);
            let inserted = match order.side {
                Side::Buy => state.book.add_bid(order.clone()),
                Side::Sell => state.book.add_ask(order.clone()),
                Side::NoAction => false,
            };
            if inserted {
                rested = Some(order);
            } else {
                state.tracker.untrack(order.id);
            }
        } else {
            state.tracker.untrack(order.id);
        }

        let _commit = self.commit.lock().expect(LOCK);
        drop(state);

        for trade in &trades {
            if let Err(e) = self.trade_store.save(trade) {
                debug!(
                    buy = trade.buy_order_id,
                    sell = trade.sell_order_id,
                    error = %e,
                    "trade persist failed"
                );
            }
        }
        if let Some(resting) = &rested {
            if let Err(e) = self.order_store.save(resting) {
                debug!(order_id = resting.id, error = %e, "resting order persist failed");
            }
        }
        if let Some(counterparty) = &partial {
            if let Err(e) = self.order_store.update(counterparty) {
                debug!(order_id = counterparty.id, error = %e, "partial fill persist failed");
            }
        }
        for consumed in &filled {
            if let Err(e) = self.order_store.remove(consumed.id) {
                debug!(order_id = consumed.id, error = %e, "filled order cleanup failed");
            }
        }

        trades
    }

    /// Cancel a live order. Returns false for an unknown id; never produces
    /// a trade.
    pub fn cancel(&self, order_id: u64) -> bool {
        let mut state = self.state.write().expect(LOCK);
        if !state.tracker.contains(order_id) {
            return false;
        }
        // Inert stop orders are tracked without resting, so the book may not
        // hold the id.
        state.book.remove(order_id);
        state.tracker.untrack(order_id);

        let _commit = self.commit.lock().expect(LOCK);
        drop(state);
        if let Err(e) = self.order_store.remove(order_id) {
            debug!(order_id, error = %e, "canceled order cleanup failed");
        }
        true
    }

    /// Remove every order resting at one price, returning how many were
    /// flushed.
    pub fn drain_level(&self, side: Side, price: Price) -> usize {
        let mut state = self.state.write().expect(LOCK);
        let removed = state.book.drain_level(side, price);
        for order in &removed {
            state.tracker.untrack(order.id);
        }

        let _commit = self.commit.lock().expect(LOCK);
        drop(state);
        for order in &removed {
            if let Err(e) = self.order_store.remove(order.id) {
                debug!(order_id = order.id, error = %e, "drained order cleanup failed");
            }
        }
        removed.len()
    }

    /// Best resting buy: price and the time-priority head order.
    pub fn best_bid(&self) -> Option<(Price, Order)> {
        let state = self.state.read().expect(LOCK);
        state.book.best_bid().map(|(p, o)| (p, o.clone()))
    }

    /// Best resting sell: price and the time-priority head order.
    pub fn best_ask(&self) -> Option<(Price, Order)> {
        let state = self.state.read().expect(LOCK);
        state.book.best_ask().map(|(p, o)| (p, o.clone()))
    }

    /// All bid prices, best first. One consistent snapshot.
    pub fn bid_prices(&self) -> Vec<Price> {
        self.state.read().expect(LOCK).book.bid_prices()
    }

    /// All ask prices, best first. One consistent snapshot.
    pub fn ask_prices(&self) -> Vec<Price> {
        self.state.read().expect(LOCK).book.ask_prices()
    }

    /// FIFO snapshot of the orders resting at one price.
    pub fn level(&self, side: Side, price: Price) -> Vec<Order> {
        let state = self.state.read().expect(LOCK);
        state
            .book
            .get_level(side, price)
            .into_iter()
            .cloned()
            .collect()
    }

    /// Aggregates for one level: (total size, order count).
    pub fn level_summary(&self, side: Side, price: Price) -> Option<(u64, usize)> {
        self.state.read().expect(LOCK).book.level_summary(side, price)
    }

    /// Look up a live order by identity.
    pub fn get_order(&self, order_id: u64) -> Option<Order> {
        self.state.read().expect(LOCK).tracker.get(order_id).cloned()
    }

    /// Snapshot of every live order.
    pub fn orders(&self) -> Vec<Order> {
        self.state.read().expect(LOCK).tracker.get_all()
    }

    /// Snapshot of one participant's live orders.
    pub fn orders_by_user(&self, user_id: &str) -> Vec<Order> {
        self.state.read().expect(LOCK).tracker.get_by_user(user_id)
    }

    /// Snapshot of the live orders on one side.
    pub fn orders_by_side(&self, side: Side) -> Vec<Order> {
        self.state.read().expect(LOCK).tracker.get_by_side(side)
    }

    /// Identities of every live order.
    pub fn order_ids(&self) -> Vec<u64> {
        self.state.read().expect(LOCK).tracker.ids()
    }

    /// Number of live orders (resting plus inert stops).
    pub fn open_order_count(&self) -> usize {
        self.state.read().expect(LOCK).tracker.len()
    }

    /// Number of orders resting in the book.
    pub fn resting_order_count(&self) -> usize {
        self.state.read().expect(LOCK).book.order_count()
    }

    /// The most recent trades, newest first.
    pub fn recent_trades(&self, limit: usize) -> Vec<Trade> {
        match self.trade_store.get_recent(limit) {
            Ok(trades) => trades,
            Err(e) => {
                debug!(error = %e, "recent trade read failed");
                Vec::new()
            }
        }
    }

    /// Response paging bounds for API collaborators.
    pub fn limits(&self) -> &LimitsConfig {
        &self.limits
    }

    /// Order store handle for API collaborators.
    pub fn order_store(&self) -> &CompositeOrderStore {
        &self.order_store
    }

    /// Trade store handle for API collaborators.
    pub fn trade_store(&self) -> &CompositeTradeStore {
        &self.trade_store
    }

    /// Release store resources, draining the audit sink.
    pub fn close(&self) -> Result<(), StoreError> {
        let orders = self.order_store.close();
        let trades = self.trade_store.close();
        orders.and(trades)
    }
}

/// Build the trade for one fill, assigning buy/sell ids from the aggressor
/// side and executing at the resting order's price.
fn trade_between(incoming: &Order, resting_id: u64, price: Price, size: u64) -> Trade {
    let (buy_order_id, sell_order_id) = if incoming.side == Side::Buy {
        (incoming.id, resting_id)
    } else {
        (resting_id, incoming.id)
    };
    Trade::new(buy_order_id, sell_order_id, price, size, Utc::now())
}
