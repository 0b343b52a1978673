//! Matching engine
//!
//! Continuous double-auction matching for a single instrument: a two-sided
//! limit order book with price-time priority, an order tracker for O(1)
//! lookup and cancellation, and write-through persistence via the layered
//! stores.
//!
//! **Key invariants:**
//! - Price-time priority strictly enforced
//! - Crossing orders execute at the resting order's price
//! - The book is never crossed between calls
//! - Matching success is independent of store acknowledgement

pub mod book;
pub mod config;
pub mod engine;
pub mod matching;
pub mod tracker;

pub use book::OrderBook;
pub use config::{EngineConfig, LimitsConfig};
pub use engine::Engine;
pub use tracker::OrderTracker;
