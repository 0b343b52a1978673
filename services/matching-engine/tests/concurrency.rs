//! Concurrency test
//!
//! Hammers one engine instance from parallel threads: concurrent placements
//! serialize through the writer lock, snapshot readers never observe torn
//! levels, and every cancellation wins exactly once.

use matching_engine::{Engine, EngineConfig, LimitsConfig};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use storage::{CompositeOrderStore, CompositeTradeStore, MemoryConfig, MemoryOrderStore, MemoryTradeStore, StorageConfig};
use types::numeric::Price;
use types::order::Side;
use types::Order;

fn engine_with_capacity(max_trades: usize) -> Engine {
    let config = EngineConfig {
        storage: StorageConfig {
            memory: MemoryConfig {
                enabled: true,
                max_orders: 100_000,
                max_trades,
            },
            ..StorageConfig::default()
        },
        ..EngineConfig::default()
    };
    Engine::new(config)
}

fn limit(engine: &Engine, user: &str, side: Side, price: u64, size: u64) -> Order {
    Order::limit(
        engine.generate_order_id(),
        user,
        "BTC-USD",
        side,
        Price::from_u64(price),
        size,
    )
}

#[test]
fn test_concurrent_matched_pairs_conserve_size() {
    let engine = Arc::new(engine_with_capacity(10_000));
    let threads = 4;
    let pairs_per_thread = 250;

    let handles: Vec<_> = (0..threads)
        .map(|t| {
            let engine = Arc::clone(&engine);
            thread::spawn(move || {
                let user = format!("user-{}", t);
                for _ in 0..pairs_per_thread {
                    engine.place(limit(&engine, &user, Side::Sell, 100, 1));
                    engine.place(limit(&engine, &user, Side::Buy, 100, 1));
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    // Equal buy and sell flow at one price always nets out: a resting buy
    // and a resting sell at 100 would cross, which the engine never allows.
    assert_eq!(engine.open_order_count(), 0);
    assert!(engine.best_bid().is_none());
    assert!(engine.best_ask().is_none());

    let trades = engine.recent_trades(0);
    assert_eq!(trades.len(), threads * pairs_per_thread);
    assert!(trades.iter().all(|t| t.size == 1));
}

#[test]
fn test_snapshot_readers_see_consistent_levels() {
    let engine = Arc::new(engine_with_capacity(1_000));
    let stop = Arc::new(AtomicBool::new(false));

    let readers: Vec<_> = (0..2)
        .map(|_| {
            let engine = Arc::clone(&engine);
            let stop = Arc::clone(&stop);
            thread::spawn(move || {
                while !stop.load(Ordering::Relaxed) {
                    for price in engine.ask_prices() {
                        // A listed level must be observable and internally
                        // consistent within one read.
                        let orders = engine.level(Side::Sell, price);
                        if let Some((total, count)) = engine.level_summary(Side::Sell, price) {
                            if orders.len() == count {
                                assert_eq!(
                                    total,
                                    orders.iter().map(|o| o.size).sum::<u64>(),
                                    "torn level read at {}",
                                    price
                                );
                            }
                        }
                    }
                }
            })
        })
        .collect();

    let writer = {
        let engine = Arc::clone(&engine);
        thread::spawn(move || {
            for round in 0..200u64 {
                let price = 100 + (round % 10);
                let order = limit(&engine, "maker", Side::Sell, price, 5);
                let id = order.id;
                engine.place(order);
                if round % 3 == 0 {
                    engine.cancel(id);
                }
            }
        })
    };

    writer.join().unwrap();
    stop.store(true, Ordering::Relaxed);
    for reader in readers {
        reader.join().unwrap();
    }
}

#[test]
fn test_concurrent_cancels_win_once() {
    let engine = Arc::new(engine_with_capacity(1_000));

    let ids: Vec<u64> = (0..400)
        .map(|i| {
            let order = limit(&engine, "maker", Side::Buy, 90 + (i % 5), 1);
            let id = order.id;
            engine.place(order);
            id
        })
        .collect();

    // Two threads race to cancel the same ids.
    let handles: Vec<_> = (0..2)
        .map(|_| {
            let engine = Arc::clone(&engine);
            let ids = ids.clone();
            thread::spawn(move || {
                let mut won = 0usize;
                for id in ids {
                    if engine.cancel(id) {
                        won += 1;
                    }
                }
                won
            })
        })
        .collect();

    let total_wins: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
    assert_eq!(total_wins, 400, "each cancel must succeed exactly once");
    assert_eq!(engine.open_order_count(), 0);
    assert!(engine.bid_prices().is_empty());
}

#[test]
fn test_id_generation_is_unique_across_threads() {
    let engine = Arc::new(engine_with_capacity(100));

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let engine = Arc::clone(&engine);
            thread::spawn(move || (0..1_000).map(|_| engine.generate_order_id()).collect::<Vec<u64>>())
        })
        .collect();

    let mut seen = HashSet::new();
    for handle in handles {
        for id in handle.join().unwrap() {
            assert!(seen.insert(id), "duplicate order id {}", id);
        }
    }
    assert_eq!(seen.len(), 4_000);
}

#[test]
fn test_trade_ring_has_its_own_lock() {
    // Trade reads must proceed while the book lock is held by writers;
    // exercised here by interleaving reads with heavy write traffic.
    let orders = CompositeOrderStore::new(vec![Box::new(MemoryOrderStore::new(10_000))]);
    let trades = CompositeTradeStore::new(vec![Box::new(MemoryTradeStore::new(10_000))]);
    let engine = Arc::new(Engine::with_stores(orders, trades, LimitsConfig::default()));

    let writer = {
        let engine = Arc::clone(&engine);
        thread::spawn(move || {
            for _ in 0..500 {
                engine.place(limit(&engine, "a", Side::Sell, 100, 1));
                engine.place(limit(&engine, "b", Side::Buy, 100, 1));
            }
        })
    };
    let reader = {
        let engine = Arc::clone(&engine);
        thread::spawn(move || {
            let mut max_seen = 0usize;
            for _ in 0..2_000 {
                max_seen = max_seen.max(engine.recent_trades(0).len());
            }
            max_seen
        })
    };

    writer.join().unwrap();
    let _ = reader.join().unwrap();
    assert_eq!(engine.recent_trades(0).len(), 500);
}
