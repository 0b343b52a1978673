//! In-process trade ring buffer
//!
//! Keeps the N most recently appended trades. Guarded by its own
//! readers-writer lock, independent of the book lock, so trade reads never
//! contend with matching.

use crate::error::{StoreError, StoreResult};
use crate::TradeStore;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;
use types::Trade;

/// Bounded in-memory trade store
#[derive(Debug)]
pub struct MemoryTradeStore {
    trades: RwLock<VecDeque<Trade>>,
    max_trades: usize,
    closed: AtomicBool,
}

impl MemoryTradeStore {
    /// Create a ring buffer holding at most `max_trades` entries
    pub fn new(max_trades: usize) -> Self {
        Self {
            trades: RwLock::new(VecDeque::with_capacity(max_trades)),
            max_trades,
            closed: AtomicBool::new(false),
        }
    }

    fn check_open(&self) -> StoreResult<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(StoreError::Closed);
        }
        Ok(())
    }

    fn push(&self, buffer: &mut VecDeque<Trade>, trade: Trade) {
        if buffer.len() >= self.max_trades {
            buffer.pop_front();
        }
        buffer.push_back(trade);
    }

    /// Number of buffered trades
    pub fn len(&self) -> usize {
        self.trades.read().expect("trade store lock poisoned").len()
    }

    /// Whether the buffer is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl TradeStore for MemoryTradeStore {
    fn save(&self, trade: &Trade) -> StoreResult<()> {
        self.check_open()?;
        let mut buffer = self.trades.write().expect("trade store lock poisoned");
        self.push(&mut buffer, trade.clone());
        Ok(())
    }

    fn save_batch(&self, trades: &[Trade]) -> StoreResult<()> {
        self.check_open()?;
        let mut buffer = self.trades.write().expect("trade store lock poisoned");
        for trade in trades {
            self.push(&mut buffer, trade.clone());
        }
        Ok(())
    }

    fn get_recent(&self, limit: usize) -> StoreResult<Vec<Trade>> {
        self.check_open()?;
        let buffer = self.trades.read().expect("trade store lock poisoned");
        let limit = if limit == 0 || limit > buffer.len() {
            buffer.len()
        } else {
            limit
        };
        // Newest first
        Ok(buffer.iter().rev().take(limit).cloned().collect())
    }

    fn close(&self) -> StoreResult<()> {
        self.closed.store(true, Ordering::Release);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use types::numeric::Price;

    fn trade(buy: u64, sell: u64, size: u64) -> Trade {
        Trade::new(buy, sell, Price::from_u64(100), size, Utc::now())
    }

    #[test]
    fn test_save_and_get_recent_newest_first() {
        let store = MemoryTradeStore::new(10);
        for i in 1..=3 {
            store.save(&trade(i, 100 + i, i)).unwrap();
        }

        let recent = store.get_recent(2).unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].buy_order_id, 3);
        assert_eq!(recent[1].buy_order_id, 2);
    }

    #[test]
    fn test_zero_limit_returns_everything() {
        let store = MemoryTradeStore::new(10);
        for i in 1..=4 {
            store.save(&trade(i, 100 + i, i)).unwrap();
        }
        assert_eq!(store.get_recent(0).unwrap().len(), 4);
        assert_eq!(store.get_recent(100).unwrap().len(), 4);
    }

    #[test]
    fn test_ring_buffer_eviction() {
        let store = MemoryTradeStore::new(3);
        for i in 1..=5 {
            store.save(&trade(i, 100 + i, i)).unwrap();
        }

        assert_eq!(store.len(), 3);
        let recent = store.get_recent(10).unwrap();
        assert_eq!(recent[0].buy_order_id, 5);
        assert_eq!(recent[2].buy_order_id, 3);
    }

    #[test]
    fn test_save_batch() {
        let store = MemoryTradeStore::new(10);
        let batch: Vec<Trade> = (1..=4).map(|i| trade(i, 100 + i, i)).collect();
        store.save_batch(&batch).unwrap();

        assert_eq!(store.len(), 4);
        assert_eq!(store.get_recent(1).unwrap()[0].buy_order_id, 4);
    }

    #[test]
    fn test_closed_store_fails() {
        let store = MemoryTradeStore::new(10);
        store.close().unwrap();
        assert!(matches!(store.save(&trade(1, 2, 3)), Err(StoreError::Closed)));
        assert!(matches!(store.get_recent(10), Err(StoreError::Closed)));
    }
}
