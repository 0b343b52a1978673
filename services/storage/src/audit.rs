//! Append-only audit sink
//!
//! Writes one NDJSON record per trade to an append-only file:
//!
//! ```text
//! {"buy_order_id":2,"sell_order_id":1,"price":101.0,"quantity":10,"timestamp":"2026-08-02T10:15:30.123456789Z"}
//! ```
//!
//! Records appear in emission order. A single writer thread owns the file;
//! `save` enqueues and returns immediately, `close` drains everything still
//! queued before releasing the file. The file is never truncated.

use crate::error::{StoreError, StoreResult};
use crate::TradeStore;
use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use serde::Serialize;
use std::fs::OpenOptions;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Sender};
use std::sync::Mutex;
use std::thread::{self, JoinHandle};
use tracing::error;
use types::Trade;

/// Wire form of one audit line
#[derive(Debug, Serialize)]
struct AuditRecord {
    buy_order_id: u64,
    sell_order_id: u64,
    price: f64,
    quantity: u64,
    timestamp: DateTime<Utc>,
}

impl From<&Trade> for AuditRecord {
    fn from(trade: &Trade) -> Self {
        Self {
            buy_order_id: trade.buy_order_id,
            sell_order_id: trade.sell_order_id,
            price: trade.price.as_decimal().to_f64().unwrap_or(0.0),
            quantity: trade.size,
            timestamp: trade.timestamp,
        }
    }
}

/// Write-only audit log backed by a serialized writer thread
pub struct AuditTradeStore {
    tx: Mutex<Option<Sender<Trade>>>,
    writer: Mutex<Option<JoinHandle<()>>>,
    path: PathBuf,
}

impl AuditTradeStore {
    /// Open (or create) the audit file at `path` and start the writer
    pub fn open(path: impl Into<PathBuf>) -> StoreResult<Self> {
        let path = path.into();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let mut out = BufWriter::new(file);

        let (tx, rx) = mpsc::channel::<Trade>();
        let writer = thread::Builder::new()
            .name("audit-writer".to_string())
            .spawn(move || {
                for trade in rx {
                    if let Err(e) = write_record(&mut out, &trade) {
                        error!(error = %e, "audit write failed");
                    }
                }
                // Channel closed: drain buffered bytes to disk.
                if let Err(e) = out.flush() {
                    error!(error = %e, "audit flush on close failed");
                }
            })?;

        Ok(Self {
            tx: Mutex::new(Some(tx)),
            writer: Mutex::new(Some(writer)),
            path,
        })
    }

    /// Path of the underlying audit file
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn enqueue(&self, trade: &Trade) -> StoreResult<()> {
        let tx = self.tx.lock().expect("audit sender lock poisoned");
        match tx.as_ref() {
            Some(tx) => tx
                .send(trade.clone())
                .map_err(|_| StoreError::Unavailable("audit writer stopped".to_string())),
            None => Err(StoreError::Closed),
        }
    }
}

fn write_record(out: &mut BufWriter<std::fs::File>, trade: &Trade) -> std::io::Result<()> {
    let record = AuditRecord::from(trade);
    serde_json::to_writer(&mut *out, &record)?;
    out.write_all(b"\n")?;
    out.flush()
}

impl TradeStore for AuditTradeStore {
    fn save(&self, trade: &Trade) -> StoreResult<()> {
        self.enqueue(trade)
    }

    fn save_batch(&self, trades: &[Trade]) -> StoreResult<()> {
        for trade in trades {
            self.enqueue(trade)?;
        }
        Ok(())
    }

    /// The audit log is write-only; reads come from other layers.
    fn get_recent(&self, _limit: usize) -> StoreResult<Vec<Trade>> {
        Ok(Vec::new())
    }

    fn close(&self) -> StoreResult<()> {
        // Dropping the sender closes the channel; the writer drains the
        // queue, flushes, and exits.
        self.tx.lock().expect("audit sender lock poisoned").take();
        if let Some(handle) = self.writer.lock().expect("audit writer lock poisoned").take() {
            handle
                .join()
                .map_err(|_| StoreError::Unavailable("audit writer panicked".to_string()))?;
        }
        Ok(())
    }
}

impl Drop for AuditTradeStore {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::numeric::Price;

    fn trade(buy: u64, sell: u64, price: &str, size: u64) -> Trade {
        Trade::new(buy, sell, Price::from_str(price).unwrap(), size, Utc::now())
    }

    #[test]
    fn test_records_are_ndjson_in_emission_order() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("trades.log");

        let store = AuditTradeStore::open(&path).unwrap();
        store.save(&trade(2, 1, "101.5", 10)).unwrap();
        store.save(&trade(4, 3, "102", 5)).unwrap();
        store.close().unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);

        let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["buy_order_id"], 2);
        assert_eq!(first["sell_order_id"], 1);
        assert_eq!(first["price"], 101.5);
        assert_eq!(first["quantity"], 10);
        assert!(first["timestamp"].is_string());

        let second: serde_json::Value = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(second["buy_order_id"], 4);
    }

    #[test]
    fn test_close_drains_pending_writes() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("trades.log");

        let store = AuditTradeStore::open(&path).unwrap();
        for i in 0..200 {
            store.save(&trade(i * 2 + 2, i * 2 + 1, "100", 1)).unwrap();
        }
        store.close().unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.lines().count(), 200);
    }

    #[test]
    fn test_save_after_close_fails() {
        let dir = tempfile::TempDir::new().unwrap();
        let store = AuditTradeStore::open(dir.path().join("trades.log")).unwrap();
        store.close().unwrap();
        assert!(matches!(
            store.save(&trade(2, 1, "100", 1)),
            Err(StoreError::Closed)
        ));
    }

    #[test]
    fn test_file_is_appended_not_truncated() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("trades.log");

        let store = AuditTradeStore::open(&path).unwrap();
        store.save(&trade(2, 1, "100", 1)).unwrap();
        store.close().unwrap();

        let reopened = AuditTradeStore::open(&path).unwrap();
        reopened.save(&trade(4, 3, "100", 1)).unwrap();
        reopened.close().unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.lines().count(), 2);
    }

    #[test]
    fn test_reads_are_empty() {
        let dir = tempfile::TempDir::new().unwrap();
        let store = AuditTradeStore::open(dir.path().join("trades.log")).unwrap();
        store.save(&trade(2, 1, "100", 1)).unwrap();
        assert!(store.get_recent(10).unwrap().is_empty());
    }
}
