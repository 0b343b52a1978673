//! Trade model
//!
//! An execution between one buy and one sell order. Trades are append-only:
//! once emitted they are never mutated or deleted.

use crate::numeric::Price;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A matched execution between a buy and a sell order
///
/// `trade_id` is assigned by the durable store when present; in-process
/// trades carry no identity and omit the field on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trade_id: Option<u64>,
    pub buy_order_id: u64,
    pub sell_order_id: u64,
    pub price: Price,
    #[serde(rename = "quantity")]
    pub size: u64,
    pub timestamp: DateTime<Utc>,
}

impl Trade {
    /// Create a new trade with no store-assigned identity
    pub fn new(
        buy_order_id: u64,
        sell_order_id: u64,
        price: Price,
        size: u64,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            trade_id: None,
            buy_order_id,
            sell_order_id,
            price,
            size,
            timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trade_creation() {
        let trade = Trade::new(2, 1, Price::from_u64(101), 10, Utc::now());
        assert_eq!(trade.buy_order_id, 2);
        assert_eq!(trade.sell_order_id, 1);
        assert_eq!(trade.size, 10);
        assert!(trade.trade_id.is_none());
    }

    #[test]
    fn test_trade_id_omitted_on_wire() {
        let trade = Trade::new(2, 1, Price::from_u64(101), 10, Utc::now());
        let json = serde_json::to_string(&trade).unwrap();
        assert!(!json.contains("trade_id"));
        assert!(json.contains("\"quantity\":10"));
    }

    #[test]
    fn test_trade_roundtrip() {
        let mut trade = Trade::new(2, 1, Price::from_str("101.5").unwrap(), 10, Utc::now());
        trade.trade_id = Some(7);

        let json = serde_json::to_string(&trade).unwrap();
        assert!(json.contains("\"trade_id\":7"));

        let deserialized: Trade = serde_json::from_str(&json).unwrap();
        assert_eq!(trade, deserialized);
    }
}
