//! Order model
//!
//! A submission carries an immutable identity and a mutable residual size.
//! Kind and side use integer wire representations so they round-trip through
//! the durable schema's `order_type int` / `side int` columns unchanged.

use crate::errors::OrderError;
use crate::numeric::Price;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_repr::{Deserialize_repr, Serialize_repr};

/// Order kind
///
/// Stop kinds are accepted at admission but carry no trigger logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize_repr, Deserialize_repr)]
#[repr(u8)]
pub enum OrderKind {
    NoAction = 0,
    Market = 1,
    Limit = 2,
    Cancel = 3,
    StopMarket = 4,
    StopLimit = 5,
}

impl OrderKind {
    /// Stop kinds are tracked but never matched or rested.
    pub fn is_stop(&self) -> bool {
        matches!(self, OrderKind::StopMarket | OrderKind::StopLimit)
    }
}

/// Order side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize_repr, Deserialize_repr)]
#[repr(u8)]
pub enum Side {
    NoAction = 0,
    Buy = 1,
    Sell = 2,
}

impl Side {
    /// Get the opposite side
    pub fn opposite(&self) -> Self {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
            Side::NoAction => Side::NoAction,
        }
    }
}

/// A single order submission
///
/// `size` is the residual quantity: positive on entry, decremented on fill,
/// zero once fully filled. `timestamp` is assigned at construction and never
/// mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: u64,
    pub user_id: String,
    pub symbol: String,
    #[serde(rename = "order_type")]
    pub kind: OrderKind,
    pub side: Side,
    pub price: Price,
    pub stop_price: Price,
    pub size: u64,
    pub timestamp: DateTime<Utc>,
}

impl Order {
    /// Create a new order, stamping the submission instant
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: u64,
        user_id: impl Into<String>,
        symbol: impl Into<String>,
        kind: OrderKind,
        side: Side,
        price: Price,
        stop_price: Price,
        size: u64,
    ) -> Self {
        Self {
            id,
            user_id: user_id.into(),
            symbol: symbol.into(),
            kind,
            side,
            price,
            stop_price,
            size,
            timestamp: Utc::now(),
        }
    }

    /// Convenience constructor for a limit order
    pub fn limit(
        id: u64,
        user_id: impl Into<String>,
        symbol: impl Into<String>,
        side: Side,
        price: Price,
        size: u64,
    ) -> Self {
        Self::new(id, user_id, symbol, OrderKind::Limit, side, price, Price::zero(), size)
    }

    /// Convenience constructor for a market order (no limit price)
    pub fn market(
        id: u64,
        user_id: impl Into<String>,
        symbol: impl Into<String>,
        side: Side,
        size: u64,
    ) -> Self {
        Self::new(id, user_id, symbol, OrderKind::Market, side, Price::zero(), Price::zero(), size)
    }

    /// Convenience constructor for a cancel submission targeting `id`
    pub fn cancel(id: u64, user_id: impl Into<String>, symbol: impl Into<String>) -> Self {
        Self::new(id, user_id, symbol, OrderKind::Cancel, Side::NoAction, Price::zero(), Price::zero(), 0)
    }

    /// Validity predicate applied by collaborators before submission:
    /// kind != NoAction, side != NoAction, size > 0, and limit orders must
    /// carry a positive price. Cancel submissions are exempt from the side
    /// and size requirements (they only carry a target identity).
    pub fn validate(&self) -> Result<(), OrderError> {
        if self.kind == OrderKind::NoAction {
            return Err(OrderError::InvalidKind);
        }
        if self.kind == OrderKind::Cancel {
            return Ok(());
        }
        if self.side == Side::NoAction {
            return Err(OrderError::InvalidSide);
        }
        if self.size == 0 {
            return Err(OrderError::InvalidSize);
        }
        if self.kind == OrderKind::Limit && self.price.is_zero() {
            return Err(OrderError::InvalidPrice(
                "limit orders require a positive price".to_string(),
            ));
        }
        Ok(())
    }

    /// Check if the order has been fully filled
    pub fn is_filled(&self) -> bool {
        self.size == 0
    }
}
