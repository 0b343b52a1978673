//! Crossing detection logic
//!
//! Determines when an incoming limit order can match the opposite side's
//! best price.

use types::numeric::Price;
use types::order::Side;

/// Check if an incoming limit order crosses the opposite best price
///
/// A buy crosses when its limit is at or above the best ask; a sell crosses
/// when its limit is at or below the best bid.
pub fn crosses(incoming_side: Side, limit_price: Price, best_price: Price) -> bool {
    match incoming_side {
        Side::Buy => limit_price >= best_price,
        Side::Sell => limit_price <= best_price,
        Side::NoAction => false,
    }
}
