//! Engine configuration
//!
//! Passed explicitly to the engine constructor; there is no process-global
//! configuration holder.

use storage::StorageConfig;

/// Response paging bounds consumed by the API collaborator
#[derive(Debug, Clone)]
pub struct LimitsConfig {
    pub default_order_list: usize,
    pub max_order_list: usize,
    pub default_trade_list: usize,
    pub max_trade_list: usize,
    pub default_book_depth: usize,
    pub max_book_depth: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            default_order_list: 100,
            max_order_list: 1_000,
            default_trade_list: 100,
            max_trade_list: 1_000,
            default_book_depth: 10,
            max_book_depth: 10,
        }
    }
}

impl LimitsConfig {
    /// Resolve a requested order-list size against the configured bounds.
    pub fn clamp_order_list(&self, requested: Option<usize>) -> usize {
        clamp(requested, self.default_order_list, self.max_order_list)
    }

    /// Resolve a requested trade-list size against the configured bounds.
    pub fn clamp_trade_list(&self, requested: Option<usize>) -> usize {
        clamp(requested, self.default_trade_list, self.max_trade_list)
    }

    /// Resolve a requested book depth against the configured bounds.
    pub fn clamp_book_depth(&self, requested: Option<usize>) -> usize {
        clamp(requested, self.default_book_depth, self.max_book_depth)
    }
}

fn clamp(requested: Option<usize>, default: usize, max: usize) -> usize {
    match requested {
        None | Some(0) => default,
        Some(n) => n.min(max),
    }
}

/// Complete engine configuration
#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    pub storage: StorageConfig,
    pub limits: LimitsConfig,
}
