//! Validation error taxonomy
//!
//! Malformed submissions are rejected by collaborators before they reach the
//! matching core.

use thiserror::Error;

/// Order validation errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OrderError {
    #[error("order kind must not be no-action")]
    InvalidKind,

    #[error("order side must not be no-action")]
    InvalidSide,

    #[error("order size must be positive")]
    InvalidSize,

    #[error("invalid price: {0}")]
    InvalidPrice(String),
}
