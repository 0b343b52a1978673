//! Matching logic module
//!
//! Crossing predicates for price-time priority matching.

pub mod crossing;

pub use crossing::crosses;
