//! Shared identifier types used across the order placement crates.

pub mod types;

pub use types::OrderId;
