//! Stock ledger for the order placement workflow.
//!
//! Stock is taken in two phases: a `reserve` places an expiring hold against
//! a product's available quantity, and a `commit` turns that hold into a
//! permanent decrement. Holds that are neither committed nor released are
//! dropped by the [`ReservationSweeper`] once they expire.

pub mod config;
pub mod error;
pub mod ledger;
pub mod memory;
pub mod sweeper;

pub use config::LedgerConfig;
pub use error::{LedgerError, Result};
pub use ledger::{ReservationId, ReservationToken, StockLedger, StockLevel};
pub use memory::InMemoryStockLedger;
pub use sweeper::{ReservationSweeper, SweeperHandle};
