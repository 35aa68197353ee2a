//! Order persistence for the order placement workflow.
//!
//! An [`OrderStore`] saves an order header and all of its lines as one
//! atomic unit, and keeps compensation records for payments that were
//! charged but could not be matched with a persisted order.

pub mod error;
pub mod memory;
pub mod postgres;
pub mod store;

pub use common::OrderId;
pub use error::{Result, StoreError};
pub use memory::InMemoryOrderStore;
pub use postgres::PostgresOrderStore;
pub use store::OrderStore;
