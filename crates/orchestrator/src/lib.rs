//! Order placement orchestration.
//!
//! The orchestrator sequences a placement through these steps:
//! 1. Check stock availability for every line
//! 2. Reserve stock
//! 3. Charge the payment method once
//! 4. Persist the confirmed order
//! 5. Commit the stock reservations
//!
//! A failure before the charge releases every reservation. A failure to
//! persist after a successful charge records a compensation entry instead
//! of reversing the payment. Notification is dispatched in the background
//! once the order is confirmed.

pub mod config;
pub mod error;
pub mod orchestrator;
pub mod services;
pub mod state;

pub use config::OrchestratorConfig;
pub use error::PlaceOrderError;
pub use orchestrator::OrderOrchestrator;
pub use services::{
    InMemoryNotifier, InMemoryPaymentProcessor, LoggingNotifier, NotificationError, Notifier,
    PaymentProcessor,
};
pub use state::PlacementState;
