//! External collaborator traits and in-memory implementations.

pub mod notification;
pub mod payment;

pub use notification::{InMemoryNotifier, LoggingNotifier, NotificationError, Notifier};
pub use payment::{InMemoryPaymentProcessor, PaymentProcessor};
