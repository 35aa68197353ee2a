use common::OrderId;
use domain::DomainError;
use thiserror::Error;

/// Errors that can occur when persisting or loading orders.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The order already carries an identifier and cannot be saved again.
    #[error("Order already persisted: {0}")]
    AlreadyPersisted(OrderId),

    /// The store is not accepting writes.
    #[error("Order store unavailable: {0}")]
    Unavailable(String),

    /// Stored data no longer forms a valid order.
    #[error("Corrupt order data: {0}")]
    Corrupt(String),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

impl From<DomainError> for StoreError {
    fn from(e: DomainError) -> Self {
        StoreError::Corrupt(e.to_string())
    }
}

/// Result type for order store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
