use domain::ProductId;
use thiserror::Error;

use crate::ReservationId;

/// Errors that can occur when interacting with the stock ledger.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// No stock record exists for the product.
    #[error("Product not found: {0}")]
    ProductNotFound(ProductId),

    /// Not enough unreserved stock to satisfy the request.
    #[error("Insufficient stock for {product_id}: requested {requested}, available {available}")]
    InsufficientStock {
        product_id: ProductId,
        requested: u32,
        available: u32,
    },

    /// Reservations must be for a positive quantity.
    #[error("Invalid reservation quantity for {product_id}: {quantity}")]
    InvalidQuantity { product_id: ProductId, quantity: u32 },

    /// The hold was released or expired before it could be committed.
    #[error("Reservation not found: {0}")]
    ReservationNotFound(ReservationId),

    /// A committed reservation cannot be released.
    #[error("Reservation already committed: {0}")]
    AlreadyCommitted(ReservationId),

    /// The backing store could not be reached.
    #[error("Stock ledger unavailable: {0}")]
    Unavailable(String),
}

/// Result type for stock ledger operations.
pub type Result<T> = std::result::Result<T, LedgerError>;
