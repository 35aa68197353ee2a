//! Domain error types.

use thiserror::Error;

use crate::order::OrderStatus;

/// Errors raised when constructing or transitioning domain values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    /// An order must contain at least one line.
    #[error("Order has no lines")]
    EmptyOrder,

    /// Line quantity must be positive.
    #[error("Invalid quantity for {product_id}: {quantity} (must be greater than 0)")]
    InvalidQuantity { product_id: String, quantity: u32 },

    /// Unit price must not be negative.
    #[error("Invalid unit price for {product_id}: {cents} cents (must not be negative)")]
    InvalidPrice { product_id: String, cents: i64 },

    /// Product identifiers must not be blank.
    #[error("Product ID must not be empty")]
    EmptyProductId,

    /// A line subtotal or the order total does not fit in an `i64` of cents.
    #[error("Order amount exceeds the supported range")]
    AmountOverflow,

    /// The summed quantity for one product does not fit in a `u32`.
    #[error("Total quantity for {product_id} exceeds the supported range")]
    QuantityOverflow { product_id: String },

    /// The stored total does not match the sum of the line subtotals.
    #[error("Order total mismatch: recorded {recorded} cents, lines sum to {computed} cents")]
    TotalMismatch { recorded: i64, computed: i64 },

    /// The order is not in a state that allows the requested transition.
    #[error("Invalid status transition: cannot {action} from {current} status")]
    InvalidStatusTransition {
        current: OrderStatus,
        action: &'static str,
    },

    /// An order status string could not be parsed.
    #[error("Unknown order status: {0}")]
    UnknownStatus(String),
}
