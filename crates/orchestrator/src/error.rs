//! Order placement error types.

use domain::{CompensationId, DomainError, Order, ProductId};
use stock_ledger::LedgerError;
use thiserror::Error;

use crate::state::PlacementState;

/// Errors returned by [`OrderOrchestrator::place_order`](crate::OrderOrchestrator::place_order).
///
/// Every variant except `PaidButUnpersisted` and `StockCommitFailed` is
/// reported only after all reservations have been released, so the caller
/// sees a clean rejection with no side effects.
#[derive(Debug, Error)]
pub enum PlaceOrderError {
    /// The order or one of its lines failed validation.
    #[error("Invalid order: {0}")]
    InvalidOrder(#[from] DomainError),

    /// A line references a product without a stock record.
    #[error("Product not found: {0}")]
    ProductNotFound(ProductId),

    /// A line asks for more units than the ledger can provide.
    #[error("Insufficient stock for {product_id}: requested {requested}, available {available}")]
    InsufficientStock {
        product_id: ProductId,
        requested: u32,
        available: u32,
    },

    /// The charge was declined or did not complete in time.
    #[error("Payment failed: {reason}")]
    PaymentFailed { reason: String, timed_out: bool },

    /// The charge succeeded but the order could not be stored.
    ///
    /// The payment is not reversed here; `compensation_id` identifies the
    /// reconciliation record, or is `None` if that record could not be
    /// written either.
    #[error("Payment {transaction_ref} was charged but the order was not persisted: {reason}")]
    PaidButUnpersisted {
        transaction_ref: String,
        compensation_id: Option<CompensationId>,
        reason: String,
    },

    /// The order is confirmed and stored, but a reservation could not be
    /// committed. The order stays valid.
    #[error("Order confirmed but stock commit failed for {product_id}: {reason}")]
    StockCommitFailed {
        order: Box<Order>,
        product_id: ProductId,
        reason: String,
    },

    /// The stock ledger failed for a reason other than missing stock.
    #[error("Stock ledger error: {0}")]
    Ledger(LedgerError),

    /// The placement state machine was driven through an illegal transition.
    #[error("Invalid placement state transition: {from} -> {to}")]
    InvalidState {
        from: PlacementState,
        to: PlacementState,
    },
}

impl PlaceOrderError {
    /// Returns true if the failure left side effects that need an operator.
    pub fn requires_attention(&self) -> bool {
        matches!(
            self,
            PlaceOrderError::PaidButUnpersisted { .. } | PlaceOrderError::StockCommitFailed { .. }
        )
    }

    /// Short label used for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            PlaceOrderError::InvalidOrder(_) => "invalid_order",
            PlaceOrderError::ProductNotFound(_) => "product_not_found",
            PlaceOrderError::InsufficientStock { .. } => "insufficient_stock",
            PlaceOrderError::PaymentFailed { .. } => "payment_failed",
            PlaceOrderError::PaidButUnpersisted { .. } => "paid_but_unpersisted",
            PlaceOrderError::StockCommitFailed { .. } => "stock_commit_failed",
            PlaceOrderError::Ledger(_) => "ledger",
            PlaceOrderError::InvalidState { .. } => "invalid_state",
        }
    }
}

impl From<LedgerError> for PlaceOrderError {
    fn from(e: LedgerError) -> Self {
        match e {
            LedgerError::ProductNotFound(product_id) => PlaceOrderError::ProductNotFound(product_id),
            LedgerError::InsufficientStock {
                product_id,
                requested,
                available,
            } => PlaceOrderError::InsufficientStock {
                product_id,
                requested,
                available,
            },
            other => PlaceOrderError::Ledger(other),
        }
    }
}

/// Convenience type alias for placement results.
pub type Result<T> = std::result::Result<T, PlaceOrderError>;
