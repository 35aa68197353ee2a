//! Placement state machine.

use serde::{Deserialize, Serialize};

/// The state of a single order placement attempt.
///
/// State transitions:
/// ```text
/// Validating ──► StockReserved ──► Paid ──► Persisted ──► StockCommitted ──► Completed
///     │               │             │  │        │               │
///     │               │             │  └──► PaidButUnpersisted  │
///     └───────────────┴─────────────┴───────────┴───────────────┴──► Failed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum PlacementState {
    /// Lines are being validated against current stock. No side effects yet.
    #[default]
    Validating,

    /// Every line holds a stock reservation.
    StockReserved,

    /// The payment method has been charged.
    Paid,

    /// The confirmed order is durably stored.
    Persisted,

    /// Reservations have been turned into permanent decrements.
    StockCommitted,

    /// The order was returned to the caller (terminal state).
    Completed,

    /// Placement was rejected and fully compensated (terminal state).
    Failed,

    /// The charge succeeded but the order could not be stored; a
    /// compensation record needs operator attention (terminal state).
    PaidButUnpersisted,
}

impl PlacementState {
    /// Returns true if the machine may move from this state to `next`.
    pub fn can_transition_to(&self, next: PlacementState) -> bool {
        use PlacementState::*;

        match (self, next) {
            (Validating, StockReserved)
            | (StockReserved, Paid)
            | (Paid, Persisted)
            | (Persisted, StockCommitted)
            | (StockCommitted, Completed)
            | (Paid, PaidButUnpersisted) => true,
            (from, Failed) => !from.is_terminal(),
            _ => false,
        }
    }

    /// Returns true if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PlacementState::Completed | PlacementState::Failed | PlacementState::PaidButUnpersisted
        )
    }

    /// Returns the state name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            PlacementState::Validating => "Validating",
            PlacementState::StockReserved => "StockReserved",
            PlacementState::Paid => "Paid",
            PlacementState::Persisted => "Persisted",
            PlacementState::StockCommitted => "StockCommitted",
            PlacementState::Completed => "Completed",
            PlacementState::Failed => "Failed",
            PlacementState::PaidButUnpersisted => "PaidButUnpersisted",
        }
    }
}

impl std::fmt::Display for PlacementState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
