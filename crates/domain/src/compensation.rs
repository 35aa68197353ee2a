//! Compensation records for payments that have no matching order.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::order::{CustomerId, Money};

/// Identifier of a compensation record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CompensationId(Uuid);

impl CompensationId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for CompensationId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for CompensationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Durable note that a charge succeeded without a persisted order.
///
/// Operators (or a reconciliation job) use these to refund or re-create the
/// order; the placement core never reverses a charge itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompensationRecord {
    pub id: CompensationId,
    pub transaction_ref: String,
    pub customer_id: CustomerId,
    pub amount: Money,
    pub reason: String,
    pub recorded_at: DateTime<Utc>,
}

impl CompensationRecord {
    pub fn new(
        transaction_ref: impl Into<String>,
        customer_id: CustomerId,
        amount: Money,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            id: CompensationId::new(),
            transaction_ref: transaction_ref.into(),
            customer_id,
            amount,
            reason: reason.into(),
            recorded_at: Utc::now(),
        }
    }
}
