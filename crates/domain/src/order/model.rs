//! Order model.

use chrono::{DateTime, Utc};
use common::OrderId;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

use super::{CustomerId, Money, OrderLine, OrderStatus, ProductId};

/// An order placed by a customer.
///
/// The total is always derived from the lines, and the identifier is only
/// present once a store has persisted the order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    id: Option<OrderId>,
    customer_id: CustomerId,
    lines: Vec<OrderLine>,
    total: Money,
    status: OrderStatus,
    created_at: DateTime<Utc>,
    payment_ref: Option<String>,
}

/// The persisted representation of an order, as read back from a store.
///
/// Converting a record into an [`Order`] re-validates the lines and checks
/// that the recorded total still matches them.
#[derive(Debug, Clone)]
pub struct OrderRecord {
    pub id: OrderId,
    pub customer_id: CustomerId,
    pub lines: Vec<OrderLine>,
    pub total: Money,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub payment_ref: Option<String>,
}

impl Order {
    /// Creates a new pending order from its lines.
    pub fn new(customer_id: CustomerId, lines: Vec<OrderLine>) -> Result<Self, DomainError> {
        let total = checked_total(&lines)?;

        Ok(Self {
            id: None,
            customer_id,
            lines,
            total,
            status: OrderStatus::Pending,
            created_at: Utc::now(),
            payment_ref: None,
        })
    }

    pub fn id(&self) -> Option<OrderId> {
        self.id
    }

    pub fn customer_id(&self) -> CustomerId {
        self.customer_id
    }

    /// Returns the lines in the order they were added.
    pub fn lines(&self) -> &[OrderLine] {
        &self.lines
    }

    pub fn total(&self) -> Money {
        self.total
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the payment transaction reference once the order is confirmed.
    pub fn payment_ref(&self) -> Option<&str> {
        self.payment_ref.as_deref()
    }

    /// Returns the requested quantity per product, summing duplicate lines.
    ///
    /// Products appear in the order of their first line. The sums were
    /// checked when the order was built, so they saturate rather than wrap
    /// for orders deserialized from elsewhere.
    pub fn demand_by_product(&self) -> Vec<(ProductId, u32)> {
        let mut demand: Vec<(ProductId, u32)> = Vec::new();
        for line in &self.lines {
            match demand.iter_mut().find(|(id, _)| id == line.product_id()) {
                Some((_, quantity)) => *quantity = quantity.saturating_add(line.quantity()),
                None => demand.push((line.product_id().clone(), line.quantity())),
            }
        }
        demand
    }

    /// Marks the order confirmed with the reference of the charge that paid for it.
    pub fn confirm(&mut self, transaction_ref: impl Into<String>) -> Result<(), DomainError> {
        if !self.status.can_confirm() {
            return Err(DomainError::InvalidStatusTransition {
                current: self.status,
                action: "confirm",
            });
        }
        self.status = OrderStatus::Confirmed;
        self.payment_ref = Some(transaction_ref.into());
        Ok(())
    }

    /// Marks the order failed.
    pub fn mark_failed(&mut self) -> Result<(), DomainError> {
        if !self.status.can_fail() {
            return Err(DomainError::InvalidStatusTransition {
                current: self.status,
                action: "fail",
            });
        }
        self.status = OrderStatus::Failed;
        Ok(())
    }

    /// Returns the order with the identifier assigned by a store.
    pub fn with_id(mut self, id: OrderId) -> Self {
        self.id = Some(id);
        self
    }
}

/// Validates the lines of an order and returns their total.
///
/// Rejects an empty list, a total that overflows, and a per-product quantity
/// sum that overflows.
fn checked_total(lines: &[OrderLine]) -> Result<Money, DomainError> {
    if lines.is_empty() {
        return Err(DomainError::EmptyOrder);
    }

    let mut demand: Vec<(&ProductId, u32)> = Vec::new();
    let mut total = Money::zero();
    for line in lines {
        let subtotal = line
            .unit_price()
            .checked_multiply(line.quantity())
            .ok_or(DomainError::AmountOverflow)?;
        total = total
            .checked_add(subtotal)
            .ok_or(DomainError::AmountOverflow)?;

        match demand.iter_mut().find(|(id, _)| *id == line.product_id()) {
            Some((_, quantity)) => {
                *quantity = quantity.checked_add(line.quantity()).ok_or_else(|| {
                    DomainError::QuantityOverflow {
                        product_id: line.product_id().to_string(),
                    }
                })?;
            }
            None => demand.push((line.product_id(), line.quantity())),
        }
    }
    Ok(total)
}

impl TryFrom<OrderRecord> for Order {
    type Error = DomainError;

    fn try_from(record: OrderRecord) -> Result<Self, Self::Error> {
        let computed = checked_total(&record.lines)?;
        if computed != record.total {
            return Err(DomainError::TotalMismatch {
                recorded: record.total.cents(),
                computed: computed.cents(),
            });
        }

        Ok(Self {
            id: Some(record.id),
            customer_id: record.customer_id,
            lines: record.lines,
            total: record.total,
            status: record.status,
            created_at: record.created_at,
            payment_ref: record.payment_ref,
        })
    }
}
