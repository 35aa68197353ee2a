use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain::ProductId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::Result;

/// Unique identifier for a reservation hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReservationId(Uuid);

impl ReservationId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for ReservationId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ReservationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Handle to an in-flight hold against a product's stock.
///
/// Returned by [`StockLedger::reserve`] and consumed by `commit` or `release`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservationToken {
    id: ReservationId,
    product_id: ProductId,
    quantity: u32,
    expires_at: DateTime<Utc>,
}

impl ReservationToken {
    pub fn new(product_id: ProductId, quantity: u32, expires_at: DateTime<Utc>) -> Self {
        Self {
            id: ReservationId::new(),
            product_id,
            quantity,
            expires_at,
        }
    }

    pub fn id(&self) -> ReservationId {
        self.id
    }

    pub fn product_id(&self) -> &ProductId {
        &self.product_id
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// Returns true if the hold has expired at `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// Point-in-time view of a product's stock record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockLevel {
    /// Quantity on the stock record (committed decrements already applied).
    pub available: u32,
    /// Quantity currently held by uncommitted reservations.
    pub held: u32,
}

impl StockLevel {
    /// Quantity that can still be reserved.
    pub fn unreserved(&self) -> u32 {
        self.available.saturating_sub(self.held)
    }
}

/// Core trait for stock ledger implementations.
///
/// Implementations must serialize `reserve`, `commit` and `release` per
/// product so that two concurrent reservations can never both succeed
/// against the same units.
#[async_trait]
pub trait StockLedger: Send + Sync {
    /// Returns whether the stock record holds at least `quantity` units.
    ///
    /// Never mutates the ledger. Fails with `ProductNotFound` if the product
    /// has no stock record.
    async fn check_availability(&self, product_id: &ProductId, quantity: u32) -> Result<bool>;

    /// Places an expiring hold for `quantity` units.
    ///
    /// Fails with `InsufficientStock` if existing holds plus this one would
    /// exceed the available quantity.
    async fn reserve(&self, product_id: &ProductId, quantity: u32) -> Result<ReservationToken>;

    /// Turns a hold into a permanent decrement of the stock record.
    ///
    /// Committing an already-committed token is a no-op.
    async fn commit(&self, token: &ReservationToken) -> Result<()>;

    /// Drops a hold without touching the stock record.
    ///
    /// Releasing a token that is no longer held is a no-op.
    async fn release(&self, token: &ReservationToken) -> Result<()>;

    /// Returns the current stock level for a product.
    async fn stock_level(&self, product_id: &ProductId) -> Result<StockLevel>;

    /// Releases every uncommitted hold that has expired at `now`.
    ///
    /// Returns the number of holds released.
    async fn release_expired(&self, now: DateTime<Utc>) -> Result<usize>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_expiry_boundary() {
        let now = Utc::now();
        let token = ReservationToken::new(ProductId::new("SKU-001"), 1, now);
        assert!(token.is_expired_at(now));
        assert!(!token.is_expired_at(now - chrono::TimeDelta::seconds(1)));
    }

    #[test]
    fn test_tokens_get_unique_ids() {
        let now = Utc::now();
        let a = ReservationToken::new(ProductId::new("SKU-001"), 1, now);
        let b = ReservationToken::new(ProductId::new("SKU-001"), 1, now);
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_unreserved_never_underflows() {
        let level = StockLevel {
            available: 2,
            held: 5,
        };
        assert_eq!(level.unreserved(), 0);
    }
}
