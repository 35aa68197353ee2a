use async_trait::async_trait;
use common::OrderId;
use domain::{CompensationId, CompensationRecord, Order};

use crate::Result;

/// Core trait for order store implementations.
///
/// All implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Persists an order and all of its lines.
    ///
    /// The write is atomic: either the header and every line are stored, or
    /// nothing is. Returns the identifier assigned to the order.
    async fn save(&self, order: &Order) -> Result<OrderId>;

    /// Loads a persisted order by identifier.
    async fn get(&self, order_id: OrderId) -> Result<Option<Order>>;

    /// Durably records a charge that has no matching persisted order.
    async fn record_compensation(&self, record: CompensationRecord) -> Result<CompensationId>;

    /// Returns every compensation record, oldest first.
    async fn compensations(&self) -> Result<Vec<CompensationRecord>>;
}
