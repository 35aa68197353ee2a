use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use common::OrderId;
use domain::{CompensationId, CompensationRecord, Order};
use tokio::sync::RwLock;

use crate::{OrderStore, Result, StoreError};

/// In-memory order store implementation for testing.
///
/// Provides the same interface as the PostgreSQL implementation. Writes can
/// be made to fail on demand to exercise the placement failure paths.
#[derive(Clone, Default)]
pub struct InMemoryOrderStore {
    orders: Arc<RwLock<HashMap<OrderId, Order>>>,
    compensations: Arc<RwLock<Vec<CompensationRecord>>>,
    fail_on_save: Arc<AtomicBool>,
    fail_on_compensation: Arc<AtomicBool>,
}

impl InMemoryOrderStore {
    /// Creates a new empty in-memory order store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the store to reject order writes.
    pub fn set_fail_on_save(&self, fail: bool) {
        self.fail_on_save.store(fail, Ordering::SeqCst);
    }

    /// Configures the store to reject compensation writes.
    pub fn set_fail_on_compensation(&self, fail: bool) {
        self.fail_on_compensation.store(fail, Ordering::SeqCst);
    }

    /// Returns the number of persisted orders.
    pub async fn order_count(&self) -> usize {
        self.orders.read().await.len()
    }

    /// Returns the number of compensation records.
    pub async fn compensation_count(&self) -> usize {
        self.compensations.read().await.len()
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn save(&self, order: &Order) -> Result<OrderId> {
        if let Some(id) = order.id() {
            return Err(StoreError::AlreadyPersisted(id));
        }
        if self.fail_on_save.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("order writes disabled".to_string()));
        }

        let order_id = OrderId::new();
        self.orders
            .write()
            .await
            .insert(order_id, order.clone().with_id(order_id));

        metrics::counter!("orders_persisted_total").increment(1);
        Ok(order_id)
    }

    async fn get(&self, order_id: OrderId) -> Result<Option<Order>> {
        Ok(self.orders.read().await.get(&order_id).cloned())
    }

    async fn record_compensation(&self, record: CompensationRecord) -> Result<CompensationId> {
        if self.fail_on_compensation.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(
                "compensation writes disabled".to_string(),
            ));
        }

        let id = record.id;
        self.compensations.write().await.push(record);
        Ok(id)
    }

    async fn compensations(&self) -> Result<Vec<CompensationRecord>> {
        Ok(self.compensations.read().await.clone())
    }
}

#[cfg(test)]
mod tests {
    use domain::{CustomerId, Money, OrderLine, OrderStatus};

    use super::*;

    fn confirmed_order() -> Order {
        let mut order = Order::new(
            CustomerId::new(),
            vec![
                OrderLine::new("SKU-001", "Widget", 2, Money::from_cents(1000)).unwrap(),
                OrderLine::new("SKU-002", "Gadget", 1, Money::from_cents(2500)).unwrap(),
            ],
        )
        .unwrap();
        order.confirm("PAY-0001").unwrap();
        order
    }

    #[tokio::test]
    async fn test_save_assigns_id_and_keeps_lines() {
        let store = InMemoryOrderStore::new();
        let order = confirmed_order();

        let id = store.save(&order).await.unwrap();
        let loaded = store.get(id).await.unwrap().unwrap();

        assert_eq!(loaded.id(), Some(id));
        assert_eq!(loaded.status(), OrderStatus::Confirmed);
        assert_eq!(loaded.lines(), order.lines());
        assert_eq!(loaded.total().cents(), 4500);
    }

    #[tokio::test]
    async fn test_save_rejects_persisted_order() {
        let store = InMemoryOrderStore::new();
        let id = store.save(&confirmed_order()).await.unwrap();
        let loaded = store.get(id).await.unwrap().unwrap();

        assert!(matches!(
            store.save(&loaded).await,
            Err(StoreError::AlreadyPersisted(existing)) if existing == id
        ));
        assert_eq!(store.order_count().await, 1);
    }

    #[tokio::test]
    async fn test_fail_on_save_persists_nothing() {
        let store = InMemoryOrderStore::new();
        store.set_fail_on_save(true);

        assert!(matches!(
            store.save(&confirmed_order()).await,
            Err(StoreError::Unavailable(_))
        ));
        assert_eq!(store.order_count().await, 0);
    }

    #[tokio::test]
    async fn test_compensations_are_kept_in_order() {
        let store = InMemoryOrderStore::new();
        let customer = CustomerId::new();

        let first = CompensationRecord::new("PAY-0001", customer, Money::from_cents(100), "db down");
        let second = CompensationRecord::new("PAY-0002", customer, Money::from_cents(200), "db down");
        store.record_compensation(first.clone()).await.unwrap();
        store.record_compensation(second.clone()).await.unwrap();

        assert_eq!(store.compensations().await.unwrap(), vec![first, second]);
    }

    #[tokio::test]
    async fn test_fail_on_compensation() {
        let store = InMemoryOrderStore::new();
        store.set_fail_on_compensation(true);

        let record =
            CompensationRecord::new("PAY-0001", CustomerId::new(), Money::from_cents(1), "x");
        assert!(store.record_compensation(record).await.is_err());
        assert_eq!(store.compensation_count().await, 0);
    }

    #[tokio::test]
    async fn test_missing_order() {
        let store = InMemoryOrderStore::new();
        assert!(store.get(OrderId::new()).await.unwrap().is_none());
    }
}
