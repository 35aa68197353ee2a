//! Customer notification trait and implementations.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use common::OrderId;
use domain::{CustomerId, Order};
use thiserror::Error;
use tokio::sync::Mutex;

/// Error reported by a notification channel.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Notification failed: {0}")]
pub struct NotificationError(pub String);

/// Trait for telling a customer that their order was confirmed.
///
/// Delivery is best effort; a failure never changes the order's outcome.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Sends the confirmation for `order` to `customer_id`.
    async fn notify(&self, customer_id: CustomerId, order: &Order)
    -> Result<(), NotificationError>;
}

#[derive(Debug, Default)]
struct InMemoryNotifierState {
    sent: Vec<(CustomerId, Option<OrderId>)>,
    attempts: usize,
    fail: bool,
}

/// In-memory notifier for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryNotifier {
    state: Arc<Mutex<InMemoryNotifierState>>,
}

impl InMemoryNotifier {
    /// Creates a new in-memory notifier.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the notifier to reject every send.
    pub async fn set_fail(&self, fail: bool) {
        self.state.lock().await.fail = fail;
    }

    /// Returns the delivered notifications as (customer, order id) pairs.
    pub async fn sent(&self) -> Vec<(CustomerId, Option<OrderId>)> {
        self.state.lock().await.sent.clone()
    }

    /// Returns the number of send attempts, successful or not.
    pub async fn attempts(&self) -> usize {
        self.state.lock().await.attempts
    }

    /// Waits until at least `count` attempts were made or `timeout` elapses.
    ///
    /// Returns true if the count was reached.
    pub async fn wait_for_attempts(&self, count: usize, timeout: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if self.attempts().await >= count {
                return true;
            }
            if tokio::time::Instant::now() >= deadline {
                return false;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }
}

#[async_trait]
impl Notifier for InMemoryNotifier {
    async fn notify(
        &self,
        customer_id: CustomerId,
        order: &Order,
    ) -> Result<(), NotificationError> {
        let mut state = self.state.lock().await;
        state.attempts += 1;

        if state.fail {
            return Err(NotificationError("notification channel down".to_string()));
        }

        state.sent.push((customer_id, order.id()));
        Ok(())
    }
}

/// Notifier that writes confirmations to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingNotifier;

#[async_trait]
impl Notifier for LoggingNotifier {
    async fn notify(
        &self,
        customer_id: CustomerId,
        order: &Order,
    ) -> Result<(), NotificationError> {
        let order_id = order
            .id()
            .ok_or_else(|| NotificationError("order has no id".to_string()))?;

        tracing::info!(
            %customer_id,
            %order_id,
            total = %order.total(),
            "order confirmation sent"
        );
        Ok(())
    }
}
