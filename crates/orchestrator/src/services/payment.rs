//! Payment processor trait and in-memory implementation.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use domain::{IdempotencyKey, Money, PaymentMethodToken, PaymentOutcome};
use tokio::sync::Mutex;

/// Trait for charging a customer's payment method.
///
/// Implementations must treat `idempotency_key` as the identity of the
/// charge: repeating a call with the same key must not charge twice.
#[async_trait]
pub trait PaymentProcessor: Send + Sync {
    /// Charges `amount` to the payment method behind `token`.
    async fn charge(
        &self,
        amount: Money,
        token: &PaymentMethodToken,
        idempotency_key: IdempotencyKey,
    ) -> PaymentOutcome;
}

#[derive(Debug, Default)]
struct InMemoryPaymentState {
    charges: HashMap<IdempotencyKey, (String, Money)>,
    next_id: u32,
    calls: usize,
    decline_reason: Option<String>,
    delay: Option<Duration>,
}

/// In-memory payment processor for testing.
///
/// Approves every charge with sequential `PAY-0001` style references unless
/// configured to decline or to stall.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPaymentProcessor {
    state: Arc<Mutex<InMemoryPaymentState>>,
}

impl InMemoryPaymentProcessor {
    /// Creates a new in-memory payment processor.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declines every subsequent charge with `reason`, or approves again on `None`.
    pub async fn set_decline(&self, reason: Option<&str>) {
        self.state.lock().await.decline_reason = reason.map(str::to_string);
    }

    /// Delays every subsequent charge before answering.
    pub async fn set_delay(&self, delay: Option<Duration>) {
        self.state.lock().await.delay = delay;
    }

    /// Returns the number of approved charges.
    pub async fn charge_count(&self) -> usize {
        self.state.lock().await.charges.len()
    }

    /// Returns the number of charge calls received, including declines.
    pub async fn call_count(&self) -> usize {
        self.state.lock().await.calls
    }

    /// Returns true if an approved charge carries the given reference.
    pub async fn has_charge(&self, transaction_ref: &str) -> bool {
        self.state
            .lock()
            .await
            .charges
            .values()
            .any(|(reference, _)| reference == transaction_ref)
    }

    /// Returns the total of all approved charges.
    pub async fn total_charged(&self) -> Money {
        self.state
            .lock()
            .await
            .charges
            .values()
            .map(|(_, amount)| *amount)
            .sum()
    }
}

#[async_trait]
impl PaymentProcessor for InMemoryPaymentProcessor {
    async fn charge(
        &self,
        amount: Money,
        _token: &PaymentMethodToken,
        idempotency_key: IdempotencyKey,
    ) -> PaymentOutcome {
        let delay = {
            let mut state = self.state.lock().await;
            state.calls += 1;
            state.delay
        };

        // Sleep without holding the lock so a stalled charge cannot block others.
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.state.lock().await;

        if let Some((reference, _)) = state.charges.get(&idempotency_key) {
            return PaymentOutcome::approved(reference.clone());
        }
        if let Some(reason) = &state.decline_reason {
            return PaymentOutcome::declined(reason.clone());
        }

        state.next_id += 1;
        let transaction_ref = format!("PAY-{:04}", state.next_id);
        state
            .charges
            .insert(idempotency_key, (transaction_ref.clone(), amount));

        PaymentOutcome::approved(transaction_ref)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token() -> PaymentMethodToken {
        PaymentMethodToken::new("tok_visa")
    }

    #[tokio::test]
    async fn test_charge_approves_with_sequential_refs() {
        let processor = InMemoryPaymentProcessor::new();

        let r1 = processor
            .charge(Money::from_cents(1000), &token(), IdempotencyKey::new())
            .await;
        let r2 = processor
            .charge(Money::from_cents(500), &token(), IdempotencyKey::new())
            .await;

        assert_eq!(r1.transaction_ref(), Some("PAY-0001"));
        assert_eq!(r2.transaction_ref(), Some("PAY-0002"));
        assert_eq!(processor.charge_count().await, 2);
        assert_eq!(processor.total_charged().await, Money::from_cents(1500));
        assert!(processor.has_charge("PAY-0002").await);
    }

    #[tokio::test]
    async fn test_same_idempotency_key_charges_once() {
        let processor = InMemoryPaymentProcessor::new();
        let key = IdempotencyKey::new();

        let first = processor.charge(Money::from_cents(1000), &token(), key).await;
        let retry = processor.charge(Money::from_cents(1000), &token(), key).await;

        assert_eq!(first, retry);
        assert_eq!(processor.charge_count().await, 1);
        assert_eq!(processor.call_count().await, 2);
    }

    #[tokio::test]
    async fn test_decline() {
        let processor = InMemoryPaymentProcessor::new();
        processor.set_decline(Some("card declined")).await;

        let outcome = processor
            .charge(Money::from_cents(1000), &token(), IdempotencyKey::new())
            .await;

        assert!(!outcome.is_success());
        assert_eq!(outcome.failure_reason(), Some("card declined"));
        assert_eq!(processor.charge_count().await, 0);

        processor.set_decline(None).await;
        let outcome = processor
            .charge(Money::from_cents(1000), &token(), IdempotencyKey::new())
            .await;
        assert!(outcome.is_success());
    }

    #[tokio::test(start_paused = true)]
    async fn test_delay_is_applied() {
        let processor = InMemoryPaymentProcessor::new();
        processor.set_delay(Some(Duration::from_secs(5))).await;

        let started = tokio::time::Instant::now();
        let outcome = processor
            .charge(Money::from_cents(1000), &token(), IdempotencyKey::new())
            .await;

        assert!(outcome.is_success());
        assert!(started.elapsed() >= Duration::from_secs(5));
    }
}
