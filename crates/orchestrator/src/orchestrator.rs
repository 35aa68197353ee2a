//! Order orchestrator driving a placement through reserve, pay, persist and commit.

use std::sync::Arc;
use std::time::Instant;

use domain::{
    CompensationId, CompensationRecord, CustomerId, IdempotencyKey, Order, OrderLine,
    PaymentMethodToken, PaymentOutcome, ProductId,
};
use futures_util::future::join_all;
use order_store::OrderStore;
use stock_ledger::{ReservationToken, StockLedger};

use crate::config::OrchestratorConfig;
use crate::error::{PlaceOrderError, Result};
use crate::services::{Notifier, PaymentProcessor};
use crate::state::PlacementState;

/// Tracks the progress of one placement and the reservations it holds.
#[derive(Debug, Default)]
struct Placement {
    state: PlacementState,
    reservations: Vec<ReservationToken>,
}

impl Placement {
    fn advance(&mut self, next: PlacementState) -> Result<()> {
        if !self.state.can_transition_to(next) {
            return Err(PlaceOrderError::InvalidState {
                from: self.state,
                to: next,
            });
        }
        tracing::debug!(from = %self.state, to = %next, "placement state changed");
        self.state = next;
        Ok(())
    }
}

/// Coordinates order placement across the stock ledger, payment processor,
/// order store and notifier.
///
/// Each collaborator is passed in explicitly and owned by the orchestrator
/// for its lifetime. The orchestrator holds no per-order state between calls,
/// so one instance can serve any number of concurrent placements.
pub struct OrderOrchestrator<L, P, S, N>
where
    L: StockLedger,
    P: PaymentProcessor,
    S: OrderStore,
    N: Notifier + 'static,
{
    ledger: L,
    payment: P,
    store: S,
    notifier: Arc<N>,
    config: OrchestratorConfig,
}

impl<L, P, S, N> OrderOrchestrator<L, P, S, N>
where
    L: StockLedger,
    P: PaymentProcessor,
    S: OrderStore,
    N: Notifier + 'static,
{
    /// Creates a new orchestrator with the default configuration.
    pub fn new(ledger: L, payment: P, store: S, notifier: N) -> Self {
        Self::with_config(ledger, payment, store, notifier, OrchestratorConfig::default())
    }

    /// Creates a new orchestrator with an explicit configuration.
    pub fn with_config(
        ledger: L,
        payment: P,
        store: S,
        notifier: N,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            ledger,
            payment,
            store,
            notifier: Arc::new(notifier),
            config,
        }
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    pub fn payment(&self) -> &P {
        &self.payment
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Places an order for `customer_id`, charging `payment_token` once.
    ///
    /// On success the returned order is persisted and confirmed, its stock is
    /// committed, and a confirmation is dispatched in the background.
    #[tracing::instrument(skip(self, payment_token, lines), fields(lines = lines.len()))]
    pub async fn place_order(
        &self,
        customer_id: CustomerId,
        payment_token: &PaymentMethodToken,
        lines: Vec<OrderLine>,
    ) -> Result<Order> {
        let started = Instant::now();
        let mut placement = Placement::default();

        let result = self
            .run(&mut placement, customer_id, payment_token, lines)
            .await;

        metrics::histogram!("order_placement_duration_seconds")
            .record(started.elapsed().as_secs_f64());

        match &result {
            Ok(order) => {
                metrics::counter!("orders_placed_total").increment(1);
                tracing::info!(
                    order_id = ?order.id(),
                    total = %order.total(),
                    "order placed"
                );
            }
            Err(e) => {
                metrics::counter!("orders_failed_total", "reason" => e.kind()).increment(1);
                if e.requires_attention() {
                    tracing::error!(error = %e, state = %placement.state, "order placement needs operator attention");
                } else {
                    tracing::warn!(error = %e, state = %placement.state, "order placement rejected");
                }
            }
        }

        result
    }

    async fn run(
        &self,
        placement: &mut Placement,
        customer_id: CustomerId,
        payment_token: &PaymentMethodToken,
        lines: Vec<OrderLine>,
    ) -> Result<Order> {
        let mut order = match Order::new(customer_id, lines) {
            Ok(order) => order,
            Err(e) => {
                placement.advance(PlacementState::Failed)?;
                return Err(e.into());
            }
        };
        let demand = order.demand_by_product();

        // Validating: read-only, nothing to release on failure.
        if let Err(e) = self.validate_stock(&demand).await {
            self.fail(placement, &mut order).await?;
            return Err(e);
        }

        // StockReserved
        if let Err(e) = self.reserve_all(placement, &demand).await {
            self.fail(placement, &mut order).await?;
            return Err(e);
        }
        placement.advance(PlacementState::StockReserved)?;

        // Paid
        let transaction_ref = match self.charge(&order, payment_token).await {
            Ok(transaction_ref) => transaction_ref,
            Err(e) => {
                self.fail(placement, &mut order).await?;
                return Err(e);
            }
        };
        placement.advance(PlacementState::Paid)?;

        // Persisted
        let mut confirmed = order;
        confirmed.confirm(transaction_ref.clone())?;
        let order = match self.store.save(&confirmed).await {
            Ok(order_id) => confirmed.with_id(order_id),
            Err(e) => {
                let reason = e.to_string();
                self.release_all(placement).await;
                let compensation_id = self
                    .record_compensation(&confirmed, &transaction_ref, &reason)
                    .await;
                placement.advance(PlacementState::PaidButUnpersisted)?;
                return Err(PlaceOrderError::PaidButUnpersisted {
                    transaction_ref,
                    compensation_id,
                    reason,
                });
            }
        };
        placement.advance(PlacementState::Persisted)?;

        // StockCommitted: the order is durable, so a failure here alerts instead of rolling back.
        let commit_failure = self.commit_all(placement).await;
        self.dispatch_notification(&order);

        if let Some((product_id, reason)) = commit_failure {
            return Err(PlaceOrderError::StockCommitFailed {
                order: Box::new(order),
                product_id,
                reason,
            });
        }
        placement.advance(PlacementState::StockCommitted)?;

        placement.advance(PlacementState::Completed)?;
        Ok(order)
    }

    /// Checks every product's on-hand quantity against the order's demand.
    async fn validate_stock(&self, demand: &[(ProductId, u32)]) -> Result<()> {
        for (product_id, quantity) in demand {
            if !self.ledger.check_availability(product_id, *quantity).await? {
                let level = self.ledger.stock_level(product_id).await?;
                return Err(PlaceOrderError::InsufficientStock {
                    product_id: product_id.clone(),
                    requested: *quantity,
                    available: level.available,
                });
            }
        }
        Ok(())
    }

    /// Reserves every product in order; acquired tokens are kept on the placement.
    async fn reserve_all(
        &self,
        placement: &mut Placement,
        demand: &[(ProductId, u32)],
    ) -> Result<()> {
        for (product_id, quantity) in demand {
            let token = self.ledger.reserve(product_id, *quantity).await?;
            placement.reservations.push(token);
        }
        Ok(())
    }

    /// Charges the order total once under a fresh idempotency key.
    async fn charge(&self, order: &Order, payment_token: &PaymentMethodToken) -> Result<String> {
        let idempotency_key = IdempotencyKey::new();
        tracing::debug!(%idempotency_key, amount = %order.total(), "charging payment method");

        let outcome = tokio::time::timeout(
            self.config.payment_timeout,
            self.payment
                .charge(order.total(), payment_token, idempotency_key),
        )
        .await;

        match outcome {
            Ok(PaymentOutcome::Approved { transaction_ref }) => Ok(transaction_ref),
            Ok(PaymentOutcome::Declined { reason }) => Err(PlaceOrderError::PaymentFailed {
                reason,
                timed_out: false,
            }),
            Err(_) => Err(PlaceOrderError::PaymentFailed {
                reason: format!(
                    "no response from payment processor within {:?}",
                    self.config.payment_timeout
                ),
                timed_out: true,
            }),
        }
    }

    /// Releases every held reservation, marks the unsaved order failed and
    /// moves the placement to `Failed`.
    async fn fail(&self, placement: &mut Placement, order: &mut Order) -> Result<()> {
        self.release_all(placement).await;
        order.mark_failed()?;
        tracing::debug!(status = %order.status(), total = %order.total(), "order abandoned");
        placement.advance(PlacementState::Failed)
    }

    /// Releases every held reservation. Release failures are logged, since the
    /// sweeper reclaims any hold left behind once it expires.
    async fn release_all(&self, placement: &mut Placement) {
        let tokens = std::mem::take(&mut placement.reservations);
        let results = join_all(tokens.iter().map(|token| self.ledger.release(token))).await;

        for (token, result) in tokens.iter().zip(results) {
            if let Err(e) = result {
                tracing::warn!(
                    reservation_id = %token.id(),
                    product_id = %token.product_id(),
                    error = %e,
                    "failed to release reservation"
                );
            }
        }
    }

    /// Writes the reconciliation record for a charge whose order was not stored.
    async fn record_compensation(
        &self,
        order: &Order,
        transaction_ref: &str,
        reason: &str,
    ) -> Option<CompensationId> {
        let record = CompensationRecord::new(
            transaction_ref,
            order.customer_id(),
            order.total(),
            reason,
        );

        match self.store.record_compensation(record).await {
            Ok(id) => {
                metrics::counter!("payment_compensations_total").increment(1);
                tracing::error!(
                    compensation_id = %id,
                    transaction_ref,
                    amount = %order.total(),
                    "payment charged but order not persisted; compensation recorded"
                );
                Some(id)
            }
            Err(e) => {
                tracing::error!(
                    transaction_ref,
                    amount = %order.total(),
                    error = %e,
                    "payment charged but order not persisted; compensation record could not be written"
                );
                None
            }
        }
    }

    /// Commits every reservation, continuing past failures.
    ///
    /// Returns the first failing product and its reason, if any.
    async fn commit_all(&self, placement: &mut Placement) -> Option<(ProductId, String)> {
        let mut first_failure = None;

        for token in std::mem::take(&mut placement.reservations) {
            if let Err(e) = self.ledger.commit(&token).await {
                metrics::counter!("stock_commit_failures_total").increment(1);
                tracing::error!(
                    reservation_id = %token.id(),
                    product_id = %token.product_id(),
                    error = %e,
                    "stock commit failed for a persisted order"
                );
                first_failure.get_or_insert((token.product_id().clone(), e.to_string()));
            }
        }

        first_failure
    }

    /// Sends the confirmation on a separate task; the outcome is only logged.
    fn dispatch_notification(&self, order: &Order) {
        let notifier = Arc::clone(&self.notifier);
        let order = order.clone();

        tokio::spawn(async move {
            if let Err(e) = notifier.notify(order.customer_id(), &order).await {
                metrics::counter!("notifications_failed_total").increment(1);
                tracing::warn!(order_id = ?order.id(), error = %e, "order notification failed");
            }
        });
    }
}
