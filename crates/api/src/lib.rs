//! HTTP host with observability for the order placement workflow.
//!
//! Adapts JSON requests to the placement core, exposes stock administration
//! and compensation records, and serves Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use metrics_exporter_prometheus::PrometheusHandle;
use orchestrator::{InMemoryPaymentProcessor, LoggingNotifier, OrderOrchestrator};
use order_store::OrderStore;
use stock_ledger::InMemoryStockLedger;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use config::Config;

/// The orchestrator as wired by the HTTP host.
pub type Orchestrator<S> =
    OrderOrchestrator<InMemoryStockLedger, InMemoryPaymentProcessor, S, LoggingNotifier>;

/// Shared application state accessible from all handlers.
pub struct AppState<S: OrderStore + 'static> {
    pub orchestrator: Orchestrator<S>,
}

impl<S: OrderStore + 'static> AppState<S> {
    pub fn ledger(&self) -> &InMemoryStockLedger {
        self.orchestrator.ledger()
    }

    pub fn store(&self) -> &S {
        self.orchestrator.store()
    }
}

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: OrderStore + 'static>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check::<S>))
        .route("/orders", post(routes::orders::create::<S>))
        .route("/orders/{id}", get(routes::orders::get::<S>))
        .route(
            "/stock/{product_id}",
            get(routes::stock::get::<S>).put(routes::stock::set::<S>),
        )
        .route("/compensations", get(routes::compensations::list::<S>))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates the application state around `store` with in-memory stock and payment.
///
/// `InMemoryPaymentProcessor` approves every charge and never moves money; it
/// is a development stand-in. Taking real payments means replacing it in the
/// [`Orchestrator`] alias with a `PaymentProcessor` adapter for the provider.
pub fn create_default_state<S: OrderStore + 'static>(store: S, config: &Config) -> Arc<AppState<S>> {
    let orchestrator = OrderOrchestrator::with_config(
        InMemoryStockLedger::with_config(config.ledger_config()),
        InMemoryPaymentProcessor::new(),
        store,
        LoggingNotifier,
        config.orchestrator_config(),
    );

    Arc::new(AppState { orchestrator })
}
