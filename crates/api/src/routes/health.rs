//! Health check endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use order_store::OrderStore;
use serde::Serialize;

use crate::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub active_holds: usize,
    /// Charges whose order was never stored; non-zero needs an operator.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pending_compensations: Option<usize>,
}

/// GET /health: reports whether the order store is reachable.
pub async fn check<S: OrderStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> (StatusCode, Json<HealthResponse>) {
    let active_holds = state.ledger().active_holds().await;

    match state.store().compensations().await {
        Ok(records) => (
            StatusCode::OK,
            Json(HealthResponse {
                status: "ok",
                active_holds,
                pending_compensations: Some(records.len()),
            }),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "order store health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse {
                    status: "unavailable",
                    active_holds,
                    pending_compensations: None,
                }),
            )
        }
    }
}
