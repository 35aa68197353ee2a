//! Payment compensation records awaiting reconciliation.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use chrono::{DateTime, Utc};
use order_store::OrderStore;
use serde::Serialize;

use crate::AppState;
use crate::error::ApiError;

#[derive(Serialize)]
pub struct CompensationResponse {
    pub id: String,
    pub transaction_ref: String,
    pub customer_id: String,
    pub amount_cents: i64,
    pub reason: String,
    pub recorded_at: DateTime<Utc>,
}

/// GET /compensations: list every charge whose order was not persisted.
#[tracing::instrument(skip(state))]
pub async fn list<S: OrderStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Vec<CompensationResponse>>, ApiError> {
    let records = state.store().compensations().await?;

    Ok(Json(
        records
            .into_iter()
            .map(|r| CompensationResponse {
                id: r.id.to_string(),
                transaction_ref: r.transaction_ref,
                customer_id: r.customer_id.to_string(),
                amount_cents: r.amount.cents(),
                reason: r.reason,
                recorded_at: r.recorded_at,
            })
            .collect(),
    ))
}
