//! Stock administration endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use domain::ProductId;
use order_store::OrderStore;
use serde::{Deserialize, Serialize};
use stock_ledger::{StockLedger, StockLevel};

use crate::AppState;
use crate::error::ApiError;

#[derive(Deserialize)]
pub struct SetStockRequest {
    pub quantity: u32,
}

#[derive(Serialize)]
pub struct StockResponse {
    pub product_id: String,
    pub available: u32,
    pub held: u32,
    pub unreserved: u32,
}

impl StockResponse {
    fn new(product_id: &ProductId, level: StockLevel) -> Self {
        Self {
            product_id: product_id.to_string(),
            available: level.available,
            held: level.held,
            unreserved: level.unreserved(),
        }
    }
}

/// PUT /stock/{product_id}: set the on-hand quantity for a product.
#[tracing::instrument(skip(state, req))]
pub async fn set<S: OrderStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(product_id): Path<String>,
    Json(req): Json<SetStockRequest>,
) -> Result<Json<StockResponse>, ApiError> {
    let product_id = parse_product_id(product_id)?;

    state.ledger().set_stock(product_id.clone(), req.quantity).await;
    let level = state.ledger().stock_level(&product_id).await?;

    Ok(Json(StockResponse::new(&product_id, level)))
}

/// GET /stock/{product_id}: current quantity and holds for a product.
#[tracing::instrument(skip(state))]
pub async fn get<S: OrderStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(product_id): Path<String>,
) -> Result<Json<StockResponse>, ApiError> {
    let product_id = parse_product_id(product_id)?;
    let level = state.ledger().stock_level(&product_id).await?;

    Ok(Json(StockResponse::new(&product_id, level)))
}

fn parse_product_id(raw: String) -> Result<ProductId, ApiError> {
    if raw.trim().is_empty() {
        return Err(ApiError::BadRequest("product_id must not be blank".to_string()));
    }
    Ok(ProductId::new(raw))
}
