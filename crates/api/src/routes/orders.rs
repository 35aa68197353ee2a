//! Order placement and lookup endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use common::OrderId;
use domain::{CustomerId, Money, Order, OrderLine, PaymentMethodToken};
use orchestrator::PlaceOrderError;
use order_store::OrderStore;
use serde::{Deserialize, Serialize};

use crate::AppState;
use crate::error::ApiError;

// -- Request types --

#[derive(Deserialize)]
pub struct PlaceOrderRequest {
    pub customer_id: Option<String>,
    pub payment_token: String,
    pub lines: Vec<OrderLineRequest>,
}

#[derive(Deserialize)]
pub struct OrderLineRequest {
    pub product_id: String,
    pub product_name: String,
    pub quantity: u32,
    pub unit_price_cents: i64,
}

// -- Response types --

#[derive(Serialize)]
pub struct OrderResponse {
    pub id: String,
    pub customer_id: String,
    pub status: String,
    pub lines: Vec<OrderLineResponse>,
    pub total_cents: i64,
    pub total: String,
    pub payment_ref: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

#[derive(Serialize)]
pub struct OrderLineResponse {
    pub product_id: String,
    pub product_name: String,
    pub quantity: u32,
    pub unit_price_cents: i64,
    pub subtotal_cents: i64,
}

impl From<&Order> for OrderResponse {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id().map(|id| id.to_string()).unwrap_or_default(),
            customer_id: order.customer_id().to_string(),
            status: order.status().to_string(),
            lines: order
                .lines()
                .iter()
                .map(|line| OrderLineResponse {
                    product_id: line.product_id().to_string(),
                    product_name: line.product_name().to_string(),
                    quantity: line.quantity(),
                    unit_price_cents: line.unit_price().cents(),
                    subtotal_cents: line.subtotal().cents(),
                })
                .collect(),
            total_cents: order.total().cents(),
            total: order.total().to_string(),
            payment_ref: order.payment_ref().map(String::from),
            created_at: order.created_at(),
            warning: None,
        }
    }
}

// -- Handlers --

/// POST /orders: reserves stock, charges once, stores and commits the order.
#[tracing::instrument(skip(state, req))]
pub async fn create<S: OrderStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<PlaceOrderRequest>,
) -> Result<(StatusCode, Json<OrderResponse>), ApiError> {
    let customer_id = match req.customer_id.as_deref() {
        Some(id_str) => {
            let uuid = uuid::Uuid::parse_str(id_str)
                .map_err(|e| ApiError::BadRequest(format!("Invalid customer_id: {e}")))?;
            CustomerId::from_uuid(uuid)
        }
        None => CustomerId::new(),
    };

    if req.payment_token.trim().is_empty() {
        return Err(ApiError::BadRequest("payment_token is required".to_string()));
    }
    let payment_token = PaymentMethodToken::new(req.payment_token);

    let lines = req
        .lines
        .into_iter()
        .map(|line| {
            OrderLine::new(
                line.product_id,
                line.product_name,
                line.quantity,
                Money::from_cents(line.unit_price_cents),
            )
        })
        .collect::<Result<Vec<_>, _>>()?;

    match state
        .orchestrator
        .place_order(customer_id, &payment_token, lines)
        .await
    {
        Ok(order) => Ok((StatusCode::CREATED, Json(OrderResponse::from(&order)))),
        // The order is confirmed and stored; only the stock decrement needs attention.
        Err(PlaceOrderError::StockCommitFailed {
            order,
            product_id,
            reason,
        }) => {
            let mut response = OrderResponse::from(order.as_ref());
            response.warning = Some(format!(
                "stock commit failed for {product_id}: {reason}"
            ));
            Ok((StatusCode::CREATED, Json(response)))
        }
        Err(e) => Err(e.into()),
    }
}

/// GET /orders/{id}: load a persisted order by ID.
#[tracing::instrument(skip(state))]
pub async fn get<S: OrderStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order_id: OrderId = id
        .parse()
        .map_err(|e| ApiError::BadRequest(format!("Invalid ID format: {e}")))?;

    let order = state
        .store()
        .get(order_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Order {id} not found")))?;

    Ok(Json(OrderResponse::from(&order)))
}
