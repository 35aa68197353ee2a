//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use domain::DomainError;
use orchestrator::PlaceOrderError;
use order_store::StoreError;
use stock_ledger::LedgerError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Resource not found.
    NotFound(String),
    /// Bad request from the client.
    BadRequest(String),
    /// Order placement error.
    Placement(PlaceOrderError),
    /// Stock ledger error.
    Ledger(LedgerError),
    /// Order store error.
    Store(StoreError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut body = serde_json::json!({});
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Placement(err) => {
                body["code"] = err.kind().into();
                if let PlaceOrderError::PaidButUnpersisted {
                    transaction_ref,
                    compensation_id,
                    ..
                } = &err
                {
                    body["transaction_ref"] = transaction_ref.as_str().into();
                    body["compensation_id"] = compensation_id.map(|id| id.to_string()).into();
                }
                placement_error_to_response(err)
            }
            ApiError::Ledger(err) => ledger_error_to_response(err),
            ApiError::Store(err) => store_error_to_response(err),
        };

        metrics::counter!("http_errors_total", "status" => status.as_u16().to_string())
            .increment(1);
        if status.is_server_error() {
            tracing::error!(%status, error = %message, "request failed");
        }

        body["error"] = message.into();
        (status, axum::Json(body)).into_response()
    }
}

fn placement_error_to_response(err: PlaceOrderError) -> (StatusCode, String) {
    match &err {
        PlaceOrderError::InvalidOrder(_) => (StatusCode::BAD_REQUEST, err.to_string()),
        PlaceOrderError::ProductNotFound(_) => (StatusCode::NOT_FOUND, err.to_string()),
        PlaceOrderError::InsufficientStock { .. } => (StatusCode::CONFLICT, err.to_string()),
        PlaceOrderError::PaymentFailed { .. } => (StatusCode::PAYMENT_REQUIRED, err.to_string()),
        PlaceOrderError::Ledger(LedgerError::Unavailable(_)) => {
            (StatusCode::SERVICE_UNAVAILABLE, err.to_string())
        }
        _ => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
    }
}

fn ledger_error_to_response(err: LedgerError) -> (StatusCode, String) {
    match &err {
        LedgerError::ProductNotFound(_) | LedgerError::ReservationNotFound(_) => {
            (StatusCode::NOT_FOUND, err.to_string())
        }
        LedgerError::InvalidQuantity { .. } => (StatusCode::BAD_REQUEST, err.to_string()),
        LedgerError::Unavailable(_) => (StatusCode::SERVICE_UNAVAILABLE, err.to_string()),
        _ => (StatusCode::CONFLICT, err.to_string()),
    }
}

fn store_error_to_response(err: StoreError) -> (StatusCode, String) {
    match &err {
        StoreError::Unavailable(_) => (StatusCode::SERVICE_UNAVAILABLE, err.to_string()),
        _ => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
    }
}

impl From<PlaceOrderError> for ApiError {
    fn from(err: PlaceOrderError) -> Self {
        ApiError::Placement(err)
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        ApiError::Ledger(err)
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError::Store(err)
    }
}
