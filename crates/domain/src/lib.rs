//! Domain layer for the order placement workflow.
//!
//! This crate provides the value types the placement core operates on:
//! - `Order` and `OrderLine` with their validation rules
//! - `OrderStatus` lifecycle (`pending`, `confirmed`, `failed`)
//! - `PaymentOutcome` and the payment method / idempotency tokens
//! - `CompensationRecord` for charged-but-unpersisted payments

pub mod compensation;
pub mod error;
pub mod order;
pub mod payment;

pub use common::OrderId;
pub use compensation::{CompensationId, CompensationRecord};
pub use error::DomainError;
pub use order::{CustomerId, Money, Order, OrderLine, OrderRecord, OrderStatus, ProductId};
pub use payment::{IdempotencyKey, PaymentMethodToken, PaymentOutcome};
