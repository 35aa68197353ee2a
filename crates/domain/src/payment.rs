//! Payment values exchanged with the payment processor.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque token identifying the customer's payment method (e.g. a card token).
///
/// The value is never printed by `Debug`.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PaymentMethodToken(String);

impl PaymentMethodToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for PaymentMethodToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("PaymentMethodToken(***)")
    }
}

/// Key that lets the processor recognise a repeated charge request.
///
/// A fresh key is generated for every placement attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdempotencyKey(Uuid);

impl IdempotencyKey {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for IdempotencyKey {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for IdempotencyKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Result of a single charge attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PaymentOutcome {
    /// The charge went through.
    Approved { transaction_ref: String },

    /// The charge was refused.
    Declined { reason: String },
}

impl PaymentOutcome {
    pub fn approved(transaction_ref: impl Into<String>) -> Self {
        PaymentOutcome::Approved {
            transaction_ref: transaction_ref.into(),
        }
    }

    pub fn declined(reason: impl Into<String>) -> Self {
        PaymentOutcome::Declined {
            reason: reason.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, PaymentOutcome::Approved { .. })
    }

    /// Present iff the charge succeeded.
    pub fn transaction_ref(&self) -> Option<&str> {
        match self {
            PaymentOutcome::Approved { transaction_ref } => Some(transaction_ref),
            PaymentOutcome::Declined { .. } => None,
        }
    }

    /// Present iff the charge failed.
    pub fn failure_reason(&self) -> Option<&str> {
        match self {
            PaymentOutcome::Approved { .. } => None,
            PaymentOutcome::Declined { reason } => Some(reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_accessors_are_exclusive() {
        let ok = PaymentOutcome::approved("PAY-0001");
        assert!(ok.is_success());
        assert_eq!(ok.transaction_ref(), Some("PAY-0001"));
        assert_eq!(ok.failure_reason(), None);

        let declined = PaymentOutcome::declined("card expired");
        assert!(!declined.is_success());
        assert_eq!(declined.transaction_ref(), None);
        assert_eq!(declined.failure_reason(), Some("card expired"));
    }

    #[test]
    fn test_token_debug_is_redacted() {
        let token = PaymentMethodToken::new("tok_visa_4242");
        assert_eq!(format!("{token:?}"), "PaymentMethodToken(***)");
        assert_eq!(token.as_str(), "tok_visa_4242");
    }

    #[test]
    fn test_idempotency_keys_are_unique() {
        assert_ne!(IdempotencyKey::new(), IdempotencyKey::new());
    }

    #[test]
    fn test_outcome_serialization_is_tagged() {
        let json = serde_json::to_value(PaymentOutcome::declined("insufficient funds")).unwrap();
        assert_eq!(json["outcome"], "declined");
        assert_eq!(json["reason"], "insufficient funds");
    }
}
