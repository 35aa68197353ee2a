//! Orchestrator configuration.

use std::time::Duration;

/// Tunables for order placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrchestratorConfig {
    /// Upper bound on the payment charge; exceeding it fails the placement.
    pub payment_timeout: Duration,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            payment_timeout: Duration::from_secs(10),
        }
    }
}
