//! Ledger configuration.

use std::time::Duration;

/// Reservation lifetime and sweep cadence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedgerConfig {
    /// How long a hold stays valid before the sweeper may release it.
    pub reservation_ttl: Duration,
    /// How often the background sweeper scans for expired holds.
    pub sweep_interval: Duration,
    /// How long past its expiry a committed reservation is remembered, so a
    /// repeated commit stays a no-op. After that it is pruned by the sweep.
    pub commit_retention: Duration,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            reservation_ttl: Duration::from_secs(15 * 60),
            sweep_interval: Duration::from_secs(30),
            commit_retention: Duration::from_secs(60 * 60),
        }
    }
}
