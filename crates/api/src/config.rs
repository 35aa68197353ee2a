//! Application configuration loaded from environment variables.

use std::time::Duration;

use orchestrator::OrchestratorConfig;
use stock_ledger::LedgerConfig;

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST`: bind address (default: `"0.0.0.0"`)
/// - `PORT`: listen port (default: `3000`)
/// - `RUST_LOG`: tracing filter directive (default: `"info"`)
/// - `DATABASE_URL`: PostgreSQL order store; in-memory when unset
/// - `PAYMENT_TIMEOUT_MS`: payment charge timeout (default: `10000`)
/// - `RESERVATION_TTL_SECS`: lifetime of a stock hold (default: `900`)
/// - `SWEEP_INTERVAL_SECS`: expired hold sweep period (default: `30`)
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub database_url: Option<String>,
    pub payment_timeout: Duration,
    pub reservation_ttl: Duration,
    pub sweep_interval: Duration,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a configuration from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let parse_u64 = |key: &str| lookup(key).and_then(|v| v.parse::<u64>().ok());

        Self {
            host: lookup("HOST").unwrap_or(defaults.host),
            port: lookup("PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            log_level: lookup("RUST_LOG").unwrap_or(defaults.log_level),
            database_url: lookup("DATABASE_URL").filter(|url| !url.is_empty()),
            payment_timeout: parse_u64("PAYMENT_TIMEOUT_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.payment_timeout),
            reservation_ttl: parse_u64("RESERVATION_TTL_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.reservation_ttl),
            sweep_interval: parse_u64("SWEEP_INTERVAL_SECS")
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
                .unwrap_or(defaults.sweep_interval),
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn orchestrator_config(&self) -> OrchestratorConfig {
        OrchestratorConfig {
            payment_timeout: self.payment_timeout,
        }
    }

    pub fn ledger_config(&self) -> LedgerConfig {
        LedgerConfig {
            reservation_ttl: self.reservation_ttl,
            sweep_interval: self.sweep_interval,
            ..LedgerConfig::default()
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let ledger = LedgerConfig::default();
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_level: "info".to_string(),
            database_url: None,
            payment_timeout: OrchestratorConfig::default().payment_timeout,
            reservation_ttl: ledger.reservation_ttl,
            sweep_interval: ledger.sweep_interval,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn from_pairs(pairs: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_default_values() {
        let config = Config::default();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 3000);
        assert_eq!(config.log_level, "info");
        assert!(config.database_url.is_none());
        assert_eq!(config.payment_timeout, Duration::from_millis(10_000));
        assert_eq!(config.reservation_ttl, Duration::from_secs(900));
        assert_eq!(config.sweep_interval, Duration::from_secs(30));
    }

    #[test]
    fn test_reads_overrides() {
        let config = from_pairs(&[
            ("PORT", "8080"),
            ("DATABASE_URL", "postgres://localhost/orders"),
            ("PAYMENT_TIMEOUT_MS", "250"),
            ("RESERVATION_TTL_SECS", "60"),
            ("SWEEP_INTERVAL_SECS", "5"),
        ]);

        assert_eq!(config.port, 8080);
        assert_eq!(config.database_url.as_deref(), Some("postgres://localhost/orders"));
        assert_eq!(config.orchestrator_config().payment_timeout, Duration::from_millis(250));
        assert_eq!(config.ledger_config().reservation_ttl, Duration::from_secs(60));
        assert_eq!(config.ledger_config().sweep_interval, Duration::from_secs(5));
    }

    #[test]
    fn test_invalid_values_fall_back_to_defaults() {
        let config = from_pairs(&[
            ("PORT", "not-a-port"),
            ("DATABASE_URL", ""),
            ("SWEEP_INTERVAL_SECS", "0"),
        ]);

        assert_eq!(config.port, 3000);
        assert!(config.database_url.is_none());
        assert_eq!(config.sweep_interval, Duration::from_secs(30));
    }

    #[test]
    fn test_addr_formatting() {
        let config = Config {
            host: "127.0.0.1".to_string(),
            port: 8080,
            ..Config::default()
        };
        assert_eq!(config.addr(), "127.0.0.1:8080");
    }
}
