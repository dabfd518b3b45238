//! # Controller Configuration
//!
//! Controller-level settings loaded from environment variables.

use std::time::Duration;

use crate::constants::{
    DEFAULT_BACKOFF_MAX_MINUTES, DEFAULT_BACKOFF_MIN_MINUTES,
    DEFAULT_MAX_CONCURRENT_RECONCILIATIONS, DEFAULT_METRICS_PORT, DEFAULT_POLL_INTERVAL_SECS,
    DEFAULT_REQUEST_TIMEOUT_SECS,
};

/// Controller-level configuration
///
/// All settings have defaults and can be overridden via environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerConfig {
    /// Port of the metrics and health server
    pub metrics_port: u16,
    /// Requeue interval after a successful reconciliation (seconds)
    pub poll_interval_secs: u64,
    /// Timeout for a single GitLab API call (seconds)
    pub request_timeout_secs: u64,
    /// Limits how many resources are reconciled simultaneously
    pub max_concurrent_reconciliations: u16,
    /// Fibonacci backoff bounds for reconciliation errors (minutes)
    pub backoff_min_minutes: u64,
    pub backoff_max_minutes: u64,
    /// Log format (json, text)
    pub log_format: String,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            metrics_port: DEFAULT_METRICS_PORT,
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            max_concurrent_reconciliations: DEFAULT_MAX_CONCURRENT_RECONCILIATIONS,
            backoff_min_minutes: DEFAULT_BACKOFF_MIN_MINUTES,
            backoff_max_minutes: DEFAULT_BACKOFF_MAX_MINUTES,
            log_format: "text".to_string(),
        }
    }
}

impl ControllerConfig {
    /// Load configuration from environment variables with defaults
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let backoff_min_minutes = var_or_default(&lookup, "BACKOFF_MIN_MINUTES", defaults.backoff_min_minutes);
        Self {
            metrics_port: var_or_default(&lookup, "METRICS_PORT", defaults.metrics_port),
            poll_interval_secs: var_or_default(&lookup, "POLL_INTERVAL_SECS", defaults.poll_interval_secs)
                .max(1),
            request_timeout_secs: var_or_default(
                &lookup,
                "REQUEST_TIMEOUT_SECS",
                defaults.request_timeout_secs,
            )
            .max(1),
            max_concurrent_reconciliations: var_or_default(
                &lookup,
                "MAX_CONCURRENT_RECONCILIATIONS",
                defaults.max_concurrent_reconciliations,
            ),
            backoff_min_minutes,
            backoff_max_minutes: var_or_default(&lookup, "BACKOFF_MAX_MINUTES", defaults.backoff_max_minutes)
                .max(backoff_min_minutes),
            log_format: lookup("LOG_FORMAT")
                .map(|v| v.trim().to_lowercase())
                .filter(|v| !v.is_empty())
                .unwrap_or(defaults.log_format),
        }
    }

    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    #[must_use]
    pub fn json_logs(&self) -> bool {
        self.log_format == "json"
    }
}

/// Read a variable or return the default when unset or unparsable
fn var_or_default<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> T {
    lookup(key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        assert_eq!(ControllerConfig::from_lookup(lookup(&[])), ControllerConfig::default());
    }

    #[test]
    fn test_overrides_from_environment() {
        let config = ControllerConfig::from_lookup(lookup(&[
            ("METRICS_PORT", "9090"),
            ("POLL_INTERVAL_SECS", "120"),
            ("REQUEST_TIMEOUT_SECS", "10"),
            ("MAX_CONCURRENT_RECONCILIATIONS", "4"),
            ("LOG_FORMAT", "JSON"),
        ]));

        assert_eq!(config.metrics_port, 9090);
        assert_eq!(config.poll_interval(), Duration::from_secs(120));
        assert_eq!(config.request_timeout(), Duration::from_secs(10));
        assert_eq!(config.max_concurrent_reconciliations, 4);
        assert!(config.json_logs());
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let config = ControllerConfig::from_lookup(lookup(&[
            ("METRICS_PORT", "not-a-port"),
            ("POLL_INTERVAL_SECS", "0"),
            ("BACKOFF_MIN_MINUTES", "5"),
            ("BACKOFF_MAX_MINUTES", "2"),
        ]));

        assert_eq!(config.metrics_port, DEFAULT_METRICS_PORT);
        assert_eq!(config.poll_interval_secs, 1);
        assert_eq!(config.backoff_max_minutes, 5);
    }
}
