//! # Metrics
//!
//! Prometheus metrics for monitoring the controller.
//!
//! ## Metrics Exposed
//!
//! - `access_token_reconciliations_total` - Total number of reconciliations
//! - `access_token_reconciliation_errors_total` - Total number of reconciliation errors
//! - `access_token_reconciliation_duration_seconds` - Duration of reconciliation passes
//! - `access_token_rotations_total` - Total number of tokens rotated
//! - `access_token_gitlab_operations_total` - GitLab API calls by operation
//! - `access_token_gitlab_operation_errors_total` - Failed GitLab API calls by operation
//! - `access_token_gitlab_operation_duration_seconds` - Duration of GitLab API calls by operation

use anyhow::Result;
use prometheus::{Histogram, HistogramVec, IntCounter, IntCounterVec, Registry};
use std::sync::LazyLock;

pub(crate) static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

static RECONCILIATIONS_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "access_token_reconciliations_total",
        "Total number of reconciliations",
    )
    .expect("Failed to create RECONCILIATIONS_TOTAL metric - this should never happen")
});

static RECONCILIATION_ERRORS_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "access_token_reconciliation_errors_total",
        "Total number of reconciliation errors",
    )
    .expect("Failed to create RECONCILIATION_ERRORS_TOTAL metric - this should never happen")
});

static RECONCILIATION_DURATION: LazyLock<Histogram> = LazyLock::new(|| {
    Histogram::with_opts(
        prometheus::HistogramOpts::new(
            "access_token_reconciliation_duration_seconds",
            "Duration of reconciliation in seconds",
        )
        .buckets(vec![0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0]),
    )
    .expect("Failed to create RECONCILIATION_DURATION metric - this should never happen")
});

static ROTATIONS_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "access_token_rotations_total",
        "Total number of access tokens rotated",
    )
    .expect("Failed to create ROTATIONS_TOTAL metric - this should never happen")
});

static GITLAB_OPERATIONS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "access_token_gitlab_operations_total",
            "Total number of GitLab API operations by operation",
        ),
        &["operation"],
    )
    .expect("Failed to create GITLAB_OPERATIONS_TOTAL metric - this should never happen")
});

static GITLAB_OPERATION_ERRORS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "access_token_gitlab_operation_errors_total",
            "Total number of failed GitLab API operations by operation",
        ),
        &["operation"],
    )
    .expect("Failed to create GITLAB_OPERATION_ERRORS_TOTAL metric - this should never happen")
});

static GITLAB_OPERATION_DURATION: LazyLock<HistogramVec> = LazyLock::new(|| {
    HistogramVec::new(
        prometheus::HistogramOpts::new(
            "access_token_gitlab_operation_duration_seconds",
            "Duration of GitLab API operations in seconds by operation",
        )
        .buckets(vec![0.05, 0.1, 0.5, 1.0, 2.0, 5.0, 10.0]),
        &["operation"],
    )
    .expect("Failed to create GITLAB_OPERATION_DURATION metric - this should never happen")
});

#[allow(
    clippy::missing_errors_doc,
    reason = "Fails only if a metric is registered twice"
)]
pub fn register_metrics() -> Result<()> {
    REGISTRY.register(Box::new(RECONCILIATIONS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(RECONCILIATION_ERRORS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(RECONCILIATION_DURATION.clone()))?;
    REGISTRY.register(Box::new(ROTATIONS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(GITLAB_OPERATIONS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(GITLAB_OPERATION_ERRORS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(GITLAB_OPERATION_DURATION.clone()))?;

    Ok(())
}

pub fn increment_reconciliations() {
    RECONCILIATIONS_TOTAL.inc();
}

pub fn increment_reconciliation_errors() {
    RECONCILIATION_ERRORS_TOTAL.inc();
}

pub fn observe_reconciliation_duration(duration: f64) {
    RECONCILIATION_DURATION.observe(duration);
}

pub fn increment_rotations() {
    ROTATIONS_TOTAL.inc();
}

/// Record a GitLab API call, successful or not
pub fn record_gitlab_operation(operation: &str, duration: f64) {
    GITLAB_OPERATIONS_TOTAL
        .with_label_values(&[operation])
        .inc();
    GITLAB_OPERATION_DURATION
        .with_label_values(&[operation])
        .observe(duration);
}

pub fn increment_gitlab_operation_errors(operation: &str) {
    GITLAB_OPERATION_ERRORS_TOTAL
        .with_label_values(&[operation])
        .inc();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gitlab_operation_counters_are_labelled() {
        let before = GITLAB_OPERATIONS_TOTAL.with_label_values(&["test-get"]).get();
        record_gitlab_operation("test-get", 0.2);
        increment_gitlab_operation_errors("test-get");

        assert_eq!(
            GITLAB_OPERATIONS_TOTAL.with_label_values(&["test-get"]).get(),
            before + 1
        );
        assert!(GITLAB_OPERATION_ERRORS_TOTAL.with_label_values(&["test-get"]).get() >= 1);
    }

    #[test]
    fn test_registered_metrics_are_gathered() {
        let registry = Registry::new();
        registry
            .register(Box::new(ROTATIONS_TOTAL.clone()))
            .unwrap();
        increment_rotations();

        let families = registry.gather();
        assert!(families
            .iter()
            .any(|f| f.name() == "access_token_rotations_total"));
    }
}
