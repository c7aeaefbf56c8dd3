//! # Metrics
//!
//! Prometheus metrics for monitoring the controller.
//!
//! ## Metrics Exposed
//!
//! - `secret_store_reconciliations_total` - Total number of reconciliations by store kind
//! - `secret_store_reconciliation_errors_total` - Total number of reconciliation errors by reason
//! - `secret_store_reconciliation_duration_seconds` - Duration of reconciliation passes
//! - `secret_store_validation_attempts_total` - Liveness probe attempts by outcome
//! - `secret_store_validation_results_total` - Live validation results
//! - `secret_store_status_condition` - Current condition of each store (1 for the active status)

use crate::crd::{ConditionStatus, StoreKey};
use anyhow::Result;
use prometheus::{GaugeVec, HistogramVec, IntCounterVec, Registry};
use std::sync::LazyLock;

// Metrics
pub(crate) static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

static RECONCILIATIONS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "secret_store_reconciliations_total",
            "Total number of reconciliations by store kind",
        ),
        &["kind"],
    )
    .expect("Failed to create RECONCILIATIONS_TOTAL metric - this should never happen")
});

static RECONCILIATION_ERRORS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "secret_store_reconciliation_errors_total",
            "Total number of reconciliation errors by store kind and reason",
        ),
        &["kind", "reason"],
    )
    .expect("Failed to create RECONCILIATION_ERRORS_TOTAL metric - this should never happen")
});

static RECONCILIATION_DURATION: LazyLock<HistogramVec> = LazyLock::new(|| {
    HistogramVec::new(
        prometheus::HistogramOpts::new(
            "secret_store_reconciliation_duration_seconds",
            "Duration of reconciliation in seconds",
        )
        .buckets(vec![0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0]),
        &["kind"],
    )
    .expect("Failed to create RECONCILIATION_DURATION metric - this should never happen")
});

static VALIDATION_ATTEMPTS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "secret_store_validation_attempts_total",
            "Total number of credential liveness probe attempts by outcome",
        ),
        &["provider", "outcome"],
    )
    .expect("Failed to create VALIDATION_ATTEMPTS_TOTAL metric - this should never happen")
});

static VALIDATION_RESULTS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "secret_store_validation_results_total",
            "Total number of live validations by result",
        ),
        &["provider", "result"],
    )
    .expect("Failed to create VALIDATION_RESULTS_TOTAL metric - this should never happen")
});

static STATUS_CONDITION: LazyLock<GaugeVec> = LazyLock::new(|| {
    GaugeVec::new(
        prometheus::Opts::new(
            "secret_store_status_condition",
            "Status condition of each store, 1 for the active status",
        ),
        &["kind", "name", "namespace", "condition", "status"],
    )
    .expect("Failed to create STATUS_CONDITION metric - this should never happen")
});

#[allow(
    clippy::missing_errors_doc,
    reason = "Error documentation is provided in doc comments"
)]
pub fn register_metrics() -> Result<()> {
    REGISTRY.register(Box::new(RECONCILIATIONS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(RECONCILIATION_ERRORS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(RECONCILIATION_DURATION.clone()))?;
    REGISTRY.register(Box::new(VALIDATION_ATTEMPTS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(VALIDATION_RESULTS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(STATUS_CONDITION.clone()))?;

    Ok(())
}

pub fn increment_reconciliations(kind: &str) {
    RECONCILIATIONS_TOTAL.with_label_values(&[kind]).inc();
}

pub fn increment_reconciliation_errors(kind: &str, reason: &str) {
    RECONCILIATION_ERRORS_TOTAL
        .with_label_values(&[kind, reason])
        .inc();
}

pub fn observe_reconciliation_duration(kind: &str, duration: f64) {
    RECONCILIATION_DURATION
        .with_label_values(&[kind])
        .observe(duration);
}

/// Record one liveness probe attempt
pub fn record_validation_attempt(provider: &str, success: bool) {
    let outcome = if success { "success" } else { "failure" };
    VALIDATION_ATTEMPTS_TOTAL
        .with_label_values(&[provider, outcome])
        .inc();
}

pub fn record_validation_result(provider: &str, result: &str) {
    VALIDATION_RESULTS_TOTAL
        .with_label_values(&[provider, result])
        .inc();
}

/// Publish the condition of a store
///
/// Exactly one status series is 1 per store and condition type, the others are 0.
pub fn set_status_condition(store: &StoreKey, condition: &str, status: ConditionStatus) {
    let namespace = store.namespace.as_deref().unwrap_or("");
    for candidate in [
        ConditionStatus::True,
        ConditionStatus::False,
        ConditionStatus::Unknown,
    ] {
        let value = if candidate == status { 1.0 } else { 0.0 };
        STATUS_CONDITION
            .with_label_values(&[
                store.scope.kind(),
                &store.name,
                namespace,
                condition,
                candidate.as_str(),
            ])
            .set(value);
    }
}

/// Drop every status series of a store, once it no longer exists
pub fn remove_status_condition(store: &StoreKey, condition: &str) {
    let namespace = store.namespace.as_deref().unwrap_or("");
    for candidate in [
        ConditionStatus::True,
        ConditionStatus::False,
        ConditionStatus::Unknown,
    ] {
        // Absent when the store never completed a pass
        let _ = STATUS_CONDITION.remove_label_values(&[
            store.scope.kind(),
            &store.name,
            namespace,
            condition,
            candidate.as_str(),
        ]);
    }
}
