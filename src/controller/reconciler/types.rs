//! # Types
//!
//! Core types for the reconciler.

use crate::config::ControllerConfig;
use crate::controller::backoff::BackoffStates;
use crate::controller::reconciler::events::EventPublisher;
use crate::controller::reconciler::status::StatusWriter;
use crate::crd::{StoreKey, CONDITION_READY};
use crate::observability::metrics;
use crate::provider::{ProviderRegistry, StoreValidationError};
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Error)]
pub enum ReconcilerError {
    /// The store failed validation; the condition and event carry the details
    #[error(transparent)]
    Validation(#[from] StoreValidationError),
    /// The pass was cancelled before it could reach a verdict
    #[error("reconciliation cancelled")]
    Cancelled,
}

impl ReconcilerError {
    /// Condition reason this error is reported under, used as a metrics label
    #[must_use]
    pub fn reason(&self) -> &'static str {
        match self {
            ReconcilerError::Validation(e) if e.is_construction_failure() => {
                crate::controller::reconciler::status::REASON_INVALID_PROVIDER_CONFIG
            }
            ReconcilerError::Validation(_) => {
                crate::controller::reconciler::status::REASON_VALIDATION_FAILED
            }
            ReconcilerError::Cancelled => "Cancelled",
        }
    }
}

/// Shared reconciliation context for both store kinds
#[derive(Clone)]
pub struct Reconciler {
    /// Stores declaring another non-empty class are left alone
    pub controller_class: String,
    pub registry: ProviderRegistry,
    pub status_writer: Arc<dyn StatusWriter>,
    pub events: Arc<dyn EventPublisher>,
    pub config: ControllerConfig,
    /// Error backoff per store, advanced by the error policy
    pub backoff_states: Arc<BackoffStates>,
    /// Cancelled on shutdown; every pass runs under a child token
    pub shutdown: CancellationToken,
}

impl std::fmt::Debug for Reconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reconciler")
            .field("controller_class", &self.controller_class)
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

impl Reconciler {
    #[must_use]
    pub fn new(
        config: ControllerConfig,
        registry: ProviderRegistry,
        status_writer: Arc<dyn StatusWriter>,
        events: Arc<dyn EventPublisher>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            controller_class: config.controller_class.clone(),
            registry,
            status_writer,
            events,
            backoff_states: Arc::new(BackoffStates::new(
                config.backoff_min_minutes,
                config.backoff_max_minutes,
            )),
            config,
            shutdown,
        }
    }

    /// Drop the backoff entry and condition series of a deleted store
    pub fn forget_store(&self, key: &StoreKey) {
        self.backoff_states.reset(key);
        metrics::remove_status_condition(key, CONDITION_READY);
    }
}
