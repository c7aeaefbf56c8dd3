//! # Reconciliation Logic
//!
//! One pass over a `SecretStore` or `ClusterSecretStore`:
//!
//! 1. Skip stores being deleted or owned by another controller class
//! 2. Pick the requeue interval
//! 3. Validate the store (structure, then credentials)
//! 4. Record the outcome in the `Ready` condition and emit one event
//! 5. Write the changed status fields back in a single merge patch

use crate::controller::reconciler::events::ACTION_VALIDATE;
use crate::controller::reconciler::status::{
    StatusUpdate, MESSAGE_CLIENT_FAILED, MESSAGE_STORE_VALID, MESSAGE_VALIDATION_FAILED,
    REASON_INVALID_PROVIDER_CONFIG, REASON_STORE_VALID, REASON_VALIDATION_FAILED,
};
use crate::controller::reconciler::types::{Reconciler, ReconcilerError};
use crate::crd::{ConditionStatus, GenericStore, StoreView, CONDITION_READY};
use crate::observability::metrics;
use crate::provider::{validator, ProviderRegistry, StoreValidationError, ValidationResult};
use chrono::Utc;
use k8s_openapi::api::core::v1::ObjectReference;
use kube::runtime::controller::Action;
use kube::runtime::events::EventType;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn, Instrument};

/// Controller entry point, using the configured default refresh interval
pub async fn reconcile<K: GenericStore>(
    store: Arc<K>,
    ctx: Arc<Reconciler>,
) -> Result<Action, ReconcilerError> {
    let default_interval = ctx.config.default_refresh_interval();
    reconcile_store(store, ctx, default_interval).await
}

/// Structural validation of a store, without touching the network
pub fn validate_store<K: GenericStore>(
    store: &K,
    registry: &ProviderRegistry,
) -> Result<(), StoreValidationError> {
    validator::validate_structure(registry, &store.view()).map(|_| ())
}

/// Whether this controller owns the store
#[must_use]
pub fn should_process(store_class: &str, controller_class: &str) -> bool {
    store_class.is_empty() || store_class == controller_class
}

/// Requeue interval after a successful pass
#[must_use]
pub fn requeue_interval(refresh_interval_secs: i64, default_interval: Duration) -> Duration {
    u64::try_from(refresh_interval_secs)
        .ok()
        .filter(|secs| *secs > 0)
        .map_or(default_interval, Duration::from_secs)
}

/// Run one reconciliation pass
///
/// Validation failures are returned as errors so the error policy applies its
/// backoff. The status write at the end of the pass is logged on failure and
/// never changes the returned action.
pub async fn reconcile_store<K: GenericStore>(
    store: Arc<K>,
    ctx: Arc<Reconciler>,
    default_interval: Duration,
) -> Result<Action, ReconcilerError> {
    let span = tracing::info_span!(
        "reconcile",
        store.kind = K::SCOPE.kind(),
        store.name = store.meta().name.as_deref().unwrap_or("unknown"),
        store.namespace = store.meta().namespace.as_deref().unwrap_or("")
    );

    async move {
        if store.meta().deletion_timestamp.is_some() {
            debug!("Store is being deleted, dropping its state");
            ctx.forget_store(&store.store_key());
            return Ok(Action::await_change());
        }

        let view = store.view();
        if !should_process(view.controller, &ctx.controller_class) {
            debug!(
                store_class = view.controller,
                controller_class = %ctx.controller_class,
                "Skipping store owned by another controller class"
            );
            return Ok(Action::await_change());
        }

        let kind = K::SCOPE.kind();
        let key = store.store_key();
        let start = Instant::now();
        metrics::increment_reconciliations(kind);

        let interval = requeue_interval(view.refresh_interval, default_interval);
        let object_ref = store.object_reference();
        let mut update = StatusUpdate::new(store.store_status());

        let cancel = ctx.shutdown.child_token();
        let outcome = tokio::select! {
            biased;
            () = cancel.cancelled() => None,
            result = run_pass(&view, &object_ref, &ctx, &mut update, interval) => Some(result),
        };

        let Some(result) = outcome else {
            warn!("Reconciliation cancelled, status left untouched");
            return Err(ReconcilerError::Cancelled);
        };

        let patch = update.merge_patch();
        if let Err(e) = ctx.status_writer.patch_status(&key, &patch).await {
            warn!(error = %e, "Failed to write store status");
        }
        if let Some(ready) = update.status().condition(CONDITION_READY) {
            let status = match ready.status.as_str() {
                "True" => ConditionStatus::True,
                "False" => ConditionStatus::False,
                _ => ConditionStatus::Unknown,
            };
            metrics::set_status_condition(&key, CONDITION_READY, status);
        }

        metrics::observe_reconciliation_duration(kind, start.elapsed().as_secs_f64());
        if result.is_ok() {
            ctx.backoff_states.reset(&key);
        }
        result
    }
    .instrument(span)
    .await
}

async fn run_pass(
    view: &StoreView<'_>,
    object_ref: &ObjectReference,
    ctx: &Reconciler,
    update: &mut StatusUpdate,
    interval: Duration,
) -> Result<Action, ReconcilerError> {
    let provider = match validator::validate_structure(&ctx.registry, view) {
        Ok(provider) => provider,
        Err(e) => return Err(record_failure(object_ref, ctx, update, e).await),
    };

    let namespace = view.namespace.unwrap_or_default();
    match validator::validate_live(provider.as_ref(), view, namespace).await {
        Ok(result) => {
            debug!(result = result.as_str(), "Store validated");
            update.set_capabilities(provider.capabilities());
            update.set_ready(
                ConditionStatus::True,
                REASON_STORE_VALID,
                MESSAGE_STORE_VALID,
                Utc::now(),
            );
            ctx.events
                .publish(
                    object_ref,
                    EventType::Normal,
                    REASON_STORE_VALID,
                    ACTION_VALIDATE,
                    Some(MESSAGE_STORE_VALID.to_string()),
                )
                .await;
            info!(requeue_after_secs = interval.as_secs(), "Store validated");
            Ok(Action::requeue(interval))
        }
        Err(e) if e.result() == ValidationResult::Unknown => {
            let retry = ctx.config.transient_requeue_duration();
            warn!(
                error = %e,
                retry_after_secs = retry.as_secs(),
                "Store validation inconclusive, keeping current condition"
            );
            Ok(Action::requeue(retry))
        }
        Err(e) => Err(record_failure(object_ref, ctx, update, e).await),
    }
}

async fn record_failure(
    object_ref: &ObjectReference,
    ctx: &Reconciler,
    update: &mut StatusUpdate,
    error: StoreValidationError,
) -> ReconcilerError {
    let (reason, message) = if error.is_construction_failure() {
        (REASON_INVALID_PROVIDER_CONFIG, MESSAGE_CLIENT_FAILED)
    } else {
        (REASON_VALIDATION_FAILED, MESSAGE_VALIDATION_FAILED)
    };
    let detail = error.to_string();

    update.set_ready(
        ConditionStatus::False,
        reason,
        &format!("{message}: {detail}"),
        Utc::now(),
    );
    ctx.events
        .publish(
            object_ref,
            EventType::Warning,
            reason,
            ACTION_VALIDATE,
            Some(detail),
        )
        .await;
    warn!(reason, error = %error, "{message}");
    metrics::increment_reconciliation_errors(object_ref.kind.as_deref().unwrap_or(""), reason);

    ReconcilerError::Validation(error)
}
