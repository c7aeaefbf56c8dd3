//! # Error Policy
//!
//! Requeue decisions for failed reconciliation passes.

use crate::controller::reconciler::{Reconciler, ReconcilerError};
use crate::crd::GenericStore;
use kube_runtime::controller::Action;
use std::sync::Arc;
use tracing::{info, warn};

/// Requeue a failed store with its own Fibonacci backoff
///
/// The condition and the event were already recorded by the pass itself, so
/// this only decides when to try again.
pub fn handle_reconciliation_error<K: GenericStore>(
    store: Arc<K>,
    error: &ReconcilerError,
    ctx: Arc<Reconciler>,
) -> Action {
    let key = store.store_key();

    if matches!(error, ReconcilerError::Cancelled) {
        info!(store = %key, "Pass cancelled during shutdown, not requeuing");
        return Action::await_change();
    }

    let backoff = ctx.backoff_states.next_backoff(&key);
    let next_trigger_time = chrono::Utc::now()
        + chrono::Duration::from_std(backoff).unwrap_or_else(|_| chrono::Duration::zero());

    warn!(
        store = %key,
        reason = error.reason(),
        error = %error,
        backoff_secs = backoff.as_secs(),
        next_retry = %next_trigger_time.to_rfc3339(),
        "Reconciliation failed, retrying with Fibonacci backoff"
    );
    Action::requeue(backoff)
}
