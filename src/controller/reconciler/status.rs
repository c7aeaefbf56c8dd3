//! # Status
//!
//! Status mutations made during a pass and the merge patch that writes them back.
//!
//! A pass starts from the status it observed, mutates a working copy and, at
//! the end, sends a JSON merge patch holding only the top-level status fields
//! that changed. Fields owned by other writers are never part of the patch.

use crate::constants::CONTROLLER_NAME;
use crate::crd::{
    ClusterSecretStore, Condition, ConditionStatus, SecretStore, SecretStoreCapabilities,
    SecretStoreStatus, StoreKey, StoreScope, CONDITION_READY,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use kube::api::{Patch, PatchParams};
use kube::{Api, Client};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;

/// Construction-time failure: missing fields, lookups, credential exchange
pub const REASON_INVALID_PROVIDER_CONFIG: &str = "InvalidProviderConfig";
/// The client was built but its credential failed the liveness probe
pub const REASON_VALIDATION_FAILED: &str = "ValidationFailed";
pub const REASON_STORE_VALID: &str = "StoreValid";

pub const MESSAGE_CLIENT_FAILED: &str = "unable to create client";
pub const MESSAGE_VALIDATION_FAILED: &str = "unable to validate store";
pub const MESSAGE_STORE_VALID: &str = "store validated";

#[derive(Debug, Error)]
#[error("failed to patch status of {store}: {message}")]
pub struct StatusWriteError {
    pub store: String,
    pub message: String,
}

/// Sink for status merge patches
#[async_trait]
pub trait StatusWriter: Send + Sync {
    /// Apply `patch` (a JSON merge patch of the form `{"status": {...}}`)
    async fn patch_status(&self, store: &StoreKey, patch: &Value)
        -> Result<(), StatusWriteError>;
}

/// Writes status through the `/status` subresource
#[derive(Clone)]
pub struct KubeStatusWriter {
    client: Client,
}

impl KubeStatusWriter {
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl StatusWriter for KubeStatusWriter {
    async fn patch_status(
        &self,
        store: &StoreKey,
        patch: &Value,
    ) -> Result<(), StatusWriteError> {
        if is_empty_patch(patch) {
            debug!(store = %store, "Skipping status update - status unchanged");
            return Ok(());
        }

        let params = PatchParams::apply(CONTROLLER_NAME);
        let patch = Patch::Merge(patch);
        let result = match (store.scope, store.namespace.as_deref()) {
            (StoreScope::Namespaced, Some(namespace)) => {
                let api: Api<SecretStore> = Api::namespaced(self.client.clone(), namespace);
                api.patch_status(&store.name, &params, &patch).await.map(|_| ())
            }
            (StoreScope::Namespaced, None) => {
                return Err(StatusWriteError {
                    store: store.to_string(),
                    message: "namespaced store without a namespace".to_string(),
                });
            }
            (StoreScope::ClusterWide, _) => {
                let api: Api<ClusterSecretStore> = Api::all(self.client.clone());
                api.patch_status(&store.name, &params, &patch).await.map(|_| ())
            }
        };

        result.map_err(|e| StatusWriteError {
            store: store.to_string(),
            message: e.to_string(),
        })
    }
}

fn is_empty_patch(patch: &Value) -> bool {
    patch
        .get("status")
        .and_then(Value::as_object)
        .is_none_or(Map::is_empty)
}

/// Working copy of a store's status for one pass
#[derive(Debug, Clone)]
pub struct StatusUpdate {
    observed: SecretStoreStatus,
    current: SecretStoreStatus,
}

impl StatusUpdate {
    #[must_use]
    pub fn new(observed: Option<&SecretStoreStatus>) -> Self {
        let observed = observed.cloned().unwrap_or_default();
        Self {
            current: observed.clone(),
            observed,
        }
    }

    #[must_use]
    pub fn status(&self) -> &SecretStoreStatus {
        &self.current
    }

    /// Set the `Ready` condition
    ///
    /// `lastTransitionTime` only moves when the condition status changes.
    pub fn set_ready(
        &mut self,
        status: ConditionStatus,
        reason: &str,
        message: &str,
        now: DateTime<Utc>,
    ) {
        let last_transition_time = match self.current.condition(CONDITION_READY) {
            Some(existing) if existing.status == status.as_str() => {
                existing.last_transition_time.clone()
            }
            _ => Some(now.to_rfc3339()),
        };

        let condition = Condition {
            r#type: CONDITION_READY.to_string(),
            status: status.as_str().to_string(),
            last_transition_time,
            reason: Some(reason.to_string()),
            message: Some(message.to_string()),
        };

        match self
            .current
            .conditions
            .iter_mut()
            .find(|c| c.r#type == CONDITION_READY)
        {
            Some(existing) => *existing = condition,
            None => self.current.conditions.push(condition),
        }
    }

    pub fn set_capabilities(&mut self, capabilities: SecretStoreCapabilities) {
        self.current.capabilities = Some(capabilities);
    }

    /// Merge patch with the status fields that differ from the observed status
    ///
    /// Lists are replaced wholesale by merge patches, so a changed condition
    /// sends the full condition list.
    #[must_use]
    pub fn merge_patch(&self) -> Value {
        let mut status = Map::new();
        if self.current.conditions != self.observed.conditions {
            status.insert(
                "conditions".to_string(),
                serde_json::to_value(&self.current.conditions).unwrap_or(Value::Null),
            );
        }
        if self.current.capabilities != self.observed.capabilities {
            status.insert(
                "capabilities".to_string(),
                serde_json::to_value(self.current.capabilities).unwrap_or(Value::Null),
            );
        }
        serde_json::json!({ "status": status })
    }

    #[must_use]
    pub fn is_changed(&self) -> bool {
        self.current != self.observed
    }
}
