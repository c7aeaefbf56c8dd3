//! # Store Specifications
//!
//! `SecretStore` (namespaced) and `ClusterSecretStore` (cluster-scoped) custom
//! resources. Both kinds carry the same fields; the scope decides how
//! namespace overrides on credential references are treated.

use crate::crd::{ProviderConfig, SecretStoreStatus};
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// SecretStore Custom Resource Definition
///
/// # Example
///
/// ```yaml
/// apiVersion: secret-management.octopilot.io/v1
/// kind: SecretStore
/// metadata:
///   name: tenant-store
///   namespace: team-a
/// spec:
///   refreshInterval: 600
///   provider:
///     type: secretsManager
///     regionID: ap-guangzhou
///     auth:
///       secretRef:
///         accessKeyIDSecretRef:
///           name: sec-id
///           key: k1
///         accessKeySecretSecretRef:
///           name: sec-key
///           key: k1
/// ```
#[derive(CustomResource, Debug, Clone, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(
    group = "secret-management.octopilot.io",
    version = "v1",
    kind = "SecretStore",
    namespaced,
    status = "SecretStoreStatus",
    shortname = "ss",
    printcolumn = r#"{"name":"Ready", "type":"string", "jsonPath":".status.conditions[?(@.type==\"Ready\")].status"}"#,
    printcolumn = r#"{"name":"Capabilities", "type":"string", "jsonPath":".status.capabilities"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct SecretStoreSpec {
    /// Controller class that owns this store
    /// Empty means any controller instance reconciles it
    #[serde(default)]
    pub controller: String,
    /// Seconds between validation passes (0 = controller default)
    #[serde(default)]
    pub refresh_interval: i64,
    /// Secret backend configuration
    pub provider: ProviderConfig,
}

/// ClusterSecretStore Custom Resource Definition
///
/// Same shape as [`SecretStoreSpec`]. Every credential reference must name its
/// namespace explicitly since the store has none.
#[derive(CustomResource, Debug, Clone, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(
    group = "secret-management.octopilot.io",
    version = "v1",
    kind = "ClusterSecretStore",
    status = "SecretStoreStatus",
    shortname = "css",
    printcolumn = r#"{"name":"Ready", "type":"string", "jsonPath":".status.conditions[?(@.type==\"Ready\")].status"}"#,
    printcolumn = r#"{"name":"Capabilities", "type":"string", "jsonPath":".status.capabilities"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct ClusterSecretStoreSpec {
    /// Controller class that owns this store
    #[serde(default)]
    pub controller: String,
    /// Seconds between validation passes (0 = controller default)
    #[serde(default)]
    pub refresh_interval: i64,
    /// Secret backend configuration
    pub provider: ProviderConfig,
}
