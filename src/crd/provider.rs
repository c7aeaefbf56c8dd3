//! # Provider Configuration
//!
//! Provider section of the store spec: region, optional role and the
//! authentication method used to obtain cloud credentials.

use crate::provider::ConfigError;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Secret backend configuration
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase", tag = "type")]
pub enum ProviderConfig {
    /// Cloud secrets manager reached with region-scoped credentials
    SecretsManager(SecretsManagerProvider),
}

/// Secrets manager provider configuration
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SecretsManagerProvider {
    /// Region the backend and the credential exchange are called in (e.g. "ap-guangzhou")
    #[serde(rename = "regionID")]
    pub region_id: String,
    /// Role to assume with the static key pair
    /// Only valid together with `auth.secretRef`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// Authentication method
    pub auth: AuthSpec,
}

/// Authentication section as it appears on the wire
///
/// Exactly one of the two fields must be set. Use [`AuthSpec::method`] to get the
/// validated variant.
#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AuthSpec {
    /// Static access key pair read from Kubernetes secrets
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_ref: Option<StaticKeyRef>,
    /// Service account whose bound token is exchanged for temporary credentials
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_account_ref: Option<ServiceAccountSelector>,
}

/// Validated authentication method
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AuthMethod<'a> {
    StaticKey(&'a StaticKeyRef),
    FederatedIdentity(&'a ServiceAccountSelector),
}

impl AuthSpec {
    /// Resolve the wire form into exactly one authentication method
    pub fn method(&self) -> Result<AuthMethod<'_>, ConfigError> {
        match (&self.secret_ref, &self.service_account_ref) {
            (Some(keys), None) => Ok(AuthMethod::StaticKey(keys)),
            (None, Some(identity)) => Ok(AuthMethod::FederatedIdentity(identity)),
            (Some(_), Some(_)) => Err(ConfigError::ConflictingAuthMethods),
            (None, None) => Err(ConfigError::NoAuthMethodConfigured),
        }
    }
}

/// References to the two halves of a static access key
#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
pub struct StaticKeyRef {
    /// Secret key holding the access key ID
    #[serde(rename = "accessKeyIDSecretRef")]
    pub access_key_id: SecretKeySelector,
    /// Secret key holding the access key secret
    #[serde(rename = "accessKeySecretSecretRef")]
    pub access_key_secret: SecretKeySelector,
}

/// Points at one key of a Kubernetes secret
#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SecretKeySelector {
    /// Secret name
    pub name: String,
    /// Key in the secret's data map
    #[serde(default)]
    pub key: String,
    /// Secret namespace
    /// Required for ClusterSecretStore, ignored-or-rejected for SecretStore
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

/// Points at a Kubernetes service account
#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ServiceAccountSelector {
    /// Service account name
    pub name: String,
    /// Service account namespace
    /// Required for ClusterSecretStore
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}
