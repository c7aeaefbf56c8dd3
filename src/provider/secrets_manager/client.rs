//! # Secrets Manager Client
//!
//! Client bound to one store's resolved credential.
//!
//! Only the read path is supported; push, delete and find-all fall through to
//! the `Unimplemented` defaults of [`SecretsClient`].

use crate::constants::MAX_VALIDATION_ATTEMPTS;
use crate::observability::metrics;
use crate::provider::auth::{LivenessProbe, ResolvedCredential};
use crate::provider::secrets_manager::api::SecretValueApi;
use crate::provider::{
    ExchangeError, ProviderError, ProviderKind, RemoteRef, SecretsClient, ValidationError,
    ValidationResult,
};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

pub struct SecretsManagerClient {
    region: String,
    credential: ResolvedCredential,
    api: Arc<dyn SecretValueApi>,
    probe: Arc<dyn LivenessProbe>,
    retry_delay: Duration,
}

impl std::fmt::Debug for SecretsManagerClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretsManagerClient")
            .field("region", &self.region)
            .field("credential", &self.credential)
            .field("retry_delay", &self.retry_delay)
            .finish_non_exhaustive()
    }
}

impl SecretsManagerClient {
    #[must_use]
    pub fn new(
        region: impl Into<String>,
        credential: ResolvedCredential,
        api: Arc<dyn SecretValueApi>,
        probe: Arc<dyn LivenessProbe>,
        retry_delay: Duration,
    ) -> Self {
        Self {
            region: region.into(),
            credential,
            api,
            probe,
            retry_delay,
        }
    }

    /// Fetch a secret and return its string payload, falling back to binary
    async fn payload(&self, remote: &RemoteRef) -> Result<Vec<u8>, ProviderError> {
        let value = self
            .api
            .get_secret_value(
                &self.region,
                &self.credential,
                &remote.key,
                remote.version.as_deref(),
            )
            .await
            .map_err(|source| ProviderError::Backend {
                key: remote.key.clone(),
                source,
            })?;

        if let Some(string) = value.string.filter(|s| !s.is_empty()) {
            return Ok(string.into_bytes());
        }
        value
            .binary
            .filter(|b| !b.is_empty())
            .ok_or_else(|| ProviderError::EmptySecret(remote.key.clone()))
    }
}

#[async_trait]
impl SecretsClient for SecretsManagerClient {
    async fn get_secret(&self, remote: &RemoteRef) -> Result<Vec<u8>, ProviderError> {
        let payload = self.payload(remote).await?;
        let Some(property) = remote.property.as_deref().filter(|p| !p.is_empty()) else {
            return Ok(payload);
        };

        let document: Value =
            serde_json::from_slice(&payload).map_err(|source| ProviderError::Decode {
                key: remote.key.clone(),
                source,
            })?;
        lookup_property(&document, property)
            .map(render_value)
            .ok_or_else(|| ProviderError::PropertyNotFound {
                property: property.to_string(),
                key: remote.key.clone(),
            })
    }

    async fn get_secret_map(
        &self,
        remote: &RemoteRef,
    ) -> Result<BTreeMap<String, Vec<u8>>, ProviderError> {
        let payload = self.get_secret(remote).await?;
        let entries: serde_json::Map<String, Value> =
            serde_json::from_slice(&payload).map_err(|source| ProviderError::Decode {
                key: remote.key.clone(),
                source,
            })?;

        Ok(entries
            .iter()
            .map(|(k, v)| (k.clone(), render_value(v)))
            .collect())
    }

    async fn validate(&self) -> Result<ValidationResult, ValidationError> {
        let provider = ProviderKind::SecretsManager.as_str();
        let mut last_error: Option<ExchangeError> = None;

        for attempt in 1..=MAX_VALIDATION_ATTEMPTS {
            match self.probe.probe(&self.region, &self.credential).await {
                Ok(()) => {
                    metrics::record_validation_attempt(provider, true);
                    metrics::record_validation_result(provider, ValidationResult::Ready.as_str());
                    debug!(attempt, "Credential probe succeeded");
                    return Ok(ValidationResult::Ready);
                }
                Err(e) => {
                    metrics::record_validation_attempt(provider, false);
                    warn!(
                        attempt,
                        max_attempts = MAX_VALIDATION_ATTEMPTS,
                        error = %e,
                        "Credential probe failed"
                    );
                    last_error = Some(e);
                }
            }

            if attempt < MAX_VALIDATION_ATTEMPTS && !self.retry_delay.is_zero() {
                tokio::time::sleep(self.retry_delay).await;
            }
        }

        let error = last_error
            .unwrap_or_else(|| ExchangeError::Rejected("no probe attempt was made".to_string()));
        let result = if error.is_transport() {
            ValidationResult::Unknown
        } else {
            ValidationResult::Error
        };
        metrics::record_validation_result(provider, result.as_str());

        Err(ValidationError {
            result,
            source: ProviderError::Probe(error),
        })
    }
}

/// Resolve a dotted path in a JSON document
///
/// A top-level key that literally contains dots wins over path traversal.
/// Numeric segments index into arrays.
fn lookup_property<'a>(document: &'a Value, property: &str) -> Option<&'a Value> {
    if let Some(value) = document.get(property) {
        return Some(value);
    }
    property
        .split('.')
        .try_fold(document, |current, segment| match current {
            Value::Object(map) => map.get(segment),
            Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        })
}

/// Strings are returned raw, everything else as JSON text
fn render_value(value: &Value) -> Vec<u8> {
    match value {
        Value::String(s) => s.clone().into_bytes(),
        other => other.to_string().into_bytes(),
    }
}
