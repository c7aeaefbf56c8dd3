//! # Secrets Manager Provider
//!
//! Read-only backend authenticated with either a static key pair or a
//! federated service account identity.
//!
//! - `validation.rs` - structural checks, no network I/O
//! - `client.rs` - client bound to a resolved credential
//! - `api.rs` - raw `GetSecretValue` call

use crate::crd::{ProviderConfig, SecretStoreCapabilities, SecretsManagerProvider, StoreView};
use crate::provider::auth::{CredentialResolver, LivenessProbe};
use crate::provider::{ProviderError, SecretsClient, StoreProvider};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, Instrument};

pub mod api;
mod client;
mod validation;

pub use api::{AwsSecretValueApi, SecretValue, SecretValueApi};
pub use client::SecretsManagerClient;
pub use validation::validate_store;

/// Secrets manager provider registered under `ProviderKind::SecretsManager`
pub struct SecretsManager {
    resolver: CredentialResolver,
    probe: Arc<dyn LivenessProbe>,
    api: Arc<dyn SecretValueApi>,
    retry_delay: Duration,
}

impl std::fmt::Debug for SecretsManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretsManager")
            .field("retry_delay", &self.retry_delay)
            .finish_non_exhaustive()
    }
}

impl SecretsManager {
    #[must_use]
    pub fn new(
        resolver: CredentialResolver,
        probe: Arc<dyn LivenessProbe>,
        api: Arc<dyn SecretValueApi>,
        retry_delay: Duration,
    ) -> Self {
        Self {
            resolver,
            probe,
            api,
            retry_delay,
        }
    }
}

fn provider_config<'a>(store: &StoreView<'a>) -> &'a SecretsManagerProvider {
    match store.provider {
        ProviderConfig::SecretsManager(provider) => provider,
    }
}

#[async_trait]
impl StoreProvider for SecretsManager {
    fn capabilities(&self) -> SecretStoreCapabilities {
        SecretStoreCapabilities::ReadOnly
    }

    fn validate_store(&self, store: &StoreView<'_>) -> Result<(), ProviderError> {
        validate_store(store, provider_config(store)).map_err(ProviderError::from)
    }

    async fn new_client(
        &self,
        store: &StoreView<'_>,
        namespace: &str,
    ) -> Result<Box<dyn SecretsClient>, ProviderError> {
        let provider = provider_config(store);
        let span = tracing::info_span!(
            "secrets_manager.new_client",
            region = %provider.region_id,
            namespace = %namespace
        );

        async move {
            let credential = self
                .resolver
                .resolve(provider, store.scope, namespace)
                .await?;
            debug!(credential = ?credential, "Resolved store credential");

            let client: Box<dyn SecretsClient> = Box::new(SecretsManagerClient::new(
                provider.region_id.clone(),
                credential,
                Arc::clone(&self.api),
                Arc::clone(&self.probe),
                self.retry_delay,
            ));
            Ok(client)
        }
        .instrument(span)
        .await
    }
}
