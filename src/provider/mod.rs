//! # Provider Modules
//!
//! Secret backends a store can point at, and the credential resolution they share.
//!
//! Each backend implements:
//! - `StoreProvider` - structural validation and client construction for a store
//! - `SecretsClient` - the per-store client built from resolved credentials

use crate::crd::{SecretStoreCapabilities, StoreView};
use async_trait::async_trait;
use std::collections::BTreeMap;

pub mod auth;
mod error;
mod registry;
pub mod secrets_manager;
pub mod validator;

pub use error::{
    AuthError, ConfigError, ExchangeError, LookupError, ProviderError, ValidationError,
    ValidationResult,
};
pub use registry::{ProviderKind, ProviderRegistry};
pub use validator::StoreValidationError;

/// Reference to a value in the remote backend
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteRef {
    /// Secret name in the backend
    pub key: String,
    /// Specific version to read (latest when unset)
    pub version: Option<String>,
    /// Dotted JSON path into the secret payload
    pub property: Option<String>,
}

/// Destination of a push or delete
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PushRef {
    pub key: String,
    pub property: Option<String>,
}

/// Backend provider registered in the [`ProviderRegistry`]
#[async_trait]
pub trait StoreProvider: Send + Sync + std::fmt::Debug {
    /// Read/write support of the backend
    fn capabilities(&self) -> SecretStoreCapabilities;

    /// Structural validation, no network I/O
    fn validate_store(&self, store: &StoreView<'_>) -> Result<(), ProviderError>;

    /// Resolve credentials for the store and build a client
    ///
    /// `namespace` is the namespace of the request; cluster-scoped stores ignore it
    /// in favour of the namespaces on their references.
    async fn new_client(
        &self,
        store: &StoreView<'_>,
        namespace: &str,
    ) -> Result<Box<dyn SecretsClient>, ProviderError>;
}

/// Client bound to one store's resolved credentials
#[async_trait]
pub trait SecretsClient: Send + Sync {
    /// Get a single secret value
    async fn get_secret(&self, remote: &RemoteRef) -> Result<Vec<u8>, ProviderError>;

    /// Get a secret whose payload is a flat JSON object, as key/value pairs
    async fn get_secret_map(
        &self,
        remote: &RemoteRef,
    ) -> Result<BTreeMap<String, Vec<u8>>, ProviderError>;

    /// Find secrets by name or tags
    async fn get_all_secrets(&self) -> Result<BTreeMap<String, Vec<u8>>, ProviderError> {
        Err(ProviderError::Unimplemented("GetAllSecrets"))
    }

    /// Write a secret to the backend
    async fn push_secret(&self, _value: &[u8], _remote: &PushRef) -> Result<(), ProviderError> {
        Err(ProviderError::Unimplemented("PushSecret"))
    }

    /// Delete a secret from the backend
    async fn delete_secret(&self, _remote: &PushRef) -> Result<(), ProviderError> {
        Err(ProviderError::Unimplemented("DeleteSecret"))
    }

    /// Check the resolved credential actually works
    async fn validate(&self) -> Result<ValidationResult, ValidationError>;

    /// Release client resources
    async fn close(&self) -> Result<(), ProviderError> {
        Ok(())
    }
}
