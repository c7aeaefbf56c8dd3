//! # Store Validator
//!
//! Structural validation followed by a live credential check.
//!
//! The structural step never touches the network, so a misconfigured store is
//! rejected before any credential reference is read.

use crate::crd::StoreView;
use crate::provider::{
    ProviderError, ProviderRegistry, StoreProvider, ValidationError, ValidationResult,
};
use std::sync::Arc;
use thiserror::Error;
use tracing::warn;

/// Why a store failed validation
#[derive(Debug, Error)]
pub enum StoreValidationError {
    /// The store declares a provider nothing is registered for
    #[error("no provider registered for {0}")]
    UnknownProvider(&'static str),
    /// Structural validation failed
    #[error(transparent)]
    Invalid(ProviderError),
    /// Credentials could not be resolved or the client could not be built
    #[error(transparent)]
    Client(ProviderError),
    /// A client was built but its credential does not work
    #[error(transparent)]
    Live(ValidationError),
}

impl StoreValidationError {
    /// Outcome to report for this failure
    ///
    /// Transport failures yield `Unknown` so callers retry instead of marking
    /// the store as failed.
    #[must_use]
    pub fn result(&self) -> ValidationResult {
        match self {
            StoreValidationError::Client(e) if e.is_transient() => ValidationResult::Unknown,
            StoreValidationError::Live(e) => e.result,
            _ => ValidationResult::Error,
        }
    }

    /// Whether the failure happened before a client was obtained
    #[must_use]
    pub fn is_construction_failure(&self) -> bool {
        !matches!(self, StoreValidationError::Live(_))
    }
}

/// Look up the provider for a store
pub fn provider_for(
    registry: &ProviderRegistry,
    store: &StoreView<'_>,
) -> Result<Arc<dyn StoreProvider>, StoreValidationError> {
    registry.get(store.provider).cloned().ok_or_else(|| {
        StoreValidationError::UnknownProvider(
            crate::provider::ProviderKind::of(store.provider).as_str(),
        )
    })
}

/// Structural validation only, usable without a live credential exchange
pub fn validate_structure(
    registry: &ProviderRegistry,
    store: &StoreView<'_>,
) -> Result<Arc<dyn StoreProvider>, StoreValidationError> {
    let provider = provider_for(registry, store)?;
    provider
        .validate_store(store)
        .map_err(StoreValidationError::Invalid)?;
    Ok(provider)
}

/// Resolve credentials and probe them
///
/// `namespace` is the ambient namespace handed to the credential resolver.
pub async fn validate_live(
    provider: &dyn StoreProvider,
    store: &StoreView<'_>,
    namespace: &str,
) -> Result<ValidationResult, StoreValidationError> {
    let client = provider
        .new_client(store, namespace)
        .await
        .map_err(StoreValidationError::Client)?;

    let result = client.validate().await;
    if let Err(e) = client.close().await {
        warn!(error = %e, "Failed to close provider client");
    }
    result.map_err(StoreValidationError::Live)
}

/// Structural check followed by the live check
pub async fn validate(
    registry: &ProviderRegistry,
    store: &StoreView<'_>,
    namespace: &str,
) -> Result<ValidationResult, StoreValidationError> {
    let provider = validate_structure(registry, store)?;
    validate_live(provider.as_ref(), store, namespace).await
}
