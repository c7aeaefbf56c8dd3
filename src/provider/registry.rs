//! # Provider Registry
//!
//! Explicit table from provider kind to provider implementation. Built once at
//! startup and handed to the reconciler.

use crate::crd::ProviderConfig;
use crate::provider::StoreProvider;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Provider kinds a store can declare
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    SecretsManager,
}

impl ProviderKind {
    #[must_use]
    pub fn of(config: &ProviderConfig) -> Self {
        match config {
            ProviderConfig::SecretsManager(_) => ProviderKind::SecretsManager,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::SecretsManager => "secretsManager",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default)]
pub struct ProviderRegistry {
    providers: HashMap<ProviderKind, Arc<dyn StoreProvider>>,
}

impl ProviderRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a provider, replacing any previous entry for the kind
    #[must_use]
    pub fn with(mut self, kind: ProviderKind, provider: Arc<dyn StoreProvider>) -> Self {
        self.providers.insert(kind, provider);
        self
    }

    /// Look up the provider responsible for a store's provider config
    pub fn get(&self, config: &ProviderConfig) -> Option<&Arc<dyn StoreProvider>> {
        self.providers.get(&ProviderKind::of(config))
    }
}
