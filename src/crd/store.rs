//! # Generic Store
//!
//! Common view over `SecretStore` and `ClusterSecretStore` so the reconciler
//! and providers handle both kinds with one code path.

use crate::crd::{ClusterSecretStore, ProviderConfig, SecretStore, SecretStoreStatus};
use k8s_openapi::api::core::v1::ObjectReference;
use kube::{Resource, ResourceExt};
use std::fmt;

/// Where a store lives and therefore how credential references are scoped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreScope {
    /// `SecretStore`: references resolve in the store's own namespace
    Namespaced,
    /// `ClusterSecretStore`: every reference carries its own namespace
    ClusterWide,
}

impl StoreScope {
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            StoreScope::Namespaced => "SecretStore",
            StoreScope::ClusterWide => "ClusterSecretStore",
        }
    }
}

/// Identity of a store object, used for status writes, metrics and backoff state
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StoreKey {
    pub scope: StoreScope,
    pub name: String,
    pub namespace: Option<String>,
}

impl fmt::Display for StoreKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(ns) => write!(f, "{}/{}/{}", self.scope.kind(), ns, self.name),
            None => write!(f, "{}/{}", self.scope.kind(), self.name),
        }
    }
}

/// Borrowed view of the fields shared by both store kinds
#[derive(Debug, Clone, Copy)]
pub struct StoreView<'a> {
    pub scope: StoreScope,
    pub name: &'a str,
    pub namespace: Option<&'a str>,
    pub controller: &'a str,
    pub refresh_interval: i64,
    pub provider: &'a ProviderConfig,
}

/// Behaviour shared by `SecretStore` and `ClusterSecretStore`
pub trait GenericStore:
    Resource<DynamicType = ()> + Clone + fmt::Debug + Send + Sync + 'static
{
    const SCOPE: StoreScope;

    fn controller_class(&self) -> &str;
    fn refresh_interval(&self) -> i64;
    fn provider(&self) -> &ProviderConfig;
    fn store_status(&self) -> Option<&SecretStoreStatus>;

    fn view(&self) -> StoreView<'_> {
        StoreView {
            scope: Self::SCOPE,
            name: self.meta().name.as_deref().unwrap_or("unknown"),
            namespace: self.meta().namespace.as_deref(),
            controller: self.controller_class(),
            refresh_interval: self.refresh_interval(),
            provider: self.provider(),
        }
    }

    fn store_key(&self) -> StoreKey {
        StoreKey {
            scope: Self::SCOPE,
            name: self.name_any(),
            namespace: self.namespace(),
        }
    }

    fn object_reference(&self) -> ObjectReference {
        self.object_ref(&())
    }
}

impl GenericStore for SecretStore {
    const SCOPE: StoreScope = StoreScope::Namespaced;

    fn controller_class(&self) -> &str {
        &self.spec.controller
    }

    fn refresh_interval(&self) -> i64 {
        self.spec.refresh_interval
    }

    fn provider(&self) -> &ProviderConfig {
        &self.spec.provider
    }

    fn store_status(&self) -> Option<&SecretStoreStatus> {
        self.status.as_ref()
    }
}

impl GenericStore for ClusterSecretStore {
    const SCOPE: StoreScope = StoreScope::ClusterWide;

    fn controller_class(&self) -> &str {
        &self.spec.controller
    }

    fn refresh_interval(&self) -> i64 {
        self.spec.refresh_interval
    }

    fn provider(&self) -> &ProviderConfig {
        &self.spec.provider
    }

    fn store_status(&self) -> Option<&SecretStoreStatus> {
        self.status.as_ref()
    }
}
