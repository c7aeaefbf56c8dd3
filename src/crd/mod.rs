//! # Custom Resource Definitions
//!
//! CRD types for the Secret Store Controller.
//!
//! ## Module Structure
//!
//! - `spec.rs` - `SecretStore` and `ClusterSecretStore` resources
//! - `provider.rs` - Provider configuration and credential references
//! - `status.rs` - Status types written back by the reconciler
//! - `store.rs` - Common view over both store kinds

mod provider;
mod spec;
mod status;
mod store;

pub use provider::{
    AuthMethod, AuthSpec, ProviderConfig, SecretKeySelector, SecretsManagerProvider,
    ServiceAccountSelector, StaticKeyRef,
};
pub use spec::{ClusterSecretStore, ClusterSecretStoreSpec, SecretStore, SecretStoreSpec};
pub use status::{
    Condition, ConditionStatus, SecretStoreCapabilities, SecretStoreStatus, CONDITION_READY,
};
pub use store::{GenericStore, StoreKey, StoreScope, StoreView};
