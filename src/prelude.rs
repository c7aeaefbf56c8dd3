//! # Prelude
//!
//! Re-exports commonly used types and traits.
//!
//! ```rust
//! use secret_store_controller::prelude::*;
//! ```

// CRD types
pub use crate::crd::*;

// Provider seams
pub use crate::provider::auth::{CredentialResolver, ResolvedCredential};
pub use crate::provider::{
    ProviderError, ProviderKind, ProviderRegistry, SecretsClient, StoreProvider,
    ValidationResult,
};

// Reconciler types
pub use crate::controller::reconciler::{
    reconcile, EventPublisher, Reconciler, ReconcilerError, StatusWriter,
};

pub use crate::config::ControllerConfig;
