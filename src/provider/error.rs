//! # Provider Errors
//!
//! Error taxonomy for store validation, credential resolution and backend calls.

use thiserror::Error;

/// Structural configuration errors
///
/// Raised without any network I/O and never retried.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing region: provider.regionID is required")]
    MissingRegion,
    #[error("no authentication method configured: set auth.secretRef or auth.serviceAccountRef")]
    NoAuthMethodConfigured,
    #[error("conflicting authentication methods: auth.secretRef and auth.serviceAccountRef are mutually exclusive")]
    ConflictingAuthMethods,
    #[error("role can only be used with auth.secretRef, not with auth.serviceAccountRef")]
    ConflictingRoleAndIdentity,
    #[error("missing required field {0}")]
    MissingField(&'static str),
    #[error("invalid ClusterSecretStore: {0} must set a namespace")]
    MissingNamespaceOverride(&'static str),
    #[error("invalid SecretStore: {0} cannot reference another namespace")]
    NamespaceOverrideNotAllowed(&'static str),
}

/// Failure looking up a Kubernetes object referenced by the store
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LookupError {
    #[error("{kind} {namespace}/{name} not found")]
    NotFound {
        kind: &'static str,
        namespace: String,
        name: String,
    },
    #[error("could not reach API server fetching {kind} {namespace}/{name}: {message}")]
    Transport {
        kind: &'static str,
        namespace: String,
        name: String,
        message: String,
    },
}

impl LookupError {
    /// Whether the backend could not be reached (as opposed to a definite answer)
    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(self, LookupError::Transport { .. })
    }
}

/// Failure calling the credential exchange / identity endpoint
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ExchangeError {
    /// The service answered and refused the request
    #[error("request rejected: {0}")]
    Rejected(String),
    /// The service could not be reached or did not answer in time
    #[error("endpoint unreachable: {0}")]
    Transport(String),
}

impl ExchangeError {
    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(self, ExchangeError::Transport(_))
    }
}

/// Credential resolution errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("could not fetch credential reference: {0}")]
    Lookup(#[from] LookupError),
    #[error("missing {selector}: key {key:?} in secret {secret} is absent or empty")]
    MissingField {
        selector: &'static str,
        secret: String,
        key: String,
    },
    #[error("invalid {selector}: key {key:?} in secret {secret} is not valid UTF-8")]
    InvalidEncoding {
        selector: &'static str,
        secret: String,
        key: String,
    },
    #[error("service account is missing annotation {0}")]
    MissingAnnotation(&'static str),
    #[error("service account token request failed: {0}")]
    TokenRequestFailed(#[source] LookupError),
    #[error("assume role failed: {0}")]
    AssumeRoleFailed(#[source] ExchangeError),
    #[error("federated identity exchange failed: {0}")]
    FederationExchangeFailed(#[source] ExchangeError),
}

impl AuthError {
    /// Whether resolution failed only because a backend was unreachable
    ///
    /// Transient failures must not flip a store to a hard failure.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            AuthError::Lookup(e) | AuthError::TokenRequestFailed(e) => e.is_transport(),
            AuthError::AssumeRoleFailed(e) | AuthError::FederationExchangeFailed(e) => {
                e.is_transport()
            }
            _ => false,
        }
    }
}

/// Errors surfaced by providers and their clients
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to create credentials: {0}")]
    Auth(#[from] AuthError),
    #[error("{0} not implemented")]
    Unimplemented(&'static str),
    #[error("credential probe failed: {0}")]
    Probe(#[source] ExchangeError),
    #[error("failed to get secret {key}: {source}")]
    Backend {
        key: String,
        #[source]
        source: ExchangeError,
    },
    #[error("invalid secret received: no secret string nor binary for key {0}")]
    EmptySecret(String),
    #[error("key {property} does not exist in secret {key}")]
    PropertyNotFound { property: String, key: String },
    #[error("unable to decode secret {key}: {source}")]
    Decode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

impl ProviderError {
    /// Whether the failure is transport-level rather than a definite rejection
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            ProviderError::Auth(e) => e.is_transient(),
            ProviderError::Probe(e) | ProviderError::Backend { source: e, .. } => {
                e.is_transport()
            }
            _ => false,
        }
    }
}

/// Outcome of a live validation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationResult {
    /// The credential works
    Ready,
    /// The credential was obtained but does not work
    Error,
    /// No conclusion could be reached (backend unreachable)
    Unknown,
}

impl ValidationResult {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationResult::Ready => "ready",
            ValidationResult::Error => "error",
            ValidationResult::Unknown => "unknown",
        }
    }
}

/// Failed live validation, carrying both the result class and the cause
#[derive(Debug, Error)]
#[error("failed to validate credentials: {source}")]
pub struct ValidationError {
    pub result: ValidationResult,
    #[source]
    pub source: ProviderError,
}
