//! # Credential Resolution
//!
//! Turns a store's authentication section into a [`ResolvedCredential`].
//!
//! Two strategies are supported:
//! - Static keys: an access key pair read from Kubernetes secrets, optionally
//!   exchanged for role credentials
//! - Federated identity: a bound service account token exchanged for temporary
//!   credentials through the identity-federation endpoint
//!
//! Every external call goes through one of the collaborator traits below so the
//! resolver can be exercised without a cluster or a cloud account.

use crate::provider::{ExchangeError, LookupError};
use async_trait::async_trait;
use std::collections::BTreeMap;

mod credential;
pub mod kubernetes;
mod resolver;
pub mod sts;

pub use credential::{Expiry, ResolvedCredential};
pub use resolver::{session_name, CredentialResolver};

/// Reads key material from namespaced Kubernetes secrets
#[async_trait]
pub trait SecretLookup: Send + Sync {
    async fn get(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<BTreeMap<String, Vec<u8>>, LookupError>;
}

/// Reads the annotations of a service account
#[async_trait]
pub trait IdentityLookup: Send + Sync {
    async fn annotations(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<BTreeMap<String, String>, LookupError>;
}

/// Issues bound service account tokens
#[async_trait]
pub trait TokenIssuer: Send + Sync {
    async fn issue_token(
        &self,
        namespace: &str,
        service_account: &str,
        audiences: &[String],
    ) -> Result<String, LookupError>;
}

/// Role assumption with a static key pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssumeRoleRequest {
    pub region: String,
    pub role_arn: String,
    pub session_name: String,
    pub duration_seconds: i32,
}

/// Exchange of a web identity token for temporary credentials
#[derive(Clone, PartialEq, Eq)]
pub struct WebIdentityRequest {
    pub region: String,
    pub provider_id: String,
    pub token: String,
    pub role_arn: String,
    pub session_name: String,
    pub duration_seconds: i32,
}

impl std::fmt::Debug for WebIdentityRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebIdentityRequest")
            .field("region", &self.region)
            .field("provider_id", &self.provider_id)
            .field("token", &"***")
            .field("role_arn", &self.role_arn)
            .field("session_name", &self.session_name)
            .field("duration_seconds", &self.duration_seconds)
            .finish()
    }
}

/// Cloud credential exchange endpoint
#[async_trait]
pub trait CredentialExchange: Send + Sync {
    /// Exchange a static key pair for role credentials
    async fn assume_role(
        &self,
        source: &ResolvedCredential,
        request: &AssumeRoleRequest,
    ) -> Result<ResolvedCredential, ExchangeError>;

    /// Exchange a web identity token for temporary credentials
    async fn assume_role_with_web_identity(
        &self,
        request: &WebIdentityRequest,
    ) -> Result<ResolvedCredential, ExchangeError>;
}

/// Cheap check that a resolved credential is usable
#[async_trait]
pub trait LivenessProbe: Send + Sync {
    async fn probe(&self, region: &str, credential: &ResolvedCredential)
        -> Result<(), ExchangeError>;
}
