//! # Credential Resolver
//!
//! Selects the authentication strategy of a store and materializes a fresh
//! [`ResolvedCredential`] from it. Nothing is cached between calls.

use crate::constants::{
    AUDIENCE_ANNOTATION, DEFAULT_DURATION_SECONDS, PROVIDER_ID_ANNOTATION, ROLE_ARN_ANNOTATION,
    SESSION_NAME_PREFIX,
};
use crate::crd::{
    AuthMethod, SecretKeySelector, SecretsManagerProvider, ServiceAccountSelector, StaticKeyRef,
    StoreScope,
};
use crate::provider::auth::{
    AssumeRoleRequest, CredentialExchange, IdentityLookup, ResolvedCredential, SecretLookup,
    TokenIssuer, WebIdentityRequest,
};
use crate::provider::{AuthError, ConfigError};
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// Session name for a role exchange
///
/// Microsecond timestamps are enough to keep concurrent sessions apart.
#[must_use]
pub fn session_name() -> String {
    format!("{SESSION_NAME_PREFIX}{}", Utc::now().timestamp_micros())
}

/// Resolves store authentication into cloud credentials
#[derive(Clone)]
pub struct CredentialResolver {
    secrets: Arc<dyn SecretLookup>,
    identities: Arc<dyn IdentityLookup>,
    tokens: Arc<dyn TokenIssuer>,
    exchange: Arc<dyn CredentialExchange>,
}

impl std::fmt::Debug for CredentialResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialResolver").finish_non_exhaustive()
    }
}

impl CredentialResolver {
    #[must_use]
    pub fn new(
        secrets: Arc<dyn SecretLookup>,
        identities: Arc<dyn IdentityLookup>,
        tokens: Arc<dyn TokenIssuer>,
        exchange: Arc<dyn CredentialExchange>,
    ) -> Self {
        Self {
            secrets,
            identities,
            tokens,
            exchange,
        }
    }

    /// Resolve credentials for a store
    ///
    /// `namespace` is the ambient namespace used by namespaced stores. Cluster-wide
    /// stores must name a namespace on every reference instead.
    pub async fn resolve(
        &self,
        provider: &SecretsManagerProvider,
        scope: StoreScope,
        namespace: &str,
    ) -> Result<ResolvedCredential, AuthError> {
        let role = provider.role.as_deref().filter(|r| !r.is_empty());

        match provider.auth.method()? {
            AuthMethod::StaticKey(keys) => {
                let credential = self.static_key(keys, scope, namespace).await?;
                match role {
                    Some(role) => self.assume_role(&provider.region_id, role, &credential).await,
                    None => Ok(credential),
                }
            }
            AuthMethod::FederatedIdentity(identity) => {
                if role.is_some() {
                    return Err(ConfigError::ConflictingRoleAndIdentity.into());
                }
                self.federated(&provider.region_id, identity, scope, namespace)
                    .await
            }
        }
    }

    async fn static_key(
        &self,
        keys: &StaticKeyRef,
        scope: StoreScope,
        namespace: &str,
    ) -> Result<ResolvedCredential, AuthError> {
        let id = self
            .secret_value(
                "accessKeyIDSecretRef",
                &keys.access_key_id,
                scope,
                namespace,
            )
            .await?;
        let key = self
            .secret_value(
                "accessKeySecretSecretRef",
                &keys.access_key_secret,
                scope,
                namespace,
            )
            .await?;
        Ok(ResolvedCredential::static_key(id, key))
    }

    async fn secret_value(
        &self,
        selector_name: &'static str,
        selector: &SecretKeySelector,
        scope: StoreScope,
        namespace: &str,
    ) -> Result<String, AuthError> {
        let ns = reference_namespace(
            scope,
            namespace,
            selector.namespace.as_deref(),
            selector_name,
        )?;
        debug!(secret = %selector.name, namespace = %ns, key = %selector.key, "Reading credential reference");

        let mut data = self.secrets.get(ns, &selector.name).await?;
        let bytes = data
            .remove(&selector.key)
            .filter(|bytes| !bytes.is_empty())
            .ok_or_else(|| AuthError::MissingField {
                selector: selector_name,
                secret: selector.name.clone(),
                key: selector.key.clone(),
            })?;
        String::from_utf8(bytes).map_err(|err| {
            debug!(
                valid_up_to = err.utf8_error().valid_up_to(),
                "Credential reference is not UTF-8"
            );
            AuthError::InvalidEncoding {
                selector: selector_name,
                secret: selector.name.clone(),
                key: selector.key.clone(),
            }
        })
    }

    async fn assume_role(
        &self,
        region: &str,
        role: &str,
        source: &ResolvedCredential,
    ) -> Result<ResolvedCredential, AuthError> {
        let request = AssumeRoleRequest {
            region: region.to_string(),
            role_arn: role.to_string(),
            session_name: session_name(),
            duration_seconds: DEFAULT_DURATION_SECONDS,
        };
        debug!(role = %role, session = %request.session_name, "Assuming role with static key");
        self.exchange
            .assume_role(source, &request)
            .await
            .map_err(AuthError::AssumeRoleFailed)
    }

    async fn federated(
        &self,
        region: &str,
        identity: &ServiceAccountSelector,
        scope: StoreScope,
        namespace: &str,
    ) -> Result<ResolvedCredential, AuthError> {
        let ns = reference_namespace(
            scope,
            namespace,
            identity.namespace.as_deref(),
            "serviceAccountRef",
        )?;

        let annotations = self.identities.annotations(ns, &identity.name).await?;
        let provider_id = required_annotation(&annotations, PROVIDER_ID_ANNOTATION)?;
        let audience = required_annotation(&annotations, AUDIENCE_ANNOTATION)?;
        let role_arn = required_annotation(&annotations, ROLE_ARN_ANNOTATION)?;

        let token = self
            .tokens
            .issue_token(ns, &identity.name, &[audience.to_string()])
            .await
            .map_err(AuthError::TokenRequestFailed)?;

        let request = WebIdentityRequest {
            region: region.to_string(),
            provider_id: provider_id.to_string(),
            token,
            role_arn: role_arn.to_string(),
            session_name: session_name(),
            duration_seconds: DEFAULT_DURATION_SECONDS,
        };
        debug!(
            service_account = %identity.name,
            namespace = %ns,
            session = %request.session_name,
            "Exchanging service account token"
        );
        self.exchange
            .assume_role_with_web_identity(&request)
            .await
            .map_err(AuthError::FederationExchangeFailed)
    }
}

/// Namespace a credential reference resolves in
fn reference_namespace<'a>(
    scope: StoreScope,
    ambient: &'a str,
    reference: Option<&'a str>,
    selector_name: &'static str,
) -> Result<&'a str, ConfigError> {
    match scope {
        StoreScope::Namespaced => Ok(ambient),
        StoreScope::ClusterWide => reference
            .filter(|ns| !ns.is_empty())
            .ok_or(ConfigError::MissingNamespaceOverride(selector_name)),
    }
}

fn required_annotation<'a>(
    annotations: &'a BTreeMap<String, String>,
    name: &'static str,
) -> Result<&'a str, AuthError> {
    annotations
        .get(name)
        .map(String::as_str)
        .filter(|value| !value.is_empty())
        .ok_or(AuthError::MissingAnnotation(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_name_has_prefix_and_suffix() {
        let name = session_name();
        assert!(name.starts_with(SESSION_NAME_PREFIX));
        assert!(name.len() > SESSION_NAME_PREFIX.len());
    }

    #[test]
    fn test_namespaced_store_uses_ambient_namespace() {
        let ns = reference_namespace(StoreScope::Namespaced, "team-a", None, "serviceAccountRef");
        assert_eq!(ns, Ok("team-a"));
    }

    #[test]
    fn test_cluster_store_requires_override() {
        assert_eq!(
            reference_namespace(StoreScope::ClusterWide, "team-a", None, "serviceAccountRef"),
            Err(ConfigError::MissingNamespaceOverride("serviceAccountRef"))
        );
        assert_eq!(
            reference_namespace(StoreScope::ClusterWide, "", Some("infra"), "serviceAccountRef"),
            Ok("infra")
        );
    }

    #[test]
    fn test_missing_annotation_is_named() {
        let mut annotations = BTreeMap::new();
        annotations.insert(PROVIDER_ID_ANNOTATION.to_string(), "p1".to_string());
        annotations.insert(AUDIENCE_ANNOTATION.to_string(), String::new());

        assert_eq!(
            required_annotation(&annotations, PROVIDER_ID_ANNOTATION),
            Ok("p1")
        );
        assert_eq!(
            required_annotation(&annotations, AUDIENCE_ANNOTATION),
            Err(AuthError::MissingAnnotation(AUDIENCE_ANNOTATION))
        );
        assert_eq!(
            required_annotation(&annotations, ROLE_ARN_ANNOTATION),
            Err(AuthError::MissingAnnotation(ROLE_ARN_ANNOTATION))
        );
    }
}
