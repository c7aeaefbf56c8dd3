//! # Structural Validation
//!
//! Checks a secrets-manager store configuration without any network I/O.

use crate::crd::{
    AuthMethod, SecretKeySelector, SecretsManagerProvider, ServiceAccountSelector, StoreScope,
    StoreView,
};
use crate::provider::ConfigError;

/// Validate a store's provider section
///
/// Mutual exclusion is checked before any per-field rule so a conflicting
/// configuration is always reported as such.
pub fn validate_store(
    store: &StoreView<'_>,
    provider: &SecretsManagerProvider,
) -> Result<(), ConfigError> {
    if provider.region_id.trim().is_empty() {
        return Err(ConfigError::MissingRegion);
    }

    let has_role = provider.role.as_deref().is_some_and(|r| !r.is_empty());

    match provider.auth.method()? {
        AuthMethod::StaticKey(keys) => {
            validate_selector(
                store,
                &keys.access_key_id,
                "accessKeyIDSecretRef",
                "auth.secretRef.accessKeyIDSecretRef.name",
                "auth.secretRef.accessKeyIDSecretRef.key",
            )?;
            validate_selector(
                store,
                &keys.access_key_secret,
                "accessKeySecretSecretRef",
                "auth.secretRef.accessKeySecretSecretRef.name",
                "auth.secretRef.accessKeySecretSecretRef.key",
            )?;
        }
        AuthMethod::FederatedIdentity(identity) => {
            if has_role {
                return Err(ConfigError::ConflictingRoleAndIdentity);
            }
            validate_identity(store, identity)?;
        }
    }

    Ok(())
}

fn validate_selector(
    store: &StoreView<'_>,
    selector: &SecretKeySelector,
    selector_name: &'static str,
    name_field: &'static str,
    key_field: &'static str,
) -> Result<(), ConfigError> {
    if selector.name.is_empty() {
        return Err(ConfigError::MissingField(name_field));
    }
    if selector.key.is_empty() {
        return Err(ConfigError::MissingField(key_field));
    }
    validate_namespace(store, selector.namespace.as_deref(), selector_name)
}

fn validate_identity(
    store: &StoreView<'_>,
    identity: &ServiceAccountSelector,
) -> Result<(), ConfigError> {
    if identity.name.is_empty() {
        return Err(ConfigError::MissingField("auth.serviceAccountRef.name"));
    }
    validate_namespace(store, identity.namespace.as_deref(), "serviceAccountRef")
}

/// Cluster-wide stores must name a namespace, namespaced stores may only name their own
fn validate_namespace(
    store: &StoreView<'_>,
    reference: Option<&str>,
    selector_name: &'static str,
) -> Result<(), ConfigError> {
    let reference = reference.filter(|ns| !ns.is_empty());
    match store.scope {
        StoreScope::ClusterWide if reference.is_none() => {
            Err(ConfigError::MissingNamespaceOverride(selector_name))
        }
        StoreScope::Namespaced => match reference {
            Some(ns) if Some(ns) != store.namespace => {
                Err(ConfigError::NamespaceOverrideNotAllowed(selector_name))
            }
            _ => Ok(()),
        },
        StoreScope::ClusterWide => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crd::{AuthSpec, ProviderConfig, StaticKeyRef};

    fn selector(name: &str, namespace: Option<&str>) -> SecretKeySelector {
        SecretKeySelector {
            name: name.to_string(),
            key: "k1".to_string(),
            namespace: namespace.map(str::to_string),
        }
    }

    fn static_provider(namespace: Option<&str>) -> SecretsManagerProvider {
        SecretsManagerProvider {
            region_id: "ap-guangzhou".to_string(),
            role: None,
            auth: AuthSpec {
                secret_ref: Some(StaticKeyRef {
                    access_key_id: selector("sec-id", namespace),
                    access_key_secret: selector("sec-key", namespace),
                }),
                service_account_ref: None,
            },
        }
    }

    fn federated_provider(role: Option<&str>) -> SecretsManagerProvider {
        SecretsManagerProvider {
            region_id: "ap-guangzhou".to_string(),
            role: role.map(str::to_string),
            auth: AuthSpec {
                secret_ref: None,
                service_account_ref: Some(ServiceAccountSelector {
                    name: "workload".to_string(),
                    namespace: None,
                }),
            },
        }
    }

    fn view<'a>(scope: StoreScope, config: &'a ProviderConfig) -> StoreView<'a> {
        StoreView {
            scope,
            name: "store",
            namespace: match scope {
                StoreScope::Namespaced => Some("team-a"),
                StoreScope::ClusterWide => None,
            },
            controller: "",
            refresh_interval: 0,
            provider: config,
        }
    }

    fn check(scope: StoreScope, provider: SecretsManagerProvider) -> Result<(), ConfigError> {
        let config = ProviderConfig::SecretsManager(provider.clone());
        validate_store(&view(scope, &config), &provider)
    }

    #[test]
    fn test_valid_namespaced_static_key() {
        assert_eq!(check(StoreScope::Namespaced, static_provider(None)), Ok(()));
    }

    #[test]
    fn test_missing_region() {
        let mut provider = static_provider(None);
        provider.region_id = String::new();
        assert_eq!(
            check(StoreScope::Namespaced, provider),
            Err(ConfigError::MissingRegion)
        );
    }

    #[test]
    fn test_conflicting_methods_reported_before_field_checks() {
        let mut provider = static_provider(None);
        provider.auth.service_account_ref = Some(ServiceAccountSelector::default());
        provider.auth.secret_ref = Some(StaticKeyRef::default());
        assert_eq!(
            check(StoreScope::Namespaced, provider),
            Err(ConfigError::ConflictingAuthMethods)
        );
    }

    #[test]
    fn test_no_auth_method() {
        let mut provider = static_provider(None);
        provider.auth = AuthSpec::default();
        assert_eq!(
            check(StoreScope::Namespaced, provider),
            Err(ConfigError::NoAuthMethodConfigured)
        );
    }

    #[test]
    fn test_role_with_identity_conflicts() {
        assert_eq!(
            check(StoreScope::Namespaced, federated_provider(Some("arn"))),
            Err(ConfigError::ConflictingRoleAndIdentity)
        );
        assert_eq!(
            check(StoreScope::Namespaced, federated_provider(Some(""))),
            Ok(())
        );
    }

    #[test]
    fn test_missing_selector_key() {
        let mut provider = static_provider(None);
        if let Some(keys) = provider.auth.secret_ref.as_mut() {
            keys.access_key_secret.key = String::new();
        }
        assert_eq!(
            check(StoreScope::Namespaced, provider),
            Err(ConfigError::MissingField(
                "auth.secretRef.accessKeySecretSecretRef.key"
            ))
        );
    }

    #[test]
    fn test_missing_identity_name() {
        let mut provider = federated_provider(None);
        provider.auth.service_account_ref = Some(ServiceAccountSelector::default());
        assert_eq!(
            check(StoreScope::Namespaced, provider),
            Err(ConfigError::MissingField("auth.serviceAccountRef.name"))
        );
    }

    #[test]
    fn test_cluster_store_requires_namespaces() {
        assert_eq!(
            check(StoreScope::ClusterWide, static_provider(None)),
            Err(ConfigError::MissingNamespaceOverride("accessKeyIDSecretRef"))
        );
        assert_eq!(
            check(StoreScope::ClusterWide, federated_provider(None)),
            Err(ConfigError::MissingNamespaceOverride("serviceAccountRef"))
        );
        assert_eq!(
            check(StoreScope::ClusterWide, static_provider(Some("infra"))),
            Ok(())
        );
    }

    #[test]
    fn test_namespaced_store_cannot_reach_other_namespace() {
        assert_eq!(
            check(StoreScope::Namespaced, static_provider(Some("infra"))),
            Err(ConfigError::NamespaceOverrideNotAllowed(
                "accessKeyIDSecretRef"
            ))
        );
        assert_eq!(
            check(StoreScope::Namespaced, static_provider(Some("team-a"))),
            Ok(())
        );
    }
}
