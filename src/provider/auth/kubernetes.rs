//! # Kubernetes Collaborators
//!
//! Production implementations of the secret, identity and token lookups backed
//! by the Kubernetes API.

use crate::provider::auth::{IdentityLookup, SecretLookup, TokenIssuer};
use crate::provider::LookupError;
use async_trait::async_trait;
use k8s_openapi::api::authentication::v1::{TokenRequest, TokenRequestSpec};
use k8s_openapi::api::core::v1::{Secret, ServiceAccount};
use kube::{Api, Client};
use std::collections::BTreeMap;
use tracing::debug;

fn lookup_error(kind: &'static str, namespace: &str, name: &str, err: kube::Error) -> LookupError {
    match err {
        kube::Error::Api(api_err) if api_err.code == 404 => LookupError::NotFound {
            kind,
            namespace: namespace.to_string(),
            name: name.to_string(),
        },
        other => LookupError::Transport {
            kind,
            namespace: namespace.to_string(),
            name: name.to_string(),
            message: other.to_string(),
        },
    }
}

/// Reads `Secret` data through the API server
#[derive(Clone)]
pub struct KubeSecretLookup {
    client: Client,
}

impl KubeSecretLookup {
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SecretLookup for KubeSecretLookup {
    async fn get(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<BTreeMap<String, Vec<u8>>, LookupError> {
        let api: Api<Secret> = Api::namespaced(self.client.clone(), namespace);
        let secret = api
            .get(name)
            .await
            .map_err(|e| lookup_error("Secret", namespace, name, e))?;

        Ok(secret
            .data
            .unwrap_or_default()
            .into_iter()
            .map(|(key, value)| (key, value.0))
            .collect())
    }
}

/// Reads `ServiceAccount` annotations through the API server
#[derive(Clone)]
pub struct KubeIdentityLookup {
    client: Client,
}

impl KubeIdentityLookup {
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl IdentityLookup for KubeIdentityLookup {
    async fn annotations(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<BTreeMap<String, String>, LookupError> {
        let api: Api<ServiceAccount> = Api::namespaced(self.client.clone(), namespace);
        let sa = api
            .get(name)
            .await
            .map_err(|e| lookup_error("ServiceAccount", namespace, name, e))?;
        Ok(sa.metadata.annotations.unwrap_or_default())
    }
}

/// Issues bound tokens with the `TokenRequest` API
#[derive(Clone)]
pub struct KubeTokenIssuer {
    client: Client,
}

impl KubeTokenIssuer {
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl TokenIssuer for KubeTokenIssuer {
    async fn issue_token(
        &self,
        namespace: &str,
        service_account: &str,
        audiences: &[String],
    ) -> Result<String, LookupError> {
        debug!(namespace = %namespace, service_account = %service_account, "Requesting service account token");
        let api: Api<ServiceAccount> = Api::namespaced(self.client.clone(), namespace);
        let request = TokenRequest {
            metadata: Default::default(),
            spec: TokenRequestSpec {
                audiences: audiences.to_vec(),
                expiration_seconds: None,
                bound_object_ref: None,
            },
            status: None,
        };

        let response = api
            .create_token_request(service_account, &Default::default(), &request)
            .await
            .map_err(|e| lookup_error("ServiceAccount", namespace, service_account, e))?;

        // A response without a token is a definite answer from the server
        response
            .status
            .map(|status| status.token)
            .filter(|token| !token.is_empty())
            .ok_or_else(|| LookupError::NotFound {
                kind: "TokenRequest",
                namespace: namespace.to_string(),
                name: service_account.to_string(),
            })
    }
}
