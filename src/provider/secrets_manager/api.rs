//! # Secret Value API
//!
//! Raw read call against the secrets manager backend.

use crate::provider::auth::{sts, ResolvedCredential};
use crate::provider::ExchangeError;
use async_trait::async_trait;

/// Payload of one secret version
#[derive(Clone, Default, PartialEq, Eq)]
pub struct SecretValue {
    pub string: Option<String>,
    pub binary: Option<Vec<u8>>,
}

impl std::fmt::Debug for SecretValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretValue")
            .field("string", &self.string.as_ref().map(|_| "***"))
            .field("binary", &self.binary.as_ref().map(Vec::len))
            .finish()
    }
}

#[async_trait]
pub trait SecretValueApi: Send + Sync {
    /// Fetch a secret by name, optionally pinned to a version
    async fn get_secret_value(
        &self,
        region: &str,
        credential: &ResolvedCredential,
        key: &str,
        version: Option<&str>,
    ) -> Result<SecretValue, ExchangeError>;
}

/// `GetSecretValue` through `aws-sdk-secretsmanager`
#[derive(Debug, Clone, Default)]
pub struct AwsSecretValueApi {
    endpoint_url: Option<String>,
}

impl AwsSecretValueApi {
    #[must_use]
    pub fn new(endpoint_url: Option<String>) -> Self {
        Self { endpoint_url }
    }
}

#[async_trait]
impl SecretValueApi for AwsSecretValueApi {
    async fn get_secret_value(
        &self,
        region: &str,
        credential: &ResolvedCredential,
        key: &str,
        version: Option<&str>,
    ) -> Result<SecretValue, ExchangeError> {
        let config = sts::sdk_config(region, self.endpoint_url.as_deref(), Some(credential)).await;
        let client = aws_sdk_secretsmanager::Client::new(&config);

        let output = client
            .get_secret_value()
            .secret_id(key)
            .set_version_id(version.map(str::to_string))
            .send()
            .await
            .map_err(sts::classify)?;

        Ok(SecretValue {
            string: output.secret_string().map(str::to_string),
            binary: output.secret_binary().map(|blob| blob.as_ref().to_vec()),
        })
    }
}
