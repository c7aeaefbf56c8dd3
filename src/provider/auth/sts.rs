//! # Security Token Service
//!
//! Credential exchange and liveness probe backed by `aws-sdk-sts`.
//!
//! - `AssumeRole` exchanges a static key pair for role credentials
//! - `AssumeRoleWithWebIdentity` exchanges a service account token
//! - `GetCallerIdentity` is the liveness probe

use crate::constants::CONTROLLER_NAME;
use crate::provider::auth::{
    AssumeRoleRequest, CredentialExchange, Expiry, LivenessProbe, ResolvedCredential,
    WebIdentityRequest,
};
use crate::provider::ExchangeError;
use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region, SdkConfig};
use aws_credential_types::Credentials;
use aws_sdk_sts::error::{DisplayErrorContext, SdkError};
use std::time::SystemTime;
use tracing::debug;

/// Build an SDK config for one region, optionally signed with a resolved credential
///
/// No ambient credential chain is consulted: requests are either signed with
/// `credential` or sent unsigned.
pub async fn sdk_config(
    region: &str,
    endpoint_url: Option<&str>,
    credential: Option<&ResolvedCredential>,
) -> SdkConfig {
    let mut builder =
        aws_config::defaults(BehaviorVersion::latest()).region(Region::new(region.to_string()));

    builder = match credential {
        Some(credential) => builder.credentials_provider(sdk_credentials(credential)),
        None => builder.no_credentials(),
    };

    if let Some(endpoint) = endpoint_url {
        builder = builder.endpoint_url(endpoint);
    }

    builder.load().await
}

fn sdk_credentials(credential: &ResolvedCredential) -> Credentials {
    let expires_after = match credential.expiry() {
        Expiry::Never => None,
        Expiry::At(at) => Some(SystemTime::from(at)),
    };
    Credentials::new(
        credential.secret_id(),
        credential.secret_key(),
        credential.token().map(str::to_string),
        expires_after,
        CONTROLLER_NAME,
    )
}

/// Dispatch and timeout failures never reached the service
pub(crate) fn classify<E, R>(err: SdkError<E, R>) -> ExchangeError
where
    E: std::error::Error + Send + Sync + 'static,
    R: std::fmt::Debug,
{
    let message = DisplayErrorContext(&err).to_string();
    match err {
        SdkError::DispatchFailure(_) | SdkError::TimeoutError(_) => {
            ExchangeError::Transport(message)
        }
        _ => ExchangeError::Rejected(message),
    }
}

fn temporary_credential(
    credentials: Option<&aws_sdk_sts::types::Credentials>,
) -> Result<ResolvedCredential, ExchangeError> {
    let credentials = credentials
        .ok_or_else(|| ExchangeError::Rejected("response carried no credentials".to_string()))?;
    let expiration = credentials.expiration();
    let expires_at =
        chrono::DateTime::from_timestamp(expiration.secs(), expiration.subsec_nanos())
            .ok_or_else(|| {
                ExchangeError::Rejected(format!("invalid credential expiration {expiration:?}"))
            })?;
    Ok(ResolvedCredential::temporary(
        credentials.access_key_id(),
        credentials.secret_access_key(),
        credentials.session_token(),
        expires_at,
    ))
}

/// STS client factory configured with an optional endpoint override
#[derive(Debug, Clone, Default)]
pub struct StsExchange {
    endpoint_url: Option<String>,
}

impl StsExchange {
    #[must_use]
    pub fn new(endpoint_url: Option<String>) -> Self {
        Self { endpoint_url }
    }

    async fn client(
        &self,
        region: &str,
        credential: Option<&ResolvedCredential>,
    ) -> aws_sdk_sts::Client {
        let config = sdk_config(region, self.endpoint_url.as_deref(), credential).await;
        aws_sdk_sts::Client::new(&config)
    }
}

#[async_trait]
impl CredentialExchange for StsExchange {
    async fn assume_role(
        &self,
        source: &ResolvedCredential,
        request: &AssumeRoleRequest,
    ) -> Result<ResolvedCredential, ExchangeError> {
        let client = self.client(&request.region, Some(source)).await;
        let output = client
            .assume_role()
            .role_arn(&request.role_arn)
            .role_session_name(&request.session_name)
            .duration_seconds(request.duration_seconds)
            .send()
            .await
            .map_err(classify)?;
        temporary_credential(output.credentials())
    }

    async fn assume_role_with_web_identity(
        &self,
        request: &WebIdentityRequest,
    ) -> Result<ResolvedCredential, ExchangeError> {
        let client = self.client(&request.region, None).await;
        let output = client
            .assume_role_with_web_identity()
            .provider_id(&request.provider_id)
            .web_identity_token(&request.token)
            .role_arn(&request.role_arn)
            .role_session_name(&request.session_name)
            .duration_seconds(request.duration_seconds)
            .send()
            .await
            .map_err(classify)?;
        temporary_credential(output.credentials())
    }
}

#[async_trait]
impl LivenessProbe for StsExchange {
    async fn probe(
        &self,
        region: &str,
        credential: &ResolvedCredential,
    ) -> Result<(), ExchangeError> {
        let client = self.client(region, Some(credential)).await;
        let output = client
            .get_caller_identity()
            .send()
            .await
            .map_err(classify)?;

        match output.arn().filter(|arn| !arn.is_empty()) {
            Some(arn) => {
                debug!(caller = %arn, "Credential probe succeeded");
                Ok(())
            }
            None => Err(ExchangeError::Rejected(
                "caller identity is empty".to_string(),
            )),
        }
    }
}
