//! Common test utilities
//!
//! In-memory stand-ins for the Kubernetes API, the credential exchange and the
//! secrets backend, plus builders for stores and a fully wired reconciler.

#![allow(dead_code, reason = "not every test binary uses every helper")]

use async_trait::async_trait;
use k8s_openapi::api::core::v1::ObjectReference;
use kube::runtime::events::EventType;
use secret_store_controller::config::ControllerConfig;
use secret_store_controller::constants::{
    AUDIENCE_ANNOTATION, PROVIDER_ID_ANNOTATION, ROLE_ARN_ANNOTATION,
};
use secret_store_controller::controller::reconciler::{
    EventPublisher, Reconciler, StatusWriteError, StatusWriter,
};
use secret_store_controller::crd::{
    AuthSpec, ClusterSecretStore, ClusterSecretStoreSpec, ProviderConfig, SecretKeySelector,
    SecretStore, SecretStoreSpec, SecretStoreStatus, SecretsManagerProvider,
    ServiceAccountSelector, StaticKeyRef, StoreKey,
};
use secret_store_controller::provider::auth::{
    AssumeRoleRequest, CredentialExchange, CredentialResolver, IdentityLookup, LivenessProbe,
    ResolvedCredential, SecretLookup, TokenIssuer, WebIdentityRequest,
};
use secret_store_controller::provider::secrets_manager::{
    SecretValue, SecretValueApi, SecretsManager,
};
use secret_store_controller::provider::{
    ExchangeError, LookupError, ProviderKind, ProviderRegistry,
};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

pub const REGION: &str = "ap-guangzhou";
pub const ISSUED_TOKEN: &str = "tok-xyz";

/// Kubernetes API stand-in: secrets, service accounts and token requests
#[derive(Default)]
pub struct FakeCluster {
    secrets: BTreeMap<(String, String), BTreeMap<String, Vec<u8>>>,
    service_accounts: BTreeMap<(String, String), BTreeMap<String, String>>,
    pub secret_reads: Mutex<Vec<(String, String)>>,
    pub identity_reads: Mutex<Vec<(String, String)>>,
    pub token_requests: Mutex<Vec<(String, String, Vec<String>)>>,
    forbid_io: bool,
    unreachable: bool,
}

impl FakeCluster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Any lookup panics; for paths that must reject before touching the cluster
    pub fn forbidding_io() -> Self {
        Self {
            forbid_io: true,
            ..Self::default()
        }
    }

    /// Every lookup fails with a transport error
    pub fn unreachable() -> Self {
        Self {
            unreachable: true,
            ..Self::default()
        }
    }

    pub fn with_secret(mut self, namespace: &str, name: &str, data: &[(&str, &str)]) -> Self {
        self.secrets.insert(
            (namespace.to_string(), name.to_string()),
            data.iter()
                .map(|(k, v)| (k.to_string(), v.as_bytes().to_vec()))
                .collect(),
        );
        self
    }

    pub fn with_secret_bytes(
        mut self,
        namespace: &str,
        name: &str,
        data: &[(&str, &[u8])],
    ) -> Self {
        self.secrets.insert(
            (namespace.to_string(), name.to_string()),
            data.iter()
                .map(|(k, v)| (k.to_string(), v.to_vec()))
                .collect(),
        );
        self
    }

    pub fn with_service_account(
        mut self,
        namespace: &str,
        name: &str,
        annotations: &[(&str, &str)],
    ) -> Self {
        self.service_accounts.insert(
            (namespace.to_string(), name.to_string()),
            annotations
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        );
        self
    }

    /// Service account carrying all three federation annotations
    pub fn with_federated_identity(self, namespace: &str, name: &str) -> Self {
        self.with_service_account(
            namespace,
            name,
            &[
                (PROVIDER_ID_ANNOTATION, "oidc-provider-1"),
                (AUDIENCE_ANNOTATION, "sts.example.com"),
                (ROLE_ARN_ANNOTATION, "qcs::cam::uin/100:roleName/reader"),
            ],
        )
    }

    pub fn io_count(&self) -> usize {
        self.secret_reads.lock().unwrap().len()
            + self.identity_reads.lock().unwrap().len()
            + self.token_requests.lock().unwrap().len()
    }

    fn transport(kind: &'static str, namespace: &str, name: &str) -> LookupError {
        LookupError::Transport {
            kind,
            namespace: namespace.to_string(),
            name: name.to_string(),
            message: "connection refused".to_string(),
        }
    }

    fn not_found(kind: &'static str, namespace: &str, name: &str) -> LookupError {
        LookupError::NotFound {
            kind,
            namespace: namespace.to_string(),
            name: name.to_string(),
        }
    }
}

#[async_trait]
impl SecretLookup for FakeCluster {
    async fn get(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<BTreeMap<String, Vec<u8>>, LookupError> {
        assert!(!self.forbid_io, "unexpected secret lookup {namespace}/{name}");
        self.secret_reads
            .lock()
            .unwrap()
            .push((namespace.to_string(), name.to_string()));
        if self.unreachable {
            return Err(Self::transport("Secret", namespace, name));
        }
        self.secrets
            .get(&(namespace.to_string(), name.to_string()))
            .cloned()
            .ok_or_else(|| Self::not_found("Secret", namespace, name))
    }
}

#[async_trait]
impl IdentityLookup for FakeCluster {
    async fn annotations(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<BTreeMap<String, String>, LookupError> {
        assert!(
            !self.forbid_io,
            "unexpected service account lookup {namespace}/{name}"
        );
        self.identity_reads
            .lock()
            .unwrap()
            .push((namespace.to_string(), name.to_string()));
        if self.unreachable {
            return Err(Self::transport("ServiceAccount", namespace, name));
        }
        self.service_accounts
            .get(&(namespace.to_string(), name.to_string()))
            .cloned()
            .ok_or_else(|| Self::not_found("ServiceAccount", namespace, name))
    }
}

#[async_trait]
impl TokenIssuer for FakeCluster {
    async fn issue_token(
        &self,
        namespace: &str,
        service_account: &str,
        audiences: &[String],
    ) -> Result<String, LookupError> {
        assert!(
            !self.forbid_io,
            "unexpected token request {namespace}/{service_account}"
        );
        self.token_requests.lock().unwrap().push((
            namespace.to_string(),
            service_account.to_string(),
            audiences.to_vec(),
        ));
        Ok(ISSUED_TOKEN.to_string())
    }
}

/// Credential exchange that records every request
#[derive(Default)]
pub struct RecordingExchange {
    pub assumed: Mutex<Vec<AssumeRoleRequest>>,
    pub assumed_from: Mutex<Vec<String>>,
    pub federated: Mutex<Vec<WebIdentityRequest>>,
    failure: Option<ExchangeError>,
}

impl RecordingExchange {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(error: ExchangeError) -> Self {
        Self {
            failure: Some(error),
            ..Self::default()
        }
    }

    fn issue(&self) -> Result<ResolvedCredential, ExchangeError> {
        match &self.failure {
            Some(e) => Err(e.clone()),
            None => Ok(ResolvedCredential::temporary(
                "tmp-id",
                "tmp-key",
                "tmp-session-token",
                chrono::Utc::now() + chrono::Duration::hours(2),
            )),
        }
    }
}

#[async_trait]
impl CredentialExchange for RecordingExchange {
    async fn assume_role(
        &self,
        source: &ResolvedCredential,
        request: &AssumeRoleRequest,
    ) -> Result<ResolvedCredential, ExchangeError> {
        self.assumed_from
            .lock()
            .unwrap()
            .push(source.secret_id().to_string());
        self.assumed.lock().unwrap().push(request.clone());
        self.issue()
    }

    async fn assume_role_with_web_identity(
        &self,
        request: &WebIdentityRequest,
    ) -> Result<ResolvedCredential, ExchangeError> {
        self.federated.lock().unwrap().push(request.clone());
        self.issue()
    }
}

/// Liveness probe failing a fixed number of times before succeeding
pub struct ScriptedProbe {
    failures: usize,
    error: ExchangeError,
    pub calls: AtomicUsize,
    pub seen_ids: Mutex<Vec<String>>,
}

impl ScriptedProbe {
    pub fn healthy() -> Self {
        Self::failing_times(0, ExchangeError::Rejected("unused".to_string()))
    }

    pub fn failing_times(failures: usize, error: ExchangeError) -> Self {
        Self {
            failures,
            error,
            calls: AtomicUsize::new(0),
            seen_ids: Mutex::new(Vec::new()),
        }
    }

    pub fn always_rejecting() -> Self {
        Self::failing_times(
            usize::MAX,
            ExchangeError::Rejected("AuthFailure.SecretIdNotFound".to_string()),
        )
    }

    pub fn always_unreachable() -> Self {
        Self::failing_times(
            usize::MAX,
            ExchangeError::Transport("dns error: no such host".to_string()),
        )
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LivenessProbe for ScriptedProbe {
    async fn probe(
        &self,
        _region: &str,
        credential: &ResolvedCredential,
    ) -> Result<(), ExchangeError> {
        self.seen_ids
            .lock()
            .unwrap()
            .push(credential.secret_id().to_string());
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call < self.failures {
            Err(self.error.clone())
        } else {
            Ok(())
        }
    }
}

/// Secrets backend serving fixed payloads
#[derive(Default)]
pub struct StubSecretValueApi {
    values: BTreeMap<String, SecretValue>,
    pub requests: Mutex<Vec<(String, Option<String>)>>,
}

impl StubSecretValueApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_string(mut self, key: &str, value: &str) -> Self {
        self.values.insert(
            key.to_string(),
            SecretValue {
                string: Some(value.to_string()),
                binary: None,
            },
        );
        self
    }

    pub fn with_binary(mut self, key: &str, value: &[u8]) -> Self {
        self.values.insert(
            key.to_string(),
            SecretValue {
                string: None,
                binary: Some(value.to_vec()),
            },
        );
        self
    }
}

#[async_trait]
impl SecretValueApi for StubSecretValueApi {
    async fn get_secret_value(
        &self,
        _region: &str,
        _credential: &ResolvedCredential,
        key: &str,
        version: Option<&str>,
    ) -> Result<SecretValue, ExchangeError> {
        self.requests
            .lock()
            .unwrap()
            .push((key.to_string(), version.map(str::to_string)));
        self.values
            .get(key)
            .cloned()
            .ok_or_else(|| ExchangeError::Rejected(format!("ResourceNotFound: {key}")))
    }
}

/// Status writer recording every merge patch it receives
#[derive(Default)]
pub struct RecordingStatusWriter {
    pub patches: Mutex<Vec<(StoreKey, Value)>>,
}

impl RecordingStatusWriter {
    pub fn count(&self) -> usize {
        self.patches.lock().unwrap().len()
    }

    pub fn last(&self) -> Option<Value> {
        self.patches.lock().unwrap().last().map(|(_, p)| p.clone())
    }
}

#[async_trait]
impl StatusWriter for RecordingStatusWriter {
    async fn patch_status(&self, store: &StoreKey, patch: &Value) -> Result<(), StatusWriteError> {
        self.patches
            .lock()
            .unwrap()
            .push((store.clone(), patch.clone()));
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedEvent {
    pub type_: String,
    pub reason: String,
    pub action: String,
    pub note: Option<String>,
    pub kind: Option<String>,
}

#[derive(Default)]
pub struct RecordingEvents {
    pub events: Mutex<Vec<RecordedEvent>>,
}

impl RecordingEvents {
    pub fn all(&self) -> Vec<RecordedEvent> {
        self.events.lock().unwrap().clone()
    }
}

#[async_trait]
impl EventPublisher for RecordingEvents {
    async fn publish(
        &self,
        resource_ref: &ObjectReference,
        type_: EventType,
        reason: &str,
        action: &str,
        note: Option<String>,
    ) {
        self.events.lock().unwrap().push(RecordedEvent {
            type_: format!("{type_:?}"),
            reason: reason.to_string(),
            action: action.to_string(),
            note,
            kind: resource_ref.kind.clone(),
        });
    }
}

pub fn selector(name: &str, key: &str, namespace: Option<&str>) -> SecretKeySelector {
    SecretKeySelector {
        name: name.to_string(),
        key: key.to_string(),
        namespace: namespace.map(str::to_string),
    }
}

pub fn static_auth(id: SecretKeySelector, secret: SecretKeySelector) -> AuthSpec {
    AuthSpec {
        secret_ref: Some(StaticKeyRef {
            access_key_id: id,
            access_key_secret: secret,
        }),
        service_account_ref: None,
    }
}

pub fn identity_auth(name: &str, namespace: Option<&str>) -> AuthSpec {
    AuthSpec {
        secret_ref: None,
        service_account_ref: Some(ServiceAccountSelector {
            name: name.to_string(),
            namespace: namespace.map(str::to_string),
        }),
    }
}

pub fn provider(region: &str, role: Option<&str>, auth: AuthSpec) -> ProviderConfig {
    ProviderConfig::SecretsManager(SecretsManagerProvider {
        region_id: region.to_string(),
        role: role.map(str::to_string),
        auth,
    })
}

pub fn secrets_manager(config: &ProviderConfig) -> &SecretsManagerProvider {
    match config {
        ProviderConfig::SecretsManager(provider) => provider,
    }
}

pub fn namespaced_store(name: &str, namespace: &str, provider: ProviderConfig) -> SecretStore {
    let mut store = SecretStore::new(
        name,
        SecretStoreSpec {
            controller: String::new(),
            refresh_interval: 0,
            provider,
        },
    );
    store.metadata.namespace = Some(namespace.to_string());
    store
}

pub fn cluster_store(name: &str, provider: ProviderConfig) -> ClusterSecretStore {
    ClusterSecretStore::new(
        name,
        ClusterSecretStoreSpec {
            controller: String::new(),
            refresh_interval: 0,
            provider,
        },
    )
}

/// Apply a recorded merge patch to a store's status, as the API server would
pub fn apply_status_patch(status: Option<SecretStoreStatus>, patch: &Value) -> SecretStoreStatus {
    let mut current = serde_json::to_value(status.unwrap_or_default()).unwrap();
    if let (Some(target), Some(changes)) = (
        current.as_object_mut(),
        patch.get("status").and_then(Value::as_object),
    ) {
        for (field, value) in changes {
            target.insert(field.clone(), value.clone());
        }
    }
    serde_json::from_value(current).unwrap()
}

/// Controller configuration with no delay between probe attempts
pub fn test_config() -> ControllerConfig {
    ControllerConfig {
        validation_retry_delay_ms: 0,
        ..ControllerConfig::default()
    }
}

pub fn resolver(cluster: &Arc<FakeCluster>, exchange: &Arc<RecordingExchange>) -> CredentialResolver {
    CredentialResolver::new(
        cluster.clone(),
        cluster.clone(),
        cluster.clone(),
        exchange.clone(),
    )
}

/// Reconciler wired to in-memory collaborators
pub struct Harness {
    pub cluster: Arc<FakeCluster>,
    pub exchange: Arc<RecordingExchange>,
    pub probe: Arc<ScriptedProbe>,
    pub status: Arc<RecordingStatusWriter>,
    pub events: Arc<RecordingEvents>,
    pub shutdown: CancellationToken,
    pub reconciler: Arc<Reconciler>,
}

impl Harness {
    /// Calls made against the identity endpoint during validation
    pub fn liveness_calls(&self) -> usize {
        self.probe.call_count()
    }

    pub fn new(cluster: FakeCluster, probe: ScriptedProbe) -> Self {
        Self::build(cluster, RecordingExchange::new(), probe, test_config())
    }

    pub fn build(
        cluster: FakeCluster,
        exchange: RecordingExchange,
        probe: ScriptedProbe,
        config: ControllerConfig,
    ) -> Self {
        let cluster = Arc::new(cluster);
        let exchange = Arc::new(exchange);
        let probe = Arc::new(probe);
        let status = Arc::new(RecordingStatusWriter::default());
        let events = Arc::new(RecordingEvents::default());
        let shutdown = CancellationToken::new();

        let secrets_manager = SecretsManager::new(
            resolver(&cluster, &exchange),
            probe.clone(),
            Arc::new(StubSecretValueApi::new()),
            Duration::ZERO,
        );
        let registry = ProviderRegistry::new()
            .with(ProviderKind::SecretsManager, Arc::new(secrets_manager));

        let reconciler = Arc::new(Reconciler::new(
            config,
            registry,
            status.clone(),
            events.clone(),
            shutdown.clone(),
        ));

        Self {
            cluster,
            exchange,
            probe,
            status,
            events,
            shutdown,
            reconciler,
        }
    }
}
