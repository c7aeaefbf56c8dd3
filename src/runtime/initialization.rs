//! # Initialization
//!
//! Controller start-up: rustls, tracing, metrics, the HTTP server, the
//! Kubernetes client and the provider registry.

use crate::config::{ControllerConfig, LogFormat};
use crate::constants::CONTROLLER_NAME;
use crate::controller::reconciler::{KubeEventPublisher, KubeStatusWriter, Reconciler};
use crate::controller::server::{start_server, ServerState};
use crate::observability;
use crate::provider::auth::kubernetes::{KubeIdentityLookup, KubeSecretLookup, KubeTokenIssuer};
use crate::provider::auth::sts::StsExchange;
use crate::provider::auth::CredentialResolver;
use crate::provider::secrets_manager::{AwsSecretValueApi, SecretsManager};
use crate::provider::{ProviderKind, ProviderRegistry};
use anyhow::{Context, Result};
use kube::Client;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Everything the watch loop needs
pub struct InitializationResult {
    pub client: Client,
    pub reconciler: Arc<Reconciler>,
    pub server_state: Arc<ServerState>,
}

impl std::fmt::Debug for InitializationResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InitializationResult")
            .field("server_ready", &self.server_state.is_ready())
            .finish_non_exhaustive()
    }
}

fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "secret_store_controller=info".into());
    match format {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_current_span(true)
            .init(),
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }
}

/// Build the provider table
///
/// Every provider is registered explicitly here; there is no self-registration.
#[must_use]
pub fn build_registry(client: &Client, config: &ControllerConfig) -> ProviderRegistry {
    let sts = Arc::new(StsExchange::new(config.sts_endpoint_url.clone()));
    let resolver = CredentialResolver::new(
        Arc::new(KubeSecretLookup::new(client.clone())),
        Arc::new(KubeIdentityLookup::new(client.clone())),
        Arc::new(KubeTokenIssuer::new(client.clone())),
        sts.clone(),
    );
    let secrets_manager = SecretsManager::new(
        resolver,
        sts,
        Arc::new(AwsSecretValueApi::new(
            config.secrets_manager_endpoint_url.clone(),
        )),
        config.validation_retry_delay(),
    );

    ProviderRegistry::new().with(ProviderKind::SecretsManager, Arc::new(secrets_manager))
}

/// Cancel `shutdown` on SIGINT or SIGTERM
fn spawn_signal_handler(shutdown: CancellationToken) {
    tokio::spawn(async move {
        let ctrl_c = tokio::signal::ctrl_c();
        #[cfg(unix)]
        {
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(mut sigterm) => {
                    tokio::select! {
                        _ = ctrl_c => {}
                        _ = sigterm.recv() => {}
                    }
                }
                Err(e) => {
                    error!("Failed to install SIGTERM handler: {}", e);
                    let _ = ctrl_c.await;
                }
            }
        }
        #[cfg(not(unix))]
        {
            let _ = ctrl_c.await;
        }
        info!("Received shutdown signal, cancelling in-flight reconciliations...");
        shutdown.cancel();
    });
}

/// Initialize the controller runtime
pub async fn initialize(config: ControllerConfig) -> Result<InitializationResult> {
    // Must run before any TLS connection is made
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("Failed to install rustls crypto provider"))?;

    init_tracing(config.log_format);

    info!("Starting Secret Store Controller");
    info!(
        "Build info: timestamp={}, datetime={}, git_hash={}",
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_DATETIME"),
        env!("BUILD_GIT_HASH")
    );
    info!(
        controller_class = %config.controller_class,
        default_refresh_interval_secs = config.default_refresh_interval_secs,
        "Loaded controller configuration"
    );

    observability::metrics::register_metrics()?;

    let shutdown = CancellationToken::new();
    spawn_signal_handler(shutdown.clone());

    let server_state = Arc::new(ServerState::default());
    let server_port = config.metrics_port;
    let server_state_clone = server_state.clone();
    let server_shutdown = shutdown.clone();
    tokio::spawn(async move {
        if let Err(e) = start_server(server_port, server_state_clone, server_shutdown).await {
            error!("HTTP server error: {}", e);
        }
    });

    let client = Client::try_default()
        .await
        .context("Failed to create Kubernetes client")?;

    let registry = build_registry(&client, &config);
    let reconciler = Arc::new(Reconciler::new(
        config,
        registry,
        Arc::new(KubeStatusWriter::new(client.clone())),
        Arc::new(KubeEventPublisher::new(client.clone(), CONTROLLER_NAME)),
        shutdown,
    ));

    info!("Controller initialized, starting watch loop...");

    Ok(InitializationResult {
        client,
        reconciler,
        server_state,
    })
}
