//! # Watch Loop
//!
//! Runs one controller per store kind. Both share the same reconciler context
//! and stop together when the shutdown token is cancelled. A plain watcher per
//! kind drops the per-store state of deleted stores.

use crate::controller::reconciler::{reconcile, Reconciler, ReconcilerError};
use crate::controller::server::ServerState;
use crate::crd::{ClusterSecretStore, GenericStore, SecretStore};
use crate::runtime::error_policy::handle_reconciliation_error;
use futures::StreamExt;
use kube::api::Api;
use kube::Client;
use kube_runtime::controller::{self, Action};
use kube_runtime::reflector::ObjectRef;
use kube_runtime::{watcher, Controller, WatchStreamExt};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::{debug, info, warn};

type ControllerResult<K> =
    Result<(ObjectRef<K>, Action), controller::Error<ReconcilerError, watcher::Error>>;

fn log_result<K: GenericStore>(result: ControllerResult<K>) {
    match result {
        Ok((obj, action)) => debug!(object = %obj, action = ?action, "Reconciled"),
        // Already logged and requeued by the error policy
        Err(controller::Error::ReconcilerFailed(_, obj)) => {
            debug!(object = %obj, "Reconciliation failed");
        }
        Err(e) => warn!(error = %e, "Controller stream error"),
    }
}

/// Forget backoff and condition series of stores removed from the cluster
async fn prune_deleted<K>(api: Api<K>, reconciler: Arc<Reconciler>)
where
    K: GenericStore + DeserializeOwned,
{
    let shutdown = reconciler.shutdown.clone();
    let deletions = watcher::watcher(api, watcher::Config::default().any_semantic())
        .default_backoff()
        .for_each(|event| {
            match event {
                Ok(watcher::Event::Delete(store)) => {
                    let key = store.store_key();
                    debug!(store = %key, "Store deleted, dropping its state");
                    reconciler.forget_store(&key);
                }
                Ok(_) => {}
                Err(e) => debug!(error = %e, "Deletion watch error"),
            }
            futures::future::ready(())
        });

    tokio::select! {
        () = shutdown.cancelled() => {}
        () = deletions => {}
    }
}

/// Run both store controllers until shutdown
pub async fn run_watch_loop(
    client: Client,
    reconciler: Arc<Reconciler>,
    server_state: Arc<ServerState>,
) -> Result<(), anyhow::Error> {
    let shutdown = reconciler.shutdown.clone();

    let stores: Api<SecretStore> = Api::all(client.clone());
    let cluster_stores: Api<ClusterSecretStore> = Api::all(client);

    let namespaced_deletions = prune_deleted(stores.clone(), Arc::clone(&reconciler));
    let cluster_deletions = prune_deleted(cluster_stores.clone(), Arc::clone(&reconciler));

    let namespaced = Controller::new(stores, watcher::Config::default().any_semantic())
        .graceful_shutdown_on(shutdown.clone().cancelled_owned())
        .run(
            reconcile::<SecretStore>,
            handle_reconciliation_error::<SecretStore>,
            reconciler.clone(),
        )
        .for_each(|result| {
            log_result(result);
            futures::future::ready(())
        });

    let cluster_wide = Controller::new(cluster_stores, watcher::Config::default().any_semantic())
        .graceful_shutdown_on(shutdown.clone().cancelled_owned())
        .run(
            reconcile::<ClusterSecretStore>,
            handle_reconciliation_error::<ClusterSecretStore>,
            reconciler,
        )
        .for_each(|result| {
            log_result(result);
            futures::future::ready(())
        });

    server_state.mark_ready();
    info!("Watching SecretStore and ClusterSecretStore resources");

    tokio::join!(
        namespaced,
        cluster_wide,
        namespaced_deletions,
        cluster_deletions
    );

    server_state.mark_not_ready();
    info!("Controllers stopped");
    Ok(())
}
