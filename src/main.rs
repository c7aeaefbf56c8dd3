//! # Secret Store Controller
//!
//! Validates `SecretStore` and `ClusterSecretStore` resources: resolves the
//! credentials each store declares (static keys or a federated service account
//! identity), checks they work and reports the result in the store's `Ready`
//! condition.

use anyhow::Result;
use secret_store_controller::config::ControllerConfig;
use secret_store_controller::runtime::{initialization, watch_loop};

#[tokio::main]
async fn main() -> Result<()> {
    let config = ControllerConfig::from_env();
    let init = initialization::initialize(config).await?;
    watch_loop::run_watch_loop(init.client, init.reconciler, init.server_state).await
}
