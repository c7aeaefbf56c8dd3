//! # Reconciler
//!
//! Reconciles `SecretStore` and `ClusterSecretStore` resources.
//!
//! - `reconcile.rs` - one validation pass per store
//! - `status.rs` - condition updates and the deferred status write
//! - `events.rs` - Kubernetes Events on stores
//! - `types.rs` - shared context and errors

pub mod events;
pub mod reconcile;
pub mod status;
mod types;

pub use events::{EventPublisher, KubeEventPublisher};
pub use reconcile::{reconcile, reconcile_store, requeue_interval, should_process, validate_store};
pub use status::{KubeStatusWriter, StatusUpdate, StatusWriteError, StatusWriter};
pub use types::{Reconciler, ReconcilerError};
