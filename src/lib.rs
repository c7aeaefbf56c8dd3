//! Secret Store Controller Library
//!
//! Credential resolution and store validation for `SecretStore` and
//! `ClusterSecretStore` resources.
//!
//! ## Quick Start
//!
//! ```rust
//! use secret_store_controller::prelude::*;
//! ```
//!
//! This brings commonly used types and traits into scope. For more specific imports,
//! use the individual modules.

pub mod config;
pub mod constants;
pub mod controller;
pub mod crd;
pub mod observability;
pub mod prelude;
pub mod provider;
pub mod runtime;
