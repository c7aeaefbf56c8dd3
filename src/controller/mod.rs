//! # Controller
//!
//! - `backoff`: Fibonacci backoff for failed passes
//! - `reconciler`: store validation passes, status and events
//! - `server`: HTTP server for metrics and health checks

pub mod backoff;
pub mod reconciler;
pub mod server;
