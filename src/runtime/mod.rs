//! # Runtime
//!
//! - `initialization`: process start-up and wiring
//! - `watch_loop`: the two store controllers
//! - `error_policy`: backoff for failed passes

pub mod error_policy;
pub mod initialization;
pub mod watch_loop;
