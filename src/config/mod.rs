//! # Configuration
//!
//! Controller-level configuration loaded from the environment.

mod controller;

pub use controller::{ControllerConfig, LogFormat};
