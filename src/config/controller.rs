//! # Controller Configuration
//!
//! Controller-level settings loaded from environment variables.

use std::time::Duration;

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl LogFormat {
    fn parse(value: &str) -> Self {
        if value.eq_ignore_ascii_case("json") {
            LogFormat::Json
        } else {
            LogFormat::Text
        }
    }
}

/// Controller-level configuration
///
/// All settings have sensible defaults and can be overridden via environment variables.
/// Environment variables are populated from a ConfigMap using `envFrom` in the deployment.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Controller class this instance owns
    /// Stores declaring a different, non-empty class are skipped
    pub controller_class: String,
    /// Refresh interval used when a store does not declare one (seconds)
    pub default_refresh_interval_secs: u64,
    /// Requeue interval after an inconclusive (`Unknown`) validation (seconds)
    pub transient_requeue_secs: u64,
    /// Delay between liveness probe attempts (milliseconds)
    pub validation_retry_delay_ms: u64,
    /// Error backoff lower bound (minutes)
    pub backoff_min_minutes: u64,
    /// Error backoff upper bound (minutes)
    pub backoff_max_minutes: u64,
    /// HTTP port for metrics and probes
    pub metrics_port: u16,
    /// Log format (json, text)
    pub log_format: LogFormat,
    /// Endpoint override for the credential exchange service
    pub sts_endpoint_url: Option<String>,
    /// Endpoint override for the secrets backend
    pub secrets_manager_endpoint_url: Option<String>,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        use crate::constants::*;
        Self {
            controller_class: String::new(),
            default_refresh_interval_secs: DEFAULT_REFRESH_INTERVAL_SECS,
            transient_requeue_secs: DEFAULT_TRANSIENT_REQUEUE_SECS,
            validation_retry_delay_ms: DEFAULT_VALIDATION_RETRY_DELAY_MS,
            backoff_min_minutes: DEFAULT_BACKOFF_MIN_MINUTES,
            backoff_max_minutes: DEFAULT_BACKOFF_MAX_MINUTES,
            metrics_port: DEFAULT_METRICS_PORT,
            log_format: LogFormat::Text,
            sts_endpoint_url: None,
            secrets_manager_endpoint_url: None,
        }
    }
}

impl ControllerConfig {
    /// Load configuration from environment variables with defaults
    pub fn from_env() -> Self {
        use crate::constants::*;
        Self {
            controller_class: env_var_or_default_str("CONTROLLER_CLASS", ""),
            default_refresh_interval_secs: env_var_or_default(
                "DEFAULT_REFRESH_INTERVAL_SECS",
                DEFAULT_REFRESH_INTERVAL_SECS,
            ),
            transient_requeue_secs: env_var_or_default(
                "TRANSIENT_REQUEUE_SECS",
                DEFAULT_TRANSIENT_REQUEUE_SECS,
            ),
            validation_retry_delay_ms: env_var_or_default(
                "VALIDATION_RETRY_DELAY_MS",
                DEFAULT_VALIDATION_RETRY_DELAY_MS,
            ),
            backoff_min_minutes: env_var_or_default(
                "BACKOFF_MIN_MINUTES",
                DEFAULT_BACKOFF_MIN_MINUTES,
            ),
            backoff_max_minutes: env_var_or_default(
                "BACKOFF_MAX_MINUTES",
                DEFAULT_BACKOFF_MAX_MINUTES,
            ),
            metrics_port: env_var_or_default("METRICS_PORT", DEFAULT_METRICS_PORT),
            log_format: LogFormat::parse(&env_var_or_default_str("LOG_FORMAT", "text")),
            sts_endpoint_url: env_var_opt("STS_ENDPOINT_URL"),
            secrets_manager_endpoint_url: env_var_opt("SECRETS_MANAGER_ENDPOINT_URL"),
        }
    }

    /// Get default refresh interval duration
    pub fn default_refresh_interval(&self) -> Duration {
        Duration::from_secs(self.default_refresh_interval_secs)
    }

    /// Get transient requeue duration
    pub fn transient_requeue_duration(&self) -> Duration {
        Duration::from_secs(self.transient_requeue_secs)
    }

    /// Get delay between liveness probe attempts
    pub fn validation_retry_delay(&self) -> Duration {
        Duration::from_millis(self.validation_retry_delay_ms)
    }
}

/// Read environment variable or return default value
fn env_var_or_default<T: std::str::FromStr>(key: &str, default: T) -> T
where
    <T as std::str::FromStr>::Err: std::fmt::Debug,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Read environment variable as string or return default
fn env_var_or_default_str(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Read an optional, non-empty environment variable
fn env_var_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}
