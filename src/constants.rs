//! # Constants
//!
//! Shared constants used throughout the controller.
//!
//! These values represent reasonable defaults and can be overridden via
//! configuration or environment variables where applicable.

/// Default HTTP server port for metrics and health probes
pub const DEFAULT_METRICS_PORT: u16 = 5000;

/// Default refresh interval applied when a store does not declare one (seconds)
pub const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 300;

/// Requeue interval after a validation pass ends in `Unknown` (seconds)
/// Transport failures are retried soon instead of flipping the store to failed
pub const DEFAULT_TRANSIENT_REQUEUE_SECS: u64 = 30;

/// Delay between liveness probe attempts (milliseconds)
pub const DEFAULT_VALIDATION_RETRY_DELAY_MS: u64 = 200;

/// Liveness probe attempts before a store is reported as failing validation
pub const MAX_VALIDATION_ATTEMPTS: u32 = 5;

/// Error backoff lower bound (minutes)
pub const DEFAULT_BACKOFF_MIN_MINUTES: u64 = 1;

/// Error backoff upper bound (minutes)
pub const DEFAULT_BACKOFF_MAX_MINUTES: u64 = 10;

/// Lifetime requested for exchanged credentials (seconds)
pub const DEFAULT_DURATION_SECONDS: i32 = 7200;

/// Prefix of the session name sent with every role exchange
pub const SESSION_NAME_PREFIX: &str = "secret-store-controller-";

/// Field manager / reporting component name
pub const CONTROLLER_NAME: &str = "secret-store-controller";

/// Service account annotation carrying the OIDC provider ID
pub const PROVIDER_ID_ANNOTATION: &str = "tke.cloud.tencent.com/providerID";

/// Service account annotation carrying the role to assume
pub const ROLE_ARN_ANNOTATION: &str = "tke.cloud.tencent.com/role-arn";

/// Service account annotation carrying the token audience
pub const AUDIENCE_ANNOTATION: &str = "tke.cloud.tencent.com/audience";
