//! # Constants
//!
//! Shared constants used throughout the controller.
//!
//! These values represent reasonable defaults and can be overridden via
//! configuration or environment variables where applicable.

/// Default HTTP server port for metrics and health checks
pub const DEFAULT_METRICS_PORT: u16 = 5000;

/// Default requeue interval after a successful reconciliation (seconds)
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 600;

/// Requeue interval right after a token was created (seconds)
/// The next pass observes the freshly created token and late-initializes the spec.
pub const CREATE_REQUEUE_SECS: u64 = 5;

/// Default timeout for a single GitLab API call (seconds)
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Default Fibonacci backoff bounds for reconciliation errors (minutes)
pub const DEFAULT_BACKOFF_MIN_MINUTES: u64 = 1;
pub const DEFAULT_BACKOFF_MAX_MINUTES: u64 = 10;

/// Default maximum number of resources reconciled at the same time
pub const DEFAULT_MAX_CONCURRENT_RECONCILIATIONS: u16 = 10;

/// Period prior to expiration at which a token is rotated when `rotateThreshold` is unset
pub const DEFAULT_ROTATE_THRESHOLD_HOURS: i64 = 7 * 24;

/// Lifetime assumed for a token when GitLab does not report both `created_at` and `expires_at`.
/// GitLab caps access tokens at 365 days since milestone 16.0.
pub const DEFAULT_ACCESS_TOKEN_MAX_DURATION_DAYS: i64 = 365;

/// Annotation holding the identity of the GitLab record backing a managed resource
pub const ANNOTATION_EXTERNAL_NAME: &str = "crossplane.io/external-name";

/// Finalizer guarding revocation of the GitLab token on deletion
pub const FINALIZER: &str = "finalizer.managedresource.crossplane.io";

/// Field manager used for server-side apply
pub const FIELD_MANAGER: &str = "access-token-controller";

/// Key of the plaintext token inside the published connection secret
pub const CONNECTION_SECRET_TOKEN_KEY: &str = "token";

/// Type of the Kubernetes Secret holding connection details
pub const CONNECTION_SECRET_TYPE: &str = "connection.crossplane.io/v1alpha1";

/// Provider config used when a resource does not reference one
pub const DEFAULT_PROVIDER_CONFIG_NAME: &str = "default";

/// GitLab REST API prefix
pub const GITLAB_API_PREFIX: &str = "/api/v4";
