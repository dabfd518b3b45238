//! # Custom Resource Definitions
//!
//! CRD types for the Access Token Controller.
//!
//! ## Module Structure
//!
//! - `spec.rs` - `AccessToken` CRD and its desired state
//! - `status.rs` - Observed state and the observation model
//! - `provider_config.rs` - `ProviderConfig` CRD holding the GitLab connection profile
//! - `common.rs` - References, deletion policy and status conditions

mod common;
mod provider_config;
mod spec;
mod status;

// Re-export all public types
pub use common::{
    set_condition, Condition, DeletionPolicy, ProviderConfigReference, SecretReference,
    CONDITION_READY, CONDITION_SYNCED,
};
pub use provider_config::{
    CredentialsMethod, CredentialsSource, ProviderConfig, ProviderConfigSpec, ProviderCredentials,
    SecretKeySelector,
};
pub use spec::{
    default_rotate_threshold, AccessLevel, AccessToken, AccessTokenParameters, AccessTokenSpec,
};
pub use status::{default_max_duration, AccessTokenObservation, AccessTokenStatus};
