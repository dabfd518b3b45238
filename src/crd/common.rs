//! # Common Resource Types
//!
//! Types shared by every managed resource kind: references, deletion policy
//! and status conditions.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_PROVIDER_CONFIG_NAME;

/// Reference to the `ProviderConfig` holding the GitLab connection profile
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProviderConfigReference {
    /// Name of the cluster-scoped `ProviderConfig`
    pub name: String,
}

impl Default for ProviderConfigReference {
    fn default() -> Self {
        Self {
            name: DEFAULT_PROVIDER_CONFIG_NAME.to_string(),
        }
    }
}

/// Reference to a namespaced Kubernetes Secret
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SecretReference {
    pub name: String,
    pub namespace: String,
}

/// What happens to the GitLab record when the managed resource is deleted
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub enum DeletionPolicy {
    /// Revoke the token in GitLab
    #[default]
    Delete,
    /// Leave the token in GitLab untouched
    Orphan,
}

/// Condition type reporting whether the GitLab token is usable
pub const CONDITION_READY: &str = "Ready";
/// Condition type reporting whether the last reconciliation succeeded
pub const CONDITION_SYNCED: &str = "Synced";

/// Condition represents a status condition for the resource
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    /// Type of condition
    pub r#type: String,
    /// Status of condition (True, False, Unknown)
    pub status: String,
    /// Last transition time
    #[serde(default)]
    pub last_transition_time: Option<String>,
    /// Reason for condition
    #[serde(default)]
    pub reason: Option<String>,
    /// Message describing condition
    #[serde(default)]
    pub message: Option<String>,
}

impl Condition {
    fn new(r#type: &str, status: bool, reason: &str, message: Option<String>) -> Self {
        Self {
            r#type: r#type.to_string(),
            status: if status { "True" } else { "False" }.to_string(),
            last_transition_time: Some(chrono::Utc::now().to_rfc3339()),
            reason: Some(reason.to_string()),
            message,
        }
    }

    /// The token exists in GitLab and can be used
    #[must_use]
    pub fn available() -> Self {
        Self::new(CONDITION_READY, true, "Available", None)
    }

    /// The token is being created
    #[must_use]
    pub fn creating() -> Self {
        Self::new(CONDITION_READY, false, "Creating", None)
    }

    /// The token is being revoked
    #[must_use]
    pub fn deleting() -> Self {
        Self::new(CONDITION_READY, false, "Deleting", None)
    }

    #[must_use]
    pub fn reconcile_success(message: Option<String>) -> Self {
        Self::new(CONDITION_SYNCED, true, "ReconcileSuccess", message)
    }

    #[must_use]
    pub fn reconcile_error(message: String) -> Self {
        Self::new(CONDITION_SYNCED, false, "ReconcileError", Some(message))
    }

    /// Two conditions are equivalent when only their transition time differs
    fn equivalent(&self, other: &Self) -> bool {
        self.r#type == other.r#type
            && self.status == other.status
            && self.reason == other.reason
            && self.message == other.message
    }
}

/// Insert or replace the condition of the same type.
///
/// An equivalent existing condition is left untouched so its transition time is preserved.
pub fn set_condition(conditions: &mut Vec<Condition>, condition: Condition) {
    match conditions.iter_mut().find(|c| c.r#type == condition.r#type) {
        Some(existing) if existing.equivalent(&condition) => {}
        Some(existing) => *existing = condition,
        None => conditions.push(condition),
    }
}
