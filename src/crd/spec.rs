//! # AccessToken Spec
//!
//! Desired state of a GitLab project access token.

use chrono::{DateTime, TimeDelta, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_ROTATE_THRESHOLD_HOURS;
use crate::controller::duration::parse_duration;
use crate::crd::{DeletionPolicy, ProviderConfigReference, SecretReference};
use crate::error::Result;

/// AccessToken Custom Resource Definition
///
/// A managed resource that represents a GitLab project access token.
///
/// # Example
///
/// ```yaml
/// apiVersion: projects.gitlab.crossplane.io/v1alpha1
/// kind: AccessToken
/// metadata:
///   name: ci-deployer
/// spec:
///   forProvider:
///     projectId: "1234"
///     name: ci-deployer
///     scopes: ["read_repository"]
///     rotateThreshold: 168h
///   writeConnectionSecretToRef:
///     name: ci-deployer-token
///     namespace: ci
/// ```
#[derive(kube::CustomResource, Debug, Clone, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(
    kind = "AccessToken",
    group = "projects.gitlab.crossplane.io",
    version = "v1alpha1",
    status = "crate::crd::AccessTokenStatus",
    category = "crossplane",
    category = "managed",
    category = "gitlab",
    printcolumn = r#"{"name":"READY", "type":"string", "jsonPath":".status.conditions[?(@.type==\"Ready\")].status"}, {"name":"SYNCED", "type":"string", "jsonPath":".status.conditions[?(@.type==\"Synced\")].status"}, {"name":"EXPIRES", "type":"string", "jsonPath":".status.atProvider.expiresAt"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct AccessTokenSpec {
    /// Desired state of the token in GitLab
    pub for_provider: AccessTokenParameters,
    /// ProviderConfig holding the GitLab connection profile
    #[serde(default)]
    pub provider_config_ref: ProviderConfigReference,
    /// Secret the plaintext token is written to on creation and rotation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub write_connection_secret_to_ref: Option<SecretReference>,
    /// Whether the token is revoked in GitLab when this resource is deleted
    #[serde(default)]
    pub deletion_policy: DeletionPolicy,
}

/// Parameters of a GitLab project access token
///
/// See <https://docs.gitlab.com/ee/api/project_access_tokens.html>
#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AccessTokenParameters {
    /// ID or URL-encoded path of the project the token belongs to. Immutable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,

    /// Expiration of the token. Cannot be later than the maximum lifetime GitLab allows.
    /// GitLab keeps day granularity. Immutable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,

    /// How long before expiration the token is rotated, e.g. "168h" or "7d"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotate_threshold: Option<String>,

    /// Access level for the project. GitLab defaults to 40 (Maintainer). Immutable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_level: Option<AccessLevel>,

    /// Scopes granted to the token, e.g. read_repository or write_registry. Immutable.
    #[serde(default)]
    pub scopes: Vec<String>,

    /// Name of the token in GitLab. Falls back to the resource name when empty.
    #[serde(default)]
    pub name: String,
}

impl AccessTokenParameters {
    /// Parsed `rotateThreshold`, if the caller set one
    ///
    /// # Errors
    /// Returns a validation error if the threshold is not a valid duration string
    pub fn rotate_threshold(&self) -> Result<Option<TimeDelta>> {
        self.rotate_threshold
            .as_deref()
            .map(parse_duration)
            .transpose()
    }

    /// Threshold used to decide whether the token needs rotation.
    ///
    /// The caller's value when set, the 7 day default otherwise. The default is never
    /// written back to the spec.
    ///
    /// # Errors
    /// Returns a validation error if the threshold is not a valid duration string
    pub fn effective_rotate_threshold(&self) -> Result<TimeDelta> {
        Ok(self
            .rotate_threshold()?
            .map_or_else(default_rotate_threshold, |d| d.abs()))
    }
}

#[must_use]
pub fn default_rotate_threshold() -> TimeDelta {
    TimeDelta::hours(DEFAULT_ROTATE_THRESHOLD_HOURS)
}

/// GitLab access level
///
/// Valid values are 10 (Guest), 20 (Reporter), 30 (Developer), 40 (Maintainer) and 50 (Owner).
#[derive(Debug, Clone, Copy, Deserialize, Serialize, JsonSchema, PartialEq, Eq, PartialOrd, Ord)]
#[serde(transparent)]
pub struct AccessLevel(pub i64);

impl AccessLevel {
    pub const GUEST: Self = Self(10);
    pub const REPORTER: Self = Self(20);
    pub const DEVELOPER: Self = Self(30);
    pub const MAINTAINER: Self = Self(40);
    pub const OWNER: Self = Self(50);
}

impl From<i64> for AccessLevel {
    fn from(value: i64) -> Self {
        Self(value)
    }
}
