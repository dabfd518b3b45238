//! # ProviderConfig
//!
//! Cluster-scoped connection profile for a GitLab instance, referenced by
//! managed resources through `spec.providerConfigRef`.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// ProviderConfig Custom Resource Definition
///
/// # Example
///
/// ```yaml
/// apiVersion: gitlab.crossplane.io/v1beta1
/// kind: ProviderConfig
/// metadata:
///   name: default
/// spec:
///   baseUrl: https://gitlab.example.com/
///   credentials:
///     source: Secret
///     method: PersonalAccessToken
///     secretRef:
///       name: gitlab-credentials
///       namespace: crossplane-system
///       key: token
/// ```
#[derive(kube::CustomResource, Debug, Clone, Deserialize, Serialize, JsonSchema)]
#[kube(
    kind = "ProviderConfig",
    group = "gitlab.crossplane.io",
    version = "v1beta1",
    category = "crossplane",
    category = "provider",
    category = "gitlab"
)]
#[serde(rename_all = "camelCase")]
pub struct ProviderConfigSpec {
    /// Base URL of the GitLab instance, e.g. `https://gitlab.com/`
    pub base_url: String,
    /// Skip TLS certificate verification. Only meant for test instances.
    #[serde(default)]
    pub insecure_skip_verify: bool,
    /// Credentials used to call the GitLab API
    pub credentials: ProviderCredentials,
}

#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProviderCredentials {
    /// Where the credentials are read from
    #[serde(default)]
    pub source: CredentialsSource,
    /// How the credentials are presented to GitLab
    #[serde(default)]
    pub method: CredentialsMethod,
    /// Secret key holding the API token. Required when `source` is `Secret`.
    #[serde(default)]
    pub secret_ref: Option<SecretKeySelector>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub enum CredentialsSource {
    #[default]
    Secret,
}

/// Authentication scheme for the GitLab API
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub enum CredentialsMethod {
    /// Personal, project or group access token sent as `PRIVATE-TOKEN`
    #[default]
    PersonalAccessToken,
    /// OAuth2 token sent as `Authorization: Bearer`
    OAuthToken,
}

/// A key inside a namespaced Kubernetes Secret
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SecretKeySelector {
    pub name: String,
    pub namespace: String,
    pub key: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_config_defaults() {
        let spec: ProviderConfigSpec = serde_json::from_value(serde_json::json!({
            "baseUrl": "https://gitlab.example.com/",
            "credentials": {
                "secretRef": {"name": "gitlab", "namespace": "crossplane-system", "key": "token"}
            }
        }))
        .unwrap();

        assert!(!spec.insecure_skip_verify);
        assert_eq!(spec.credentials.source, CredentialsSource::Secret);
        assert_eq!(
            spec.credentials.method,
            CredentialsMethod::PersonalAccessToken
        );
        assert_eq!(spec.credentials.secret_ref.unwrap().key, "token");
    }
}
