//! # CRD Validation Tests
//!
//! Tests for the CRD types to catch schema drift early.
//! Sample resources are deserialized the way the API server hands them to the controller.

use access_token_controller::crd::{
    AccessLevel, AccessToken, CredentialsMethod, CredentialsSource, DeletionPolicy,
    ProviderConfig,
};
use chrono::{TimeZone, Utc};
use kube::CustomResourceExt;

/// Test an AccessToken with all fields
#[test]
fn test_access_token_with_all_fields() {
    let yaml = r#"
apiVersion: projects.gitlab.crossplane.io/v1alpha1
kind: AccessToken
metadata:
  name: ci-deployer
  annotations:
    crossplane.io/external-name: "1337"
spec:
  forProvider:
    projectId: "1234"
    name: ci-bot
    scopes:
      - read_repository
      - write_registry
    accessLevel: 30
    expiresAt: "2025-01-31T00:00:00Z"
    rotateThreshold: 72h
  providerConfigRef:
    name: gitlab-prod
  writeConnectionSecretToRef:
    name: ci-deployer-token
    namespace: ci
  deletionPolicy: Orphan
status:
  atProvider:
    id: 1337
    name: ci-bot
    revoked: false
    active: true
    expiresAt: "2025-01-31T00:00:00Z"
"#;

    let token: AccessToken =
        serde_yaml::from_str(yaml).expect("Should deserialize AccessToken with all fields");

    let params = &token.spec.for_provider;
    assert_eq!(params.project_id.as_deref(), Some("1234"));
    assert_eq!(params.name, "ci-bot");
    assert_eq!(params.scopes, vec!["read_repository", "write_registry"]);
    assert_eq!(params.access_level, Some(AccessLevel(30)));
    assert_eq!(
        params.expires_at,
        Some(Utc.with_ymd_and_hms(2025, 1, 31, 0, 0, 0).unwrap())
    );
    assert_eq!(
        params.effective_rotate_threshold().unwrap(),
        chrono::TimeDelta::hours(72)
    );

    assert_eq!(token.spec.provider_config_ref.name, "gitlab-prod");
    let secret_ref = token.spec.write_connection_secret_to_ref.as_ref().unwrap();
    assert_eq!(secret_ref.name, "ci-deployer-token");
    assert_eq!(secret_ref.namespace, "ci");
    assert_eq!(token.spec.deletion_policy, DeletionPolicy::Orphan);

    let at_provider = &token.status.as_ref().unwrap().at_provider;
    assert_eq!(at_provider.token_id, Some(1337));
    assert!(!at_provider.is_revoked());
}

/// Test an AccessToken with only the required fields
#[test]
fn test_access_token_defaults() {
    let yaml = r#"
apiVersion: projects.gitlab.crossplane.io/v1alpha1
kind: AccessToken
metadata:
  name: minimal
spec:
  forProvider:
    projectId: "1234"
"#;

    let token: AccessToken = serde_yaml::from_str(yaml).expect("Should deserialize minimal AccessToken");

    assert_eq!(token.spec.provider_config_ref.name, "default");
    assert_eq!(token.spec.deletion_policy, DeletionPolicy::Delete);
    assert!(token.spec.write_connection_secret_to_ref.is_none());
    assert!(token.spec.for_provider.scopes.is_empty());
    assert!(token.spec.for_provider.rotate_threshold.is_none());
    assert!(token.status.is_none());
}

/// Unset optional parameters must not be written back as nulls
#[test]
fn test_access_token_parameters_skip_unset_fields() {
    let yaml = r#"
projectId: "1234"
scopes: [api]
"#;
    let params: access_token_controller::crd::AccessTokenParameters =
        serde_yaml::from_str(yaml).unwrap();

    let json = serde_json::to_value(&params).unwrap();
    assert_eq!(
        json,
        serde_json::json!({"projectId": "1234", "scopes": ["api"], "name": ""})
    );
}

/// Test a ProviderConfig with a secret reference
#[test]
fn test_provider_config_with_secret_ref() {
    let yaml = r#"
apiVersion: gitlab.crossplane.io/v1beta1
kind: ProviderConfig
metadata:
  name: default
spec:
  baseUrl: https://gitlab.example.com/
  insecureSkipVerify: true
  credentials:
    source: Secret
    method: OAuthToken
    secretRef:
      name: gitlab-credentials
      namespace: crossplane-system
      key: token
"#;

    let config: ProviderConfig =
        serde_yaml::from_str(yaml).expect("Should deserialize ProviderConfig");

    assert_eq!(config.spec.base_url, "https://gitlab.example.com/");
    assert!(config.spec.insecure_skip_verify);
    assert_eq!(config.spec.credentials.source, CredentialsSource::Secret);
    assert_eq!(config.spec.credentials.method, CredentialsMethod::OAuthToken);

    let selector = config.spec.credentials.secret_ref.as_ref().unwrap();
    assert_eq!(selector.name, "gitlab-credentials");
    assert_eq!(selector.namespace, "crossplane-system");
    assert_eq!(selector.key, "token");
}

#[test]
fn test_provider_config_credentials_method_defaults_to_personal_access_token() {
    let yaml = r#"
apiVersion: gitlab.crossplane.io/v1beta1
kind: ProviderConfig
metadata:
  name: default
spec:
  baseUrl: https://gitlab.com/
  credentials:
    secretRef:
      name: gitlab-credentials
      namespace: crossplane-system
      key: token
"#;

    let config: ProviderConfig = serde_yaml::from_str(yaml).unwrap();

    assert_eq!(config.spec.credentials.source, CredentialsSource::Secret);
    assert_eq!(
        config.spec.credentials.method,
        CredentialsMethod::PersonalAccessToken
    );
    assert!(!config.spec.insecure_skip_verify);
}

#[test]
fn test_access_token_rejects_unknown_deletion_policy() {
    let yaml = r#"
apiVersion: projects.gitlab.crossplane.io/v1alpha1
kind: AccessToken
metadata:
  name: bad
spec:
  forProvider:
    projectId: "1234"
  deletionPolicy: Keep
"#;

    assert!(serde_yaml::from_str::<AccessToken>(yaml).is_err());
}

#[test]
fn test_generated_crds() {
    let crd = AccessToken::crd();
    assert_eq!(crd.spec.group, "projects.gitlab.crossplane.io");
    assert_eq!(crd.spec.names.kind, "AccessToken");
    assert_eq!(crd.spec.names.plural, "accesstokens");
    assert_eq!(crd.spec.scope, "Cluster");
    let version = &crd.spec.versions[0];
    assert_eq!(version.name, "v1alpha1");
    assert!(version.subresources.as_ref().unwrap().status.is_some());

    let crd = ProviderConfig::crd();
    assert_eq!(crd.spec.group, "gitlab.crossplane.io");
    assert_eq!(crd.spec.names.kind, "ProviderConfig");
    assert_eq!(crd.spec.scope, "Cluster");
    assert_eq!(crd.spec.versions[0].name, "v1beta1");
}
