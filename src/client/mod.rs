//! # GitLab Client
//!
//! Transport seam for GitLab project access token operations.
//!
//! The controller only talks to GitLab through [`AccessTokenClient`], so the
//! reconciliation logic can be exercised against an in-memory stub. The
//! production implementation is [`gitlab::GitlabClient`], built by
//! [`new_access_token_client`].

pub mod gitlab;

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use zeroize::Zeroizing;

pub use gitlab::{
    CreateProjectAccessTokenOptions, GitlabClient, ProjectAccessToken,
    RotateProjectAccessTokenOptions,
};

use crate::crd::CredentialsMethod;

/// Failure of a single GitLab API call
#[derive(Debug, Error)]
pub enum ClientError {
    /// GitLab answered 404. Callers decide whether that means "absent".
    #[error("404 Not Found")]
    NotFound,

    #[error("GitLab API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
}

impl ClientError {
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound)
    }
}

/// GitLab project access token operations
#[async_trait]
pub trait AccessTokenClient: Send + Sync {
    /// Get a single project access token
    async fn get_project_access_token(
        &self,
        project_id: &str,
        token_id: i64,
    ) -> Result<ProjectAccessToken, ClientError>;

    /// Create a project access token. The response carries the plaintext token.
    async fn create_project_access_token(
        &self,
        project_id: &str,
        options: &CreateProjectAccessTokenOptions,
    ) -> Result<ProjectAccessToken, ClientError>;

    /// Rotate a project access token. GitLab revokes the previous token and
    /// returns a new one carrying the plaintext value.
    async fn rotate_project_access_token(
        &self,
        project_id: &str,
        token_id: i64,
        options: &RotateProjectAccessTokenOptions,
    ) -> Result<ProjectAccessToken, ClientError>;

    /// Revoke a project access token
    async fn revoke_project_access_token(
        &self,
        project_id: &str,
        token_id: i64,
    ) -> Result<(), ClientError>;
}

/// Connection profile resolved from a `ProviderConfig`
#[derive(Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub token: Zeroizing<String>,
    pub method: CredentialsMethod,
    pub insecure_skip_verify: bool,
    pub request_timeout: Duration,
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("token", &"***")
            .field("method", &self.method)
            .field("insecure_skip_verify", &self.insecure_skip_verify)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

/// Builds an [`AccessTokenClient`] from a resolved connection profile
pub type ClientFactory =
    Arc<dyn Fn(ClientConfig) -> anyhow::Result<Arc<dyn AccessTokenClient>> + Send + Sync>;

/// Factory producing the reqwest-backed GitLab client
///
/// # Errors
/// Returns an error if the HTTP client cannot be built
pub fn new_access_token_client(config: ClientConfig) -> anyhow::Result<Arc<dyn AccessTokenClient>> {
    Ok(Arc::new(GitlabClient::new(config)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_config_debug_redacts_token() {
        let config = ClientConfig {
            base_url: "https://gitlab.example.com".to_string(),
            token: Zeroizing::new("glpat-super-secret".to_string()),
            method: CredentialsMethod::PersonalAccessToken,
            insecure_skip_verify: false,
            request_timeout: Duration::from_secs(30),
        };

        let debug = format!("{config:?}");
        assert!(!debug.contains("glpat-super-secret"));
        assert!(debug.contains("***"));
    }
}
