//! GitLab REST Client
//!
//! Native REST implementation of the GitLab project access token API (v4).
//! Uses reqwest with rustls (no OpenSSL dependencies).
//!
//! References:
//! - [Project access tokens API](https://docs.gitlab.com/ee/api/project_access_tokens.html)

mod operations;
mod requests;
mod responses;

pub use requests::*;
pub use responses::*;

use anyhow::{Context, Result};
use reqwest::{Client, Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::info;
use zeroize::Zeroizing;

use crate::client::{ClientConfig, ClientError};
use crate::constants::GITLAB_API_PREFIX;
use crate::crd::CredentialsMethod;

/// GitLab REST client
pub struct GitlabClient {
    http_client: Client,
    base_url: String,
    token: Zeroizing<String>,
    method: CredentialsMethod,
}

impl std::fmt::Debug for GitlabClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitlabClient")
            .field("base_url", &self.base_url)
            .field("method", &self.method)
            .finish_non_exhaustive()
    }
}

impl GitlabClient {
    /// Create a new GitLab REST client
    ///
    /// Every request is bound by `config.request_timeout`. A timed out or
    /// dropped request is aborted and never retried here.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built
    pub fn new(config: ClientConfig) -> Result<Self> {
        let base_url = api_base_url(&config.base_url);
        info!("Initializing GitLab REST client for {}", base_url);

        let http_client = Client::builder()
            .timeout(config.request_timeout)
            .danger_accept_invalid_certs(config.insecure_skip_verify)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            http_client,
            base_url,
            token: config.token,
            method: config.method,
        })
    }

    /// Build HTTP request with authentication headers
    pub(crate) fn make_request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));

        let request = self.http_client.request(method, &url);
        match self.method {
            CredentialsMethod::PersonalAccessToken => {
                request.header("PRIVATE-TOKEN", self.token.as_str())
            }
            CredentialsMethod::OAuthToken => request.bearer_auth(self.token.as_str()),
        }
    }

    /// Decode a successful response body or map the failure
    pub(crate) async fn read_json<T: DeserializeOwned>(
        response: Response,
    ) -> Result<T, ClientError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response.json().await?);
        }
        Err(Self::read_error(status, response).await)
    }

    /// Map a non-success response to a [`ClientError`]
    pub(crate) async fn read_error(status: StatusCode, response: Response) -> ClientError {
        if status == StatusCode::NOT_FOUND {
            return ClientError::NotFound;
        }
        let error_text = response.text().await.unwrap_or_default();
        handle_error_response(status, &error_text)
    }
}

/// Handle GitLab API error responses
pub(crate) fn handle_error_response(status: StatusCode, error_text: &str) -> ClientError {
    let message = serde_json::from_str::<GitlabErrorResponse>(error_text)
        .ok()
        .and_then(|e| e.describe())
        .unwrap_or_else(|| error_text.to_string());

    ClientError::Api {
        status: status.as_u16(),
        message,
    }
}

/// Normalize a configured instance URL to the v4 API root
fn api_base_url(base_url: &str) -> String {
    let trimmed = base_url.trim_end_matches('/');
    if trimmed.ends_with(GITLAB_API_PREFIX) {
        trimmed.to_string()
    } else {
        format!("{trimmed}{GITLAB_API_PREFIX}")
    }
}

/// Percent-encode a project ID or `namespace/project` path for use as a single path segment
pub(crate) fn encode_project_id(project_id: &str) -> String {
    urlencoding::encode(project_id).into_owned()
}

/// Path of the access token collection of a project
pub(crate) fn access_tokens_path(project_id: &str) -> String {
    format!("projects/{}/access_tokens", encode_project_id(project_id))
}

/// Path of a single access token
pub(crate) fn access_token_path(project_id: &str, token_id: i64) -> String {
    format!("{}/{token_id}", access_tokens_path(project_id))
}
