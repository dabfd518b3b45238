//! # Access Token Operations
//!
//! Implementation of [`AccessTokenClient`] for the GitLab REST API.

use async_trait::async_trait;
use reqwest::Method;
use std::time::Instant;
use tracing::{debug, info_span, Instrument};

use super::{access_token_path, access_tokens_path, GitlabClient};
use super::{CreateProjectAccessTokenOptions, ProjectAccessToken, RotateProjectAccessTokenOptions};
use crate::client::{AccessTokenClient, ClientError};
use crate::observability::metrics;

/// Record duration and outcome of a GitLab call
fn track<T>(operation: &str, start: Instant, result: &Result<T, ClientError>) {
    metrics::record_gitlab_operation(operation, start.elapsed().as_secs_f64());
    match result {
        Ok(_) | Err(ClientError::NotFound) => {}
        Err(e) => {
            debug!("GitLab {} failed: {}", operation, e);
            metrics::increment_gitlab_operation_errors(operation);
        }
    }
}

#[async_trait]
impl AccessTokenClient for GitlabClient {
    async fn get_project_access_token(
        &self,
        project_id: &str,
        token_id: i64,
    ) -> Result<ProjectAccessToken, ClientError> {
        let span = tracing::debug_span!("gitlab.access_token.get", project.id = project_id, token.id = token_id);
        async move {
            let start = Instant::now();
            let result: Result<ProjectAccessToken, ClientError> = async {
                let response = self
                    .make_request(Method::GET, &access_token_path(project_id, token_id))
                    .send()
                    .await?;
                Self::read_json(response).await
            }
            .await;
            track("get", start, &result);
            result
        }
        .instrument(span)
        .await
    }

    async fn create_project_access_token(
        &self,
        project_id: &str,
        options: &CreateProjectAccessTokenOptions,
    ) -> Result<ProjectAccessToken, ClientError> {
        let span = info_span!("gitlab.access_token.create", project.id = project_id, token.name = %options.name);
        async move {
            let start = Instant::now();
            let result: Result<ProjectAccessToken, ClientError> = async {
                let response = self
                    .make_request(Method::POST, &access_tokens_path(project_id))
                    .json(options)
                    .send()
                    .await?;
                Self::read_json(response).await
            }
            .await;
            track("create", start, &result);
            result
        }
        .instrument(span)
        .await
    }

    async fn rotate_project_access_token(
        &self,
        project_id: &str,
        token_id: i64,
        options: &RotateProjectAccessTokenOptions,
    ) -> Result<ProjectAccessToken, ClientError> {
        let span = info_span!("gitlab.access_token.rotate", project.id = project_id, token.id = token_id);
        async move {
            let start = Instant::now();
            let result: Result<ProjectAccessToken, ClientError> = async {
                let path = format!("{}/rotate", access_token_path(project_id, token_id));
                let response = self
                    .make_request(Method::POST, &path)
                    .json(options)
                    .send()
                    .await?;
                Self::read_json(response).await
            }
            .await;
            track("rotate", start, &result);
            result
        }
        .instrument(span)
        .await
    }

    async fn revoke_project_access_token(
        &self,
        project_id: &str,
        token_id: i64,
    ) -> Result<(), ClientError> {
        let span = info_span!("gitlab.access_token.revoke", project.id = project_id, token.id = token_id);
        async move {
            let start = Instant::now();
            let result: Result<(), ClientError> = async {
                let response = self
                    .make_request(Method::DELETE, &access_token_path(project_id, token_id))
                    .send()
                    .await?;
                let status = response.status();
                if status.is_success() {
                    Ok(())
                } else {
                    Err(Self::read_error(status, response).await)
                }
            }
            .await;
            track("revoke", start, &result);
            result
        }
        .instrument(span)
        .await
    }
}
