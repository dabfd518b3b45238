//! Common test utilities
//!
//! In-memory `AccessTokenClient` that records every call and answers with
//! configurable replies, plus `AccessToken` fixtures.

#![allow(dead_code, reason = "Each test binary uses a different subset")]

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use std::sync::{Arc, Mutex};

use access_token_controller::client::{
    AccessTokenClient, ClientError, CreateProjectAccessTokenOptions, ProjectAccessToken,
    RotateProjectAccessTokenOptions,
};
use access_token_controller::constants::ANNOTATION_EXTERNAL_NAME;
use access_token_controller::crd::{AccessToken, AccessTokenParameters, AccessTokenSpec};

/// A call received by the stub
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Get {
        project_id: String,
        token_id: i64,
    },
    Create {
        project_id: String,
        options: CreateProjectAccessTokenOptions,
    },
    Rotate {
        project_id: String,
        token_id: i64,
        options: RotateProjectAccessTokenOptions,
    },
    Revoke {
        project_id: String,
        token_id: i64,
    },
}

/// What the stub answers for an operation
#[derive(Debug, Clone)]
pub enum Reply {
    /// Successful response with this JSON body
    Token(serde_json::Value),
    NotFound,
    /// GitLab API error with this HTTP status
    Error(u16),
}

impl Reply {
    fn token(&self) -> Result<ProjectAccessToken, ClientError> {
        match self {
            Reply::Token(body) => Ok(serde_json::from_value(body.clone()).unwrap()),
            Reply::NotFound => Err(ClientError::NotFound),
            Reply::Error(status) => Err(ClientError::Api {
                status: *status,
                message: "stubbed failure".to_string(),
            }),
        }
    }

    fn unit(&self) -> Result<(), ClientError> {
        match self {
            Reply::Token(_) => Ok(()),
            other => other.token().map(|_| ()),
        }
    }
}

#[derive(Debug)]
pub struct StubClient {
    calls: Mutex<Vec<Call>>,
    get: Mutex<Reply>,
    create: Mutex<Reply>,
    rotate: Mutex<Reply>,
    revoke: Mutex<Reply>,
}

impl StubClient {
    /// Every operation fails with HTTP 500 except revoke, which succeeds
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            get: Mutex::new(Reply::Error(500)),
            create: Mutex::new(Reply::Error(500)),
            rotate: Mutex::new(Reply::Error(500)),
            revoke: Mutex::new(Reply::Token(serde_json::Value::Null)),
        })
    }

    pub fn on_get(&self, reply: Reply) {
        *self.get.lock().unwrap() = reply;
    }

    pub fn on_create(&self, reply: Reply) {
        *self.create.lock().unwrap() = reply;
    }

    pub fn on_rotate(&self, reply: Reply) {
        *self.rotate.lock().unwrap() = reply;
    }

    pub fn on_revoke(&self, reply: Reply) {
        *self.revoke.lock().unwrap() = reply;
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl AccessTokenClient for StubClient {
    async fn get_project_access_token(
        &self,
        project_id: &str,
        token_id: i64,
    ) -> Result<ProjectAccessToken, ClientError> {
        self.record(Call::Get {
            project_id: project_id.to_string(),
            token_id,
        });
        self.get.lock().unwrap().token()
    }

    async fn create_project_access_token(
        &self,
        project_id: &str,
        options: &CreateProjectAccessTokenOptions,
    ) -> Result<ProjectAccessToken, ClientError> {
        self.record(Call::Create {
            project_id: project_id.to_string(),
            options: options.clone(),
        });
        self.create.lock().unwrap().token()
    }

    async fn rotate_project_access_token(
        &self,
        project_id: &str,
        token_id: i64,
        options: &RotateProjectAccessTokenOptions,
    ) -> Result<ProjectAccessToken, ClientError> {
        self.record(Call::Rotate {
            project_id: project_id.to_string(),
            token_id,
            options: options.clone(),
        });
        self.rotate.lock().unwrap().token()
    }

    async fn revoke_project_access_token(
        &self,
        project_id: &str,
        token_id: i64,
    ) -> Result<(), ClientError> {
        self.record(Call::Revoke {
            project_id: project_id.to_string(),
            token_id,
        });
        self.revoke.lock().unwrap().unit()
    }
}

/// Fixed clock: 2024-06-01T12:00:00Z
pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
}

/// GitLab response body for a project access token
pub fn token_body(id: i64, created_at: &str, expires_at: &str, revoked: bool) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "name": "deployer",
        "revoked": revoked,
        "active": !revoked,
        "created_at": created_at,
        "expires_at": expires_at,
        "scopes": ["read_repository"],
        "access_level": 40,
        "user_id": 1001
    })
}

/// Same as [`token_body`] with the plaintext token included, as in create and rotate responses
pub fn token_body_with_secret(id: i64, created_at: &str, expires_at: &str, secret: &str) -> serde_json::Value {
    let mut body = token_body(id, created_at, expires_at, false);
    body["token"] = serde_json::Value::String(secret.to_string());
    body
}

/// `AccessToken` named "deployer" with the given project and external name
pub fn access_token(project_id: Option<&str>, external_name: Option<&str>) -> AccessToken {
    let mut cr = AccessToken::new(
        "deployer",
        AccessTokenSpec {
            for_provider: AccessTokenParameters {
                project_id: project_id.map(str::to_string),
                scopes: vec!["read_repository".to_string()],
                ..Default::default()
            },
            provider_config_ref: Default::default(),
            write_connection_secret_to_ref: None,
            deletion_policy: Default::default(),
        },
    );
    if let Some(name) = external_name {
        cr.metadata.annotations = Some(
            [(ANNOTATION_EXTERNAL_NAME.to_string(), name.to_string())]
                .into_iter()
                .collect(),
        );
    }
    cr
}
