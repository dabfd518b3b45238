//! # Errors
//!
//! Error taxonomy for the access token external client.
//!
//! - `Validation` - a required field is missing or the identity binding is malformed.
//!   Never retried internally.
//! - `Transport` - a GitLab API call failed; wrapped with the call that failed.
//! - `Rotation` - the rotate call failed, so the caller can tell "token exists but
//!   rotation failed" apart from "token does not exist".
//! - `Connect` - the connection profile could not be resolved or the client could not be built.
//!
//! "Not found" is not an error at this layer: `observe` and `delete` map
//! [`ClientError::NotFound`] to an absent resource.

use crate::client::ClientError;
use thiserror::Error;

pub const ERR_MISSING_PROJECT_ID: &str = "missing spec.forProvider.projectId";
pub const ERR_EXTERNAL_NAME_NOT_INT: &str = "custom resource external name is not an integer";
pub const ERR_EXTERNAL_NAME_MISSING: &str = "custom resource external name is not set";
pub const ERR_GET_FAILED: &str = "cannot get GitLab access token";
pub const ERR_CREATE_FAILED: &str = "cannot create GitLab access token";
pub const ERR_DELETE_FAILED: &str = "cannot delete GitLab access token";

#[derive(Debug, Error)]
pub enum Error {
    #[error("{0}")]
    Validation(String),

    #[error("{operation}: {source}")]
    Transport {
        operation: &'static str,
        #[source]
        source: ClientError,
    },

    #[error("access token rotation failed: {0}")]
    Rotation(#[source] ClientError),

    #[error("cannot connect to GitLab: {0}")]
    Connect(#[source] anyhow::Error),
}

impl Error {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub(crate) fn transport(operation: &'static str, source: ClientError) -> Self {
        Self::Transport { operation, source }
    }

    /// Short machine-readable reason, used for condition reasons and metric labels
    #[must_use]
    pub fn reason(&self) -> &'static str {
        match self {
            Self::Validation(_) => "ValidationFailed",
            Self::Transport { .. } => "TransportFailed",
            Self::Rotation(_) => "RotationFailed",
            Self::Connect(_) => "ConnectFailed",
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
