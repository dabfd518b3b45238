//! # Response Types
//!
//! GitLab REST API response structures.
//!
//! API Reference: https://docs.gitlab.com/ee/api/project_access_tokens.html

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::Deserialize;
use zeroize::Zeroizing;

/// Project access token as returned by GitLab
///
/// `token` is only present in create and rotate responses.
#[derive(Clone, Deserialize)]
pub struct ProjectAccessToken {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub revoked: bool,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    /// GitLab reports expiry with day granularity (`YYYY-MM-DD`)
    #[serde(default)]
    pub expires_at: Option<NaiveDate>,
    #[serde(default)]
    pub scopes: Vec<String>,
    #[serde(default)]
    pub access_level: i64,
    #[serde(default)]
    pub user_id: Option<i64>,
    #[serde(default, deserialize_with = "deserialize_token")]
    pub token: Option<Zeroizing<String>>,
}

impl ProjectAccessToken {
    /// Expiry as an instant: midnight UTC of the reported day
    #[must_use]
    pub fn expires_at_utc(&self) -> Option<DateTime<Utc>> {
        self.expires_at.map(|d| d.and_time(NaiveTime::MIN).and_utc())
    }
}

impl std::fmt::Debug for ProjectAccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProjectAccessToken")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("revoked", &self.revoked)
            .field("active", &self.active)
            .field("created_at", &self.created_at)
            .field("expires_at", &self.expires_at)
            .field("scopes", &self.scopes)
            .field("access_level", &self.access_level)
            .field("token", &self.token.as_ref().map(|_| "***"))
            .finish_non_exhaustive()
    }
}

fn deserialize_token<'de, D>(deserializer: D) -> Result<Option<Zeroizing<String>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.map(Zeroizing::new))
}

/// GitLab error body: `{"message": ...}` or `{"error": ...}`
#[derive(Debug, Deserialize)]
pub struct GitlabErrorResponse {
    #[serde(default)]
    pub message: Option<serde_json::Value>,
    #[serde(default)]
    pub error: Option<String>,
}

impl GitlabErrorResponse {
    #[must_use]
    pub fn describe(&self) -> Option<String> {
        match (&self.message, &self.error) {
            (Some(serde_json::Value::String(m)), _) => Some(m.clone()),
            (Some(other), _) => Some(other.to_string()),
            (None, Some(e)) => Some(e.clone()),
            (None, None) => None,
        }
    }
}
