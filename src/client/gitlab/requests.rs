//! # Request Types
//!
//! GitLab REST API request structures.

use chrono::NaiveDate;
use serde::Serialize;

use crate::crd::AccessTokenParameters;

/// Request body for `POST /projects/:id/access_tokens`
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CreateProjectAccessTokenOptions {
    pub name: String,
    pub scopes: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_level: Option<i64>,
    /// Sent as `YYYY-MM-DD`; GitLab drops the time of day
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<NaiveDate>,
}

impl CreateProjectAccessTokenOptions {
    /// Build creation options from the desired state. Unset optional fields are
    /// left for GitLab to default.
    #[must_use]
    pub fn from_parameters(name: &str, params: &AccessTokenParameters) -> Self {
        Self {
            name: name.to_string(),
            scopes: params.scopes.clone(),
            access_level: params.access_level.map(|level| level.0),
            expires_at: params.expires_at.map(|t| t.date_naive()),
        }
    }
}

/// Request body for `POST /projects/:id/access_tokens/:token_id/rotate`
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RotateProjectAccessTokenOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<NaiveDate>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crd::AccessLevel;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_create_options_skip_unset_fields() {
        let params = AccessTokenParameters {
            scopes: vec!["read_repository".to_string()],
            ..Default::default()
        };
        let body =
            serde_json::to_value(CreateProjectAccessTokenOptions::from_parameters("ci", &params))
                .unwrap();

        assert_eq!(
            body,
            serde_json::json!({"name": "ci", "scopes": ["read_repository"]})
        );
    }

    #[test]
    fn test_create_options_send_day_granularity_expiry() {
        let params = AccessTokenParameters {
            access_level: Some(AccessLevel::REPORTER),
            expires_at: Some(Utc.with_ymd_and_hms(2024, 6, 1, 15, 30, 0).unwrap()),
            ..Default::default()
        };
        let body =
            serde_json::to_value(CreateProjectAccessTokenOptions::from_parameters("ci", &params))
                .unwrap();

        assert_eq!(body["expires_at"], "2024-06-01");
        assert_eq!(body["access_level"], 20);
    }
}
