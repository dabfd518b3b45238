//! # Late Initialization
//!
//! Fills desired fields the caller left unset with the values GitLab chose,
//! and reports caller-set fields that no longer match GitLab.

use std::collections::BTreeSet;

use crate::client::ProjectAccessToken;
use crate::crd::{AccessLevel, AccessTokenParameters};

/// Fill unset optional parameters from the observed token.
///
/// Returns true if anything changed. Fields the caller set are never touched.
pub fn late_initialize(params: &mut AccessTokenParameters, token: &ProjectAccessToken) -> bool {
    let before = params.clone();

    if params.access_level.is_none() && token.access_level != 0 {
        params.access_level = Some(AccessLevel(token.access_level));
    }
    if params.expires_at.is_none() {
        params.expires_at = token.expires_at_utc();
    }

    *params != before
}

/// Names of immutable caller-set fields that differ from the observed token.
///
/// `name` is the effective token name: `forProvider.name` or the resource name.
#[must_use]
pub fn detect_drift(
    name: &str,
    params: &AccessTokenParameters,
    token: &ProjectAccessToken,
) -> Vec<&'static str> {
    let mut drifted = Vec::new();

    if name != token.name {
        drifted.push("name");
    }
    if !params.scopes.is_empty()
        && params.scopes.iter().collect::<BTreeSet<_>>() != token.scopes.iter().collect::<BTreeSet<_>>()
    {
        drifted.push("scopes");
    }
    if params
        .access_level
        .is_some_and(|level| level.0 != token.access_level)
    {
        drifted.push("accessLevel");
    }
    // GitLab keeps the day only
    if params
        .expires_at
        .is_some_and(|t| Some(t.date_naive()) != token.expires_at)
    {
        drifted.push("expiresAt");
    }

    drifted
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone, Utc};

    fn observed() -> ProjectAccessToken {
        serde_json::from_value(serde_json::json!({
            "id": 42,
            "name": "deployer",
            "scopes": ["api", "read_repository"],
            "access_level": 40,
            "created_at": "2024-01-01T00:00:00Z",
            "expires_at": "2024-12-31",
            "revoked": false,
            "active": true
        }))
        .unwrap()
    }

    #[test]
    fn test_late_initialize_fills_unset_fields() {
        let mut params = AccessTokenParameters::default();

        assert!(late_initialize(&mut params, &observed()));
        assert_eq!(params.access_level, Some(AccessLevel::MAINTAINER));
        assert_eq!(
            params.expires_at,
            Some(Utc.with_ymd_and_hms(2024, 12, 31, 0, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_late_initialize_is_idempotent() {
        let mut params = AccessTokenParameters::default();
        assert!(late_initialize(&mut params, &observed()));

        let snapshot = params.clone();
        assert!(!late_initialize(&mut params, &observed()));
        assert_eq!(params, snapshot);
    }

    #[test]
    fn test_late_initialize_keeps_caller_values() {
        let expires_at = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let mut params = AccessTokenParameters {
            access_level: Some(AccessLevel::DEVELOPER),
            expires_at: Some(expires_at),
            ..Default::default()
        };

        assert!(!late_initialize(&mut params, &observed()));
        assert_eq!(params.access_level, Some(AccessLevel::DEVELOPER));
        assert_eq!(params.expires_at, Some(expires_at));
    }

    #[test]
    fn test_late_initialize_ignores_missing_expiry() {
        let mut token = observed();
        token.expires_at = None;
        let mut params = AccessTokenParameters {
            access_level: Some(AccessLevel::MAINTAINER),
            ..Default::default()
        };

        assert!(!late_initialize(&mut params, &token));
        assert!(params.expires_at.is_none());
    }

    #[test]
    fn test_detect_drift_none_when_matching() {
        let params = AccessTokenParameters {
            scopes: vec!["read_repository".to_string(), "api".to_string()],
            access_level: Some(AccessLevel::MAINTAINER),
            expires_at: Some(Utc.with_ymd_and_hms(2024, 12, 31, 0, 0, 0).unwrap()),
            ..Default::default()
        };
        assert!(detect_drift("deployer", &params, &observed()).is_empty());
    }

    #[test]
    fn test_detect_drift_reports_changed_fields() {
        let params = AccessTokenParameters {
            scopes: vec!["api".to_string()],
            access_level: Some(AccessLevel::OWNER),
            expires_at: Some(Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()),
            ..Default::default()
        };

        assert_eq!(
            detect_drift("renamed", &params, &observed()),
            vec!["name", "scopes", "accessLevel", "expiresAt"]
        );
    }

    #[test]
    fn test_detect_drift_skips_unset_fields() {
        let mut token = observed();
        token.expires_at = Some(NaiveDate::from_ymd_opt(2030, 1, 1).unwrap());
        assert!(detect_drift("deployer", &AccessTokenParameters::default(), &token).is_empty());
    }
}
