//! # AccessToken Status
//!
//! Observed state of a GitLab project access token.
//!
//! The observation is pure data: every value in it is authoritative from GitLab
//! and it is rebuilt from scratch on every observe. The plaintext token is never
//! part of it.

use chrono::{DateTime, TimeDelta, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::client::ProjectAccessToken;
use crate::constants::DEFAULT_ACCESS_TOKEN_MAX_DURATION_DAYS;
use crate::crd::Condition;

#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AccessTokenStatus {
    #[serde(default)]
    pub conditions: Vec<Condition>,
    #[serde(default)]
    pub at_provider: AccessTokenObservation,
}

/// Access token as last reported by GitLab
#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AccessTokenObservation {
    #[serde(default, rename = "id", skip_serializing_if = "Option::is_none")]
    pub token_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revoked: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
}

/// Lifetime assumed when the total duration of a token cannot be derived
#[must_use]
pub fn default_max_duration() -> TimeDelta {
    TimeDelta::days(DEFAULT_ACCESS_TOKEN_MAX_DURATION_DAYS)
}

impl AccessTokenObservation {
    /// True if GitLab has reported the token as revoked. Unknown means not revoked.
    #[must_use]
    pub fn is_revoked(&self) -> bool {
        self.revoked.unwrap_or(false)
    }

    /// True if GitLab reported an expiration and it falls within `d` from now
    #[must_use]
    pub fn expires_within(&self, d: TimeDelta) -> bool {
        self.expires_within_at(d, Utc::now())
    }

    /// Same as [`expires_within`](Self::expires_within) with an explicit clock.
    ///
    /// The absolute value of `d` is used so a negative threshold cannot invert the check.
    #[must_use]
    pub fn expires_within_at(&self, d: TimeDelta, now: DateTime<Utc>) -> bool {
        let Some(expires_at) = self.expires_at else {
            return false;
        };

        // Underflow means the window reaches back before any representable time
        expires_at
            .checked_sub_signed(d.abs())
            .is_none_or(|rotate_at| rotate_at < now)
    }

    /// How long the token was allowed to live: `expires_at - created_at`.
    ///
    /// Falls back to 365 days when either timestamp is unknown, the maximum
    /// lifetime GitLab allows since milestone 16.0.
    #[must_use]
    pub fn total_duration(&self) -> TimeDelta {
        match (self.expires_at, self.created_at) {
            (Some(expires_at), Some(created_at)) => expires_at.signed_duration_since(created_at),
            _ => default_max_duration(),
        }
    }

    /// Replace the observation with the state reported by GitLab
    pub fn copy_from_token(&mut self, token: &ProjectAccessToken) {
        *self = Self {
            token_id: Some(token.id),
            name: Some(token.name.clone()),
            active: Some(token.active),
            revoked: Some(token.revoked),
            created_at: token.created_at,
            expires_at: token.expires_at_utc(),
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveTime, TimeZone};

    fn midnight_in(days: i64) -> DateTime<Utc> {
        (Utc::now() + TimeDelta::days(days))
            .date_naive()
            .and_time(NaiveTime::MIN)
            .and_utc()
    }

    #[test]
    fn test_is_revoked() {
        let unset = AccessTokenObservation::default();
        assert!(!unset.is_revoked());

        let not_revoked = AccessTokenObservation {
            revoked: Some(false),
            ..Default::default()
        };
        assert!(!not_revoked.is_revoked());

        let revoked = AccessTokenObservation {
            revoked: Some(true),
            ..Default::default()
        };
        assert!(revoked.is_revoked());
    }

    #[test]
    fn test_expires_within_unset_expiry() {
        let observation = AccessTokenObservation::default();
        assert!(!observation.expires_within(TimeDelta::hours(48)));
        assert!(!observation.expires_within(TimeDelta::days(10_000)));
        assert!(!observation.expires_within(TimeDelta::hours(-48)));
    }

    #[test]
    fn test_expires_within_seven_days_48h_threshold() {
        let observation = AccessTokenObservation {
            expires_at: Some(midnight_in(7)),
            ..Default::default()
        };
        assert!(!observation.expires_within(TimeDelta::hours(48)));
    }

    #[test]
    fn test_expires_within_seven_days_8d_threshold() {
        let observation = AccessTokenObservation {
            expires_at: Some(midnight_in(7)),
            ..Default::default()
        };
        assert!(observation.expires_within(TimeDelta::days(8)));
    }

    #[test]
    fn test_expires_within_negative_threshold_is_absolute() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let observation = AccessTokenObservation {
            expires_at: Some(now + TimeDelta::days(1)),
            ..Default::default()
        };
        assert!(observation.expires_within_at(TimeDelta::hours(-48), now));
        assert!(!observation.expires_within_at(TimeDelta::hours(-12), now));
    }

    #[test]
    fn test_expires_within_is_strict() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let observation = AccessTokenObservation {
            expires_at: Some(now + TimeDelta::hours(48)),
            ..Default::default()
        };
        // expires_at - 48h == now, which is not strictly before now
        assert!(!observation.expires_within_at(TimeDelta::hours(48), now));
        assert!(observation.expires_within_at(TimeDelta::hours(49), now));
    }

    #[test]
    fn test_total_duration() {
        let jan_1 = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let jan_3 = Utc.with_ymd_and_hms(2024, 1, 3, 0, 0, 0).unwrap();

        assert_eq!(
            AccessTokenObservation::default().total_duration(),
            default_max_duration()
        );

        let expires_only = AccessTokenObservation {
            expires_at: Some(jan_1),
            ..Default::default()
        };
        assert_eq!(expires_only.total_duration(), default_max_duration());

        let created_only = AccessTokenObservation {
            created_at: Some(jan_1),
            ..Default::default()
        };
        assert_eq!(created_only.total_duration(), default_max_duration());

        let both = AccessTokenObservation {
            expires_at: Some(jan_3),
            created_at: Some(jan_1),
            ..Default::default()
        };
        assert_eq!(both.total_duration(), TimeDelta::hours(48));
    }

    #[test]
    fn test_default_max_duration_is_365_days() {
        assert_eq!(default_max_duration(), TimeDelta::hours(365 * 24));
    }

    #[test]
    fn test_observation_serializes_token_id_as_id() {
        let observation = AccessTokenObservation {
            token_id: Some(42),
            ..Default::default()
        };
        let value = serde_json::to_value(&observation).unwrap();
        assert_eq!(value["id"], 42);
        assert!(value.get("revoked").is_none());
    }
}
