//! # Rotation Policy
//!
//! Computes the expiration requested from GitLab when a token is rotated,
//! and how long the controller can wait before it has to look again.
//!
//! The next token should live as long as the previous one did, but never less
//! than two rotation thresholds, otherwise it would qualify for rotation again
//! right away. The result is truncated to midnight UTC because GitLab keeps
//! expiry with day granularity, so the requested and reported values agree.

use chrono::{DateTime, NaiveTime, TimeDelta, Utc};
use std::time::Duration;

use crate::crd::AccessTokenObservation;

/// Time to live for the rotated token
#[must_use]
pub fn next_ttl(observed: &AccessTokenObservation, rotate_threshold: Option<TimeDelta>) -> TimeDelta {
    let ttl = observed.total_duration();
    match rotate_threshold {
        Some(threshold) => ttl.max(threshold.checked_mul(2).unwrap_or(TimeDelta::MAX)),
        None => ttl,
    }
}

/// Expiration to request for the rotated token: `now + ttl`, truncated to midnight UTC
#[must_use]
pub fn next_expiration(
    observed: &AccessTokenObservation,
    rotate_threshold: Option<TimeDelta>,
    now: DateTime<Utc>,
) -> DateTime<Utc> {
    let expires_at = now
        .checked_add_signed(next_ttl(observed, rotate_threshold))
        .unwrap_or(DateTime::<Utc>::MAX_UTC);
    truncate_to_day(expires_at)
}

fn truncate_to_day(t: DateTime<Utc>) -> DateTime<Utc> {
    t.date_naive().and_time(NaiveTime::MIN).and_utc()
}

/// How long until the token enters its rotation window, capped at `poll_interval`.
///
/// Used to requeue a healthy token so it is rotated on time even when the
/// poll interval is longer than the remaining life.
#[must_use]
pub fn requeue_after(
    observed: &AccessTokenObservation,
    threshold: TimeDelta,
    poll_interval: Duration,
    now: DateTime<Utc>,
) -> Duration {
    let Some(rotate_at) = observed
        .expires_at
        .and_then(|e| e.checked_sub_signed(threshold.abs()))
    else {
        return poll_interval;
    };

    (rotate_at - now)
        .to_std()
        .map_or(Duration::from_secs(1), |until| {
            until.clamp(Duration::from_secs(1), poll_interval)
        })
}
