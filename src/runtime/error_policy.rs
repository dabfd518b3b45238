//! # Error Policy
//!
//! Requeue delays for failed reconciliations.

use kube_runtime::controller::Action;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::controller::backoff::BackoffState;
use crate::controller::managed::{Context, ReconcilerError};
use crate::controller::resource::ManagedResource;
use crate::crd::AccessToken;
use crate::observability;

/// Delay used when the backoff state cannot be read
const FALLBACK_BACKOFF_SECS: u64 = 60;

/// Handle reconciliation errors with Fibonacci backoff
///
/// Backoff state is tracked per resource so a failing token does not slow
/// down the others. It is reset by the reconciler after a successful pass.
pub fn error_policy(obj: Arc<AccessToken>, error: &ReconcilerError, ctx: Arc<Context>) -> Action {
    let resource_key = obj.resource_key();

    let error_span = tracing::span!(
        tracing::Level::ERROR,
        "controller.reconciliation_error",
        resource = resource_key.as_str(),
        error = %error
    );
    let _error_guard = error_span.enter();

    error!("Reconciliation error for {}: {}", resource_key, error);
    observability::metrics::increment_reconciliation_errors();

    let (backoff_seconds, error_count) = match ctx.backoff_states.lock() {
        Ok(mut states) => {
            let state = states.entry(resource_key.clone()).or_insert_with(|| {
                BackoffState::new(
                    ctx.config.backoff_min_minutes,
                    ctx.config.backoff_max_minutes,
                )
            });
            state.increment_error();
            (state.backoff.next_backoff_seconds(), state.error_count)
        }
        Err(e) => {
            warn!("Failed to lock backoff_states: {}, using default backoff", e);
            (FALLBACK_BACKOFF_SECS, 0)
        }
    };

    info!(
        "Retrying {} with Fibonacci backoff: {}s (error count: {})",
        resource_key, backoff_seconds, error_count
    );

    Action::requeue(std::time::Duration::from_secs(backoff_seconds))
}
