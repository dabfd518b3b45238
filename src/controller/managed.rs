//! # Managed Reconciler
//!
//! Drives an [`AccessToken`] through observe, create, update and delete.
//!
//! ## Reconciliation Flow
//!
//! 1. The finalizer is added before anything touches GitLab
//! 2. The connector resolves the `ProviderConfig` and builds a GitLab client
//! 3. **Apply**
//!    - observe the token
//!    - create it if it does not exist, persisting the external name before anything else
//!    - patch the spec if late-initialization filled in defaults
//!    - rotate it if it is revoked or inside its rotation window
//!    - record the observation and the `Ready` / `Synced` conditions
//! 4. **Cleanup** revokes the token unless the deletion policy is `Orphan`
//!
//! Failures are written to the `Synced` condition and handed to the error policy
//! for Fibonacci backoff.

use chrono::Utc;
use kube::api::{Api, Patch, PatchParams};
use kube::{Resource, ResourceExt};
use kube_runtime::controller::Action;
use kube_runtime::finalizer::{self, finalizer, Event};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, error, info, info_span, warn, Instrument};

use crate::config::ControllerConfig;
use crate::constants::{CREATE_REQUEUE_SECS, FINALIZER};
use crate::controller::backoff::BackoffState;
use crate::controller::connector::{Connector, ExternalConnector};
use crate::controller::external::{ConnectionDetails, External, ExternalClient, ExternalObservation};
use crate::controller::external_name::TokenId;
use crate::controller::resource::ManagedResource;
use crate::controller::rotation::requeue_after;
use crate::controller::secret::publish_connection_details;
use crate::crd::{set_condition, AccessToken, AccessTokenStatus, Condition, DeletionPolicy};
use crate::error::Error;
use crate::observability::metrics;
use crate::server::ServerState;

#[derive(Debug, Error)]
pub enum ReconcilerError {
    #[error(transparent)]
    External(#[from] Error),

    #[error("Kubernetes API error: {0}")]
    Kube(#[from] kube::Error),

    #[error("finalizer error: {0}")]
    Finalizer(#[source] Box<finalizer::Error<ReconcilerError>>),
}

/// Shared state of the controller
pub struct Context {
    pub client: kube::Client,
    pub connector: Connector,
    pub config: ControllerConfig,
    /// Backoff state per resource (identified by kind/name)
    pub backoff_states: Mutex<HashMap<String, BackoffState>>,
    /// Readiness reported on `/readyz`
    pub server_state: Arc<ServerState>,
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Context {
    #[must_use]
    pub fn new(
        client: kube::Client,
        connector: Connector,
        config: ControllerConfig,
        server_state: Arc<ServerState>,
    ) -> Self {
        Self {
            client,
            connector,
            config,
            backoff_states: Mutex::new(HashMap::new()),
            server_state,
        }
    }

    async fn connect(&self, cr: &AccessToken) -> Result<External, Error> {
        let external = self.connector.connect(cr).await?;
        self.server_state.mark_gitlab_connected();
        Ok(external)
    }

    /// Forget accumulated backoff after a successful pass
    fn reset_backoff(&self, resource_key: &str) {
        if let Ok(mut states) = self.backoff_states.lock() {
            if let Some(state) = states.get_mut(resource_key) {
                if state.error_count > 0 {
                    debug!(resource = resource_key, "Resetting backoff after success");
                }
                state.reset();
            }
        }
    }
}

/// Drop backoff state of a resource that is going away
fn forget_backoff(states: &Mutex<HashMap<String, BackoffState>>, resource_key: &str) {
    if let Ok(mut states) = states.lock() {
        states.remove(resource_key);
    }
}

/// Reconcile a single `AccessToken`
///
/// # Errors
/// Returns an error if GitLab or the Kubernetes API fails. The error policy decides when to retry.
pub async fn reconcile(token: Arc<AccessToken>, ctx: Arc<Context>) -> Result<Action, ReconcilerError> {
    let start = Instant::now();
    metrics::increment_reconciliations();

    let resource_key = token.resource_key();
    let span = info_span!(
        "reconcile",
        resource.name = %token.name_any(),
        resource.kind = AccessToken::KIND.as_str()
    );

    let api: Api<AccessToken> = Api::all(ctx.client.clone());
    let api_ref = &api;
    let ctx_ref = ctx.as_ref();
    let result = finalizer(&api, FINALIZER, token, |event| async move {
        match event {
            Event::Apply(token) => apply(token, api_ref, ctx_ref).await,
            Event::Cleanup(token) => cleanup(token, api_ref, ctx_ref).await,
        }
    })
    .instrument(span)
    .await
    .map_err(|e| ReconcilerError::Finalizer(Box::new(e)));

    metrics::observe_reconciliation_duration(start.elapsed().as_secs_f64());
    if result.is_ok() {
        ctx.reset_backoff(&resource_key);
    }
    result
}

async fn apply(
    token: Arc<AccessToken>,
    api: &Api<AccessToken>,
    ctx: &Context,
) -> Result<Action, ReconcilerError> {
    let mut cr = (*token).clone();

    let external = match ctx.connect(&cr).await {
        Ok(external) => external,
        Err(e) => return Err(record_failure(api, &mut cr, e).await),
    };

    let observation = match external.observe(&mut cr).await {
        Ok(observation) => observation,
        Err(e) => return Err(record_failure(api, &mut cr, e).await),
    };

    if !observation.resource_exists {
        let creation = match external.create(&mut cr).await {
            Ok(creation) => creation,
            Err(e) => return Err(record_failure(api, &mut cr, e).await),
        };
        // The binding must be stored before anything else can fail
        persist_external_name(api, &cr, creation.external_name).await?;
        publish_or_report(api, ctx, &mut cr, creation.external_name, &creation.connection_details).await?;

        set_condition(cr.conditions_mut(), Condition::creating());
        set_condition(cr.conditions_mut(), Condition::reconcile_success(None));
        patch_status(api, &cr).await?;

        return Ok(Action::requeue(Duration::from_secs(CREATE_REQUEUE_SECS)));
    }

    if observation.resource_late_initialized {
        debug!(resource.name = %cr.name_any(), "Late-initialized spec from GitLab");
        patch_for_provider(api, &cr).await?;
    }

    if !observation.resource_up_to_date {
        let update = match external.update(&mut cr).await {
            Ok(update) => update,
            Err(e) => return Err(record_failure(api, &mut cr, e).await),
        };
        metrics::increment_rotations();
        persist_external_name(api, &cr, update.external_name).await?;
        publish_or_report(api, ctx, &mut cr, update.external_name, &update.connection_details).await?;
    }

    set_condition(cr.conditions_mut(), Condition::available());
    set_condition(
        cr.conditions_mut(),
        Condition::reconcile_success(drift_message(&observation)),
    );
    patch_status(api, &cr).await?;

    let threshold = cr.spec.for_provider.effective_rotate_threshold()?;
    let at_provider = cr.status.unwrap_or_default().at_provider;
    Ok(Action::requeue(requeue_after(
        &at_provider,
        threshold,
        ctx.config.poll_interval(),
        Utc::now(),
    )))
}

async fn cleanup(
    token: Arc<AccessToken>,
    api: &Api<AccessToken>,
    ctx: &Context,
) -> Result<Action, ReconcilerError> {
    let mut cr = (*token).clone();

    if cr.deletion_policy() == DeletionPolicy::Orphan {
        info!(resource.name = %cr.name_any(), "Deletion policy is Orphan, leaving token in GitLab");
        forget_backoff(&ctx.backoff_states, &cr.resource_key());
        return Ok(Action::await_change());
    }

    let external = match ctx.connect(&cr).await {
        Ok(external) => external,
        Err(e) => return Err(record_failure(api, &mut cr, e).await),
    };

    let observation = match external.observe(&mut cr).await {
        Ok(observation) => observation,
        Err(e) => return Err(record_failure(api, &mut cr, e).await),
    };

    if observation.resource_exists {
        set_condition(cr.conditions_mut(), Condition::deleting());
        patch_status(api, &cr).await?;

        let deleted = external.delete(&cr).await;
        if let Err(e) = deleted {
            return Err(record_failure(api, &mut cr, e).await);
        }
    }

    forget_backoff(&ctx.backoff_states, &cr.resource_key());
    Ok(Action::await_change())
}

fn drift_message(observation: &ExternalObservation) -> Option<String> {
    (!observation.drifted_fields.is_empty()).then(|| {
        format!(
            "immutable fields differ from GitLab: {}",
            observation.drifted_fields.join(", ")
        )
    })
}

/// Record the failure in the `Synced` condition and hand it back for the error policy
async fn record_failure(api: &Api<AccessToken>, cr: &mut AccessToken, error: Error) -> ReconcilerError {
    warn!(
        resource.name = %cr.name_any(),
        reason = error.reason(),
        "Reconciliation failed: {}",
        error
    );
    set_condition(cr.conditions_mut(), Condition::reconcile_error(error.to_string()));
    if let Err(e) = patch_status(api, cr).await {
        warn!(resource.name = %cr.name_any(), "Failed to record error in status: {}", e);
    }
    ReconcilerError::External(error)
}

async fn publish(
    ctx: &Context,
    cr: &AccessToken,
    details: &ConnectionDetails,
) -> Result<(), kube::Error> {
    match cr.connection_secret_ref() {
        Some(secret_ref) => {
            publish_connection_details(&ctx.client, secret_ref, &cr.name_any(), details).await
        }
        None => {
            debug!(resource.name = %cr.name_any(), "No connection secret reference, skipping publish");
            Ok(())
        }
    }
}

/// Publish the plaintext of a token GitLab just issued.
///
/// GitLab returns the plaintext only once. If publishing fails, later passes see
/// an up-to-date token and never publish again, so the Secret keeps the previous
/// value until the token is rotated by hand (for example by revoking it in GitLab).
/// Deleting the Secret does not bring the value back.
async fn publish_or_report(
    api: &Api<AccessToken>,
    ctx: &Context,
    cr: &mut AccessToken,
    token_id: TokenId,
    details: &ConnectionDetails,
) -> Result<(), kube::Error> {
    let Err(e) = publish(ctx, cr, details).await else {
        return Ok(());
    };
    let message = lost_token_message(token_id, &e);
    error!(resource.name = %cr.name_any(), token.id = %token_id, "{}", message);
    set_condition(cr.conditions_mut(), Condition::reconcile_error(message));
    if let Err(patch_err) = patch_status(api, cr).await {
        warn!(resource.name = %cr.name_any(), "Failed to record error in status: {}", patch_err);
    }
    Err(e)
}

fn lost_token_message(token_id: TokenId, error: &impl std::fmt::Display) -> String {
    format!(
        "cannot publish connection details of token {token_id}: {error}; \
         the token value is lost, revoke token {token_id} in GitLab to rotate it"
    )
}

async fn persist_external_name(
    api: &Api<AccessToken>,
    cr: &AccessToken,
    id: TokenId,
) -> Result<(), kube::Error> {
    let patch = serde_json::json!({
        "metadata": {
            "annotations": cr.meta().annotations,
        }
    });
    api.patch(&cr.name_any(), &PatchParams::default(), &Patch::Merge(&patch))
        .await?;
    debug!(resource.name = %cr.name_any(), token.id = %id, "Persisted external name");
    Ok(())
}

async fn patch_for_provider(api: &Api<AccessToken>, cr: &AccessToken) -> Result<(), kube::Error> {
    let patch = serde_json::json!({
        "spec": {
            "forProvider": cr.spec.for_provider,
        }
    });
    api.patch(&cr.name_any(), &PatchParams::default(), &Patch::Merge(&patch))
        .await?;
    Ok(())
}

/// Observation fields that a merge patch has to clear explicitly
const AT_PROVIDER_FIELDS: [&str; 6] = ["id", "expiresAt", "createdAt", "name", "revoked", "active"];

/// Merge patch replacing the whole status. Unset observation fields are sent as
/// `null` so stale values do not survive.
fn status_patch(status: &AccessTokenStatus) -> serde_json::Value {
    let mut patch = serde_json::json!({ "status": status });
    if let Some(at_provider) = patch["status"]["atProvider"].as_object_mut() {
        for field in AT_PROVIDER_FIELDS {
            at_provider
                .entry(field)
                .or_insert(serde_json::Value::Null);
        }
    }
    patch
}

async fn patch_status(api: &Api<AccessToken>, cr: &AccessToken) -> Result<(), kube::Error> {
    let Some(status) = cr.status.as_ref() else {
        return Ok(());
    };
    let patch = status_patch(status);
    api.patch_status(&cr.name_any(), &PatchParams::default(), &Patch::Merge(&patch))
        .await?;
    Ok(())
}
