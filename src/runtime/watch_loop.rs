//! # Watch Loop
//!
//! Runs the kube-runtime controller over `AccessToken` resources until a
//! shutdown signal is received.

use futures::StreamExt;
use kube::api::Api;
use kube_runtime::{controller, watcher, Controller};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::controller::managed::{reconcile, Context};
use crate::crd::AccessToken;
use crate::runtime::error_policy::error_policy;
use crate::server::ServerState;

/// Run the controller watch loop
///
/// The server is marked ready while the loop runs and not ready once it stops.
pub async fn run_watch_loop(
    tokens: Api<AccessToken>,
    context: Arc<Context>,
    server_state: Arc<ServerState>,
) {
    let concurrency = context.config.max_concurrent_reconciliations;
    info!(
        "Starting controller watch loop (max concurrent reconciliations: {})",
        concurrency
    );
    server_state.set_ready(true);

    Controller::new(tokens, watcher::Config::default().any_semantic())
        .with_config(controller::Config::default().concurrency(concurrency))
        .shutdown_on_signal()
        .run(reconcile, error_policy, context)
        .for_each(|result| {
            match result {
                Ok((obj, action)) => debug!("Reconciled {}: {:?}", obj, action),
                Err(e) => warn!("Reconciliation stream error: {}", e),
            }
            futures::future::ready(())
        })
        .await;

    server_state.set_ready(false);
    info!("Controller stopped gracefully");
}
