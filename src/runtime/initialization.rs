//! # Initialization
//!
//! Controller initialization: rustls setup, tracing, metrics, server startup
//! and Kubernetes client setup.

use anyhow::{Context as _, Result};
use kube::{api::Api, Client};
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::client::{new_access_token_client, ClientFactory};
use crate::config::ControllerConfig;
use crate::controller::connector::{Connector, KubeConfigSource};
use crate::controller::managed::Context;
use crate::crd::AccessToken;
use crate::observability;
use crate::server::{start_server, ServerState};

/// Everything the watch loop needs
pub struct InitializationResult {
    pub tokens: Api<AccessToken>,
    pub context: Arc<Context>,
    pub server_state: Arc<ServerState>,
}

impl std::fmt::Debug for InitializationResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InitializationResult")
            .field("context", &self.context)
            .finish_non_exhaustive()
    }
}

fn init_tracing(config: &ControllerConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "access_token_controller=info".into());

    if config.json_logs() {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

/// Initialize the controller runtime
///
/// # Errors
/// Returns an error if metrics cannot be registered or no Kubernetes client can be built
pub async fn initialize() -> Result<InitializationResult> {
    // Must happen before anything opens a TLS connection
    let crypto_installed = rustls::crypto::ring::default_provider()
        .install_default()
        .is_ok();

    let config = ControllerConfig::from_env();
    init_tracing(&config);

    if !crypto_installed {
        warn!("rustls crypto provider was already installed");
    }

    info!("Starting Access Token Controller");
    info!(
        "Build info: datetime={}, git_hash={}",
        env!("BUILD_DATETIME"),
        env!("BUILD_GIT_HASH")
    );
    info!("Configuration: {:?}", config);

    observability::metrics::register_metrics().context("Failed to register metrics")?;

    let server_state = Arc::new(ServerState::default());
    let server_state_clone = server_state.clone();
    let server_port = config.metrics_port;
    tokio::spawn(async move {
        if let Err(e) = start_server(server_port, server_state_clone).await {
            error!("HTTP server error: {}", e);
        }
    });

    let client = Client::try_default()
        .await
        .context("Failed to create Kubernetes client")?;

    let config_source = Arc::new(KubeConfigSource::new(client.clone(), config.request_timeout()));
    let new_client: ClientFactory = Arc::new(new_access_token_client);
    let connector = Connector::new(config_source, new_client);

    let tokens: Api<AccessToken> = Api::all(client.clone());
    let context = Arc::new(Context::new(
        client,
        connector,
        config,
        Arc::clone(&server_state),
    ));

    info!("Controller initialized, starting watch loop...");

    Ok(InitializationResult {
        tokens,
        context,
        server_state,
    })
}
