//! # HTTP Server
//!
//! Metrics and health endpoints:
//! - `/metrics` - Prometheus text exposition of [`REGISTRY`]
//! - `/healthz` - liveness, always 200
//! - `/readyz` - 200 while the `AccessToken` watch is running, 503 otherwise.
//!   The JSON body also reports whether any `ProviderConfig` has produced a
//!   working GitLab client yet.
//!
//! Listens on `METRICS_PORT` (5000 by default).

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use prometheus::{Encoder, TextEncoder};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::observability::metrics::REGISTRY;

/// Readiness flags shared between the controller and the health endpoints
#[derive(Debug, Default)]
pub struct ServerState {
    watching: AtomicBool,
    gitlab_connected: AtomicBool,
}

/// Body of `/readyz`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Readiness {
    pub watching: bool,
    pub gitlab_connected: bool,
}

impl ServerState {
    /// Mark the `AccessToken` watch as running or stopped
    pub fn set_ready(&self, ready: bool) {
        self.watching.store(ready, Ordering::Relaxed);
    }

    /// Record that a GitLab client was built from a `ProviderConfig`
    pub fn mark_gitlab_connected(&self) {
        if !self.gitlab_connected.swap(true, Ordering::Relaxed) {
            info!("First GitLab connection established");
        }
    }

    #[must_use]
    pub fn readiness(&self) -> Readiness {
        Readiness {
            watching: self.watching.load(Ordering::Relaxed),
            gitlab_connected: self.gitlab_connected.load(Ordering::Relaxed),
        }
    }
}

pub fn router(state: Arc<ServerState>) -> Router {
    Router::new()
        .route("/metrics", get(metrics))
        .route("/healthz", get(|| async { StatusCode::OK }))
        .route("/readyz", get(readyz))
        .with_state(state)
}

#[allow(clippy::missing_errors_doc, reason = "Fails only if the port cannot be bound")]
pub async fn start_server(port: u16, state: Arc<ServerState>) -> Result<(), anyhow::Error> {
    let listener = TcpListener::bind(("0.0.0.0", port)).await?;
    info!(port, "Metrics and health server listening");
    axum::serve(listener, router(state)).await?;
    Ok(())
}

async fn metrics() -> Result<impl IntoResponse, (StatusCode, String)> {
    let mut body = Vec::new();
    TextEncoder::new()
        .encode(&REGISTRY.gather(), &mut body)
        .map_err(|e| {
            error!("Failed to encode metrics: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, format!("cannot encode metrics: {e}"))
        })?;
    Ok((
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
        body,
    ))
}

async fn readyz(State(state): State<Arc<ServerState>>) -> impl IntoResponse {
    let readiness = state.readiness();
    let status = if readiness.watching {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(readiness))
}
