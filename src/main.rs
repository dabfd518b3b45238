//! # Access Token Controller
//!
//! Watches `AccessToken` resources and keeps the matching GitLab project access
//! tokens created, up to date and rotated.
//!
//! ## Features
//!
//! - **Rotation**: tokens are rotated before `expiresAt - rotateThreshold`
//! - **Late initialization**: defaults chosen by GitLab are written back to the spec
//! - **Connection secrets**: the plaintext token is published on create and rotate
//! - **Prometheus metrics**: reconciliation and GitLab API metrics on `/metrics`
//! - **Health checks**: `/healthz` and `/readyz`

use anyhow::Result;
use access_token_controller::runtime::{initialization::initialize, watch_loop::run_watch_loop};

#[tokio::main]
async fn main() -> Result<()> {
    let init = initialize().await?;

    run_watch_loop(init.tokens, init.context, init.server_state).await;

    Ok(())
}
