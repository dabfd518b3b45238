//! # CRD Generator
//!
//! Generates the `AccessToken` and `ProviderConfig` CustomResourceDefinitions as YAML.
//!
//! ## Usage
//!
//! ```bash
//! cargo run --bin crdgen > config/crd/crds.yaml
//!
//! # Generate and apply directly
//! cargo run --bin crdgen | kubectl apply -f -
//! ```

use anyhow::{Context, Result};
use kube::core::CustomResourceExt;

use access_token_controller::crd::{AccessToken, ProviderConfig};

fn main() -> Result<()> {
    let access_token = serde_yaml::to_string(&AccessToken::crd())
        .context("Failed to serialize AccessToken CRD")?;
    let provider_config = serde_yaml::to_string(&ProviderConfig::crd())
        .context("Failed to serialize ProviderConfig CRD")?;

    print!("{access_token}---\n{provider_config}");
    Ok(())
}
