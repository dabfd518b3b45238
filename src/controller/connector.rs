//! # Connector
//!
//! Binds a reconciliation pass to a GitLab client built from the resource's
//! `ProviderConfig`.
//!
//! Resolving the connection profile and building the client are both injected:
//! [`ConfigSource`] reads the profile, [`ClientFactory`] turns it into a client.

use anyhow::{bail, Context as _};
use async_trait::async_trait;
use k8s_openapi::api::core::v1::Secret;
use kube::Api;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use zeroize::Zeroizing;

use crate::client::{ClientConfig, ClientFactory};
use crate::controller::external::{External, ExternalClient};
use crate::controller::resource::ManagedResource;
use crate::crd::{AccessToken, ProviderConfig, ProviderConfigSpec};
use crate::error::{Error, Result};

/// Produces an [`ExternalClient`] for one reconciliation pass
#[async_trait]
pub trait ExternalConnector: Send + Sync {
    type Resource: ManagedResource;
    type External: ExternalClient<Resource = Self::Resource>;

    async fn connect(&self, cr: &Self::Resource) -> Result<Self::External>;
}

/// Resolves a `ProviderConfig` name into a connection profile
#[async_trait]
pub trait ConfigSource: Send + Sync {
    async fn resolve(&self, provider_config_name: &str) -> anyhow::Result<ClientConfig>;
}

/// Reads `ProviderConfig` resources and their credentials Secret from the cluster
pub struct KubeConfigSource {
    client: kube::Client,
    request_timeout: Duration,
}

impl std::fmt::Debug for KubeConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KubeConfigSource")
            .field("request_timeout", &self.request_timeout)
            .finish_non_exhaustive()
    }
}

impl KubeConfigSource {
    #[must_use]
    pub fn new(client: kube::Client, request_timeout: Duration) -> Self {
        Self {
            client,
            request_timeout,
        }
    }
}

#[async_trait]
impl ConfigSource for KubeConfigSource {
    async fn resolve(&self, provider_config_name: &str) -> anyhow::Result<ClientConfig> {
        let provider_configs: Api<ProviderConfig> = Api::all(self.client.clone());
        let provider_config = match provider_configs.get(provider_config_name).await {
            Ok(pc) => pc,
            Err(kube::Error::Api(api_err)) if api_err.code == 404 => {
                bail!("ProviderConfig '{provider_config_name}' not found")
            }
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("cannot get ProviderConfig '{provider_config_name}'"))
            }
        };

        let selector = provider_config
            .spec
            .credentials
            .secret_ref
            .as_ref()
            .with_context(|| {
                format!("ProviderConfig '{provider_config_name}' has no credentials secretRef")
            })?;

        let secrets: Api<Secret> = Api::namespaced(self.client.clone(), &selector.namespace);
        let secret = secrets.get(&selector.name).await.with_context(|| {
            format!(
                "cannot get credentials secret '{}/{}'",
                selector.namespace, selector.name
            )
        })?;
        let data = secret
            .data
            .as_ref()
            .and_then(|d| d.get(&selector.key))
            .with_context(|| {
                format!(
                    "credentials secret '{}/{}' has no key '{}'",
                    selector.namespace, selector.name, selector.key
                )
            })?;

        debug!(
            provider_config = provider_config_name,
            secret = %format!("{}/{}", selector.namespace, selector.name),
            "Resolved GitLab credentials"
        );

        client_config_from(&provider_config.spec, &data.0, self.request_timeout)
    }
}

/// Build a connection profile from a `ProviderConfig` spec and the raw credentials
///
/// # Errors
/// Returns an error if the credentials are empty or not UTF-8
pub fn client_config_from(
    spec: &ProviderConfigSpec,
    credentials: &[u8],
    request_timeout: Duration,
) -> anyhow::Result<ClientConfig> {
    let raw = Zeroizing::new(
        std::str::from_utf8(credentials)
            .context("credentials are not valid UTF-8")?
            .to_string(),
    );
    let token = Zeroizing::new(raw.trim().to_string());
    if token.is_empty() {
        bail!("credentials are empty");
    }

    Ok(ClientConfig {
        base_url: spec.base_url.clone(),
        token,
        method: spec.credentials.method,
        insecure_skip_verify: spec.insecure_skip_verify,
        request_timeout,
    })
}

/// [`ExternalConnector`] for [`AccessToken`] resources
pub struct Connector {
    config_source: Arc<dyn ConfigSource>,
    new_client: ClientFactory,
}

impl std::fmt::Debug for Connector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connector").finish_non_exhaustive()
    }
}

impl Connector {
    #[must_use]
    pub fn new(config_source: Arc<dyn ConfigSource>, new_client: ClientFactory) -> Self {
        Self {
            config_source,
            new_client,
        }
    }
}

#[async_trait]
impl ExternalConnector for Connector {
    type Resource = AccessToken;
    type External = External;

    async fn connect(&self, cr: &AccessToken) -> Result<External> {
        let config = self
            .config_source
            .resolve(cr.provider_config_name())
            .await
            .map_err(Error::Connect)?;
        let client = (self.new_client)(config).map_err(Error::Connect)?;
        Ok(External::new(client))
    }
}
