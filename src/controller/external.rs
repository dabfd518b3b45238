//! # External Client
//!
//! Observe, create, update (rotate) and delete a GitLab project access token
//! on behalf of an [`AccessToken`] resource.
//!
//! ## State Machine
//!
//! - **NonExistent** - no external name, or GitLab answers 404. The orchestrator creates.
//! - **Exists, up to date** - not revoked and outside the rotation window. Nothing to do.
//! - **Exists, needs rotation** - revoked or inside the rotation window. The orchestrator updates.
//! - **Gone** - revoked on delete. A 404 on revoke counts as gone.
//!
//! Every method mutates only the resource it is given. Persisting the result
//! is the orchestrator's job.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use kube::{Resource, ResourceExt};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, warn};
use zeroize::Zeroizing;

use crate::client::{
    AccessTokenClient, CreateProjectAccessTokenOptions, ProjectAccessToken,
    RotateProjectAccessTokenOptions,
};
use crate::constants::CONNECTION_SECRET_TOKEN_KEY;
use crate::controller::external_name::{parse_external_name, set_external_name, TokenId};
use crate::controller::late_init::{detect_drift, late_initialize};
use crate::controller::resource::ManagedResource;
use crate::controller::rotation::next_expiration;
use crate::crd::{AccessToken, AccessTokenParameters};
use crate::error::{
    Error, Result, ERR_CREATE_FAILED, ERR_DELETE_FAILED, ERR_EXTERNAL_NAME_MISSING,
    ERR_GET_FAILED, ERR_MISSING_PROJECT_ID,
};

/// Secret values published alongside a managed resource
///
/// Values are wiped from memory on drop and never printed.
#[derive(Clone, Default)]
pub struct ConnectionDetails(BTreeMap<String, Zeroizing<Vec<u8>>>);

impl ConnectionDetails {
    /// Connection details carried by a create or rotate response
    #[must_use]
    pub fn from_token(token: &ProjectAccessToken) -> Self {
        let mut details = Self::default();
        if let Some(value) = &token.token {
            details.insert(CONNECTION_SECRET_TOKEN_KEY, value.as_bytes().to_vec());
        }
        details
    }

    pub fn insert(&mut self, key: &str, value: Vec<u8>) {
        self.0.insert(key.to_string(), Zeroizing::new(value));
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&[u8]> {
        self.0.get(key).map(|v| v.as_slice())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[u8])> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }
}

impl std::fmt::Debug for ConnectionDetails {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map()
            .entries(self.0.keys().map(|k| (k, "***")))
            .finish()
    }
}

/// Outcome of [`ExternalClient::observe`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExternalObservation {
    pub resource_exists: bool,
    pub resource_up_to_date: bool,
    /// Unset desired fields were filled from the observed record
    pub resource_late_initialized: bool,
    /// Immutable caller-set fields that differ from the observed record
    pub drifted_fields: Vec<&'static str>,
}

impl ExternalObservation {
    fn absent() -> Self {
        Self::default()
    }
}

#[derive(Debug, Clone)]
pub struct ExternalCreation {
    pub external_name: TokenId,
    pub connection_details: ConnectionDetails,
}

#[derive(Debug, Clone)]
pub struct ExternalUpdate {
    pub external_name: TokenId,
    pub connection_details: ConnectionDetails,
}

/// Lifecycle operations on the external record of a managed resource
#[async_trait]
pub trait ExternalClient: Send + Sync {
    type Resource: ManagedResource;

    /// Read the external record and refresh the observed state of `cr`
    async fn observe(&self, cr: &mut Self::Resource) -> Result<ExternalObservation>;

    /// Create the external record and bind `cr` to it
    async fn create(&self, cr: &mut Self::Resource) -> Result<ExternalCreation>;

    /// Bring the external record up to date
    async fn update(&self, cr: &mut Self::Resource) -> Result<ExternalUpdate>;

    /// Remove the external record. Idempotent.
    async fn delete(&self, cr: &Self::Resource) -> Result<()>;
}

/// [`ExternalClient`] for GitLab project access tokens
pub struct External {
    client: Arc<dyn AccessTokenClient>,
    now: fn() -> DateTime<Utc>,
}

impl std::fmt::Debug for External {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("External").finish_non_exhaustive()
    }
}

impl External {
    #[must_use]
    pub fn new(client: Arc<dyn AccessTokenClient>) -> Self {
        Self::with_clock(client, Utc::now)
    }

    /// Use a fixed clock for expiry checks and rotation
    #[must_use]
    pub fn with_clock(client: Arc<dyn AccessTokenClient>, now: fn() -> DateTime<Utc>) -> Self {
        Self { client, now }
    }
}

fn require_project_id(params: &AccessTokenParameters) -> Result<&str> {
    params
        .project_id
        .as_deref()
        .filter(|id| !id.is_empty())
        .ok_or_else(|| Error::validation(ERR_MISSING_PROJECT_ID))
}

fn require_token_id(cr: &AccessToken) -> Result<TokenId> {
    parse_external_name(cr.meta())?.ok_or_else(|| Error::validation(ERR_EXTERNAL_NAME_MISSING))
}

/// Name of the token in GitLab: `forProvider.name`, or the resource name when empty
#[must_use]
pub fn token_name(cr: &AccessToken) -> String {
    if cr.spec.for_provider.name.is_empty() {
        cr.name_any()
    } else {
        cr.spec.for_provider.name.clone()
    }
}

#[async_trait]
impl ExternalClient for External {
    type Resource = AccessToken;

    async fn observe(&self, cr: &mut AccessToken) -> Result<ExternalObservation> {
        let Some(token_id) = parse_external_name(cr.meta())? else {
            debug!(resource.name = %cr.name_any(), "No external name, token not created yet");
            return Ok(ExternalObservation::absent());
        };
        let project_id = require_project_id(&cr.spec.for_provider)?.to_string();
        // Read before late-init so the comparison uses what the caller wrote
        let threshold = cr.spec.for_provider.effective_rotate_threshold()?;

        let token = match self
            .client
            .get_project_access_token(&project_id, token_id.0)
            .await
        {
            Ok(token) => token,
            Err(e) if e.is_not_found() => {
                info!(
                    resource.name = %cr.name_any(),
                    project.id = %project_id,
                    token.id = %token_id,
                    "Access token not found in GitLab"
                );
                return Ok(ExternalObservation::absent());
            }
            Err(e) => return Err(Error::transport(ERR_GET_FAILED, e)),
        };

        let drifted_fields = detect_drift(&token_name(cr), &cr.spec.for_provider, &token);
        if !drifted_fields.is_empty() {
            warn!(
                resource.name = %cr.name_any(),
                token.id = %token_id,
                fields = ?drifted_fields,
                "Immutable access token fields differ from GitLab"
            );
        }

        let resource_late_initialized = late_initialize(&mut cr.spec.for_provider, &token);

        let at_provider = &mut cr.status.get_or_insert_with(Default::default).at_provider;
        at_provider.copy_from_token(&token);

        let revoked = at_provider.is_revoked();
        let expiring = at_provider.expires_within_at(threshold, (self.now)());
        if revoked || expiring {
            info!(
                resource.name = %cr.name_any(),
                token.id = %token_id,
                revoked,
                expiring,
                "Access token needs rotation"
            );
        }

        Ok(ExternalObservation {
            resource_exists: true,
            resource_up_to_date: !revoked && !expiring,
            resource_late_initialized,
            drifted_fields,
        })
    }

    async fn create(&self, cr: &mut AccessToken) -> Result<ExternalCreation> {
        let project_id = require_project_id(&cr.spec.for_provider)?.to_string();
        let options = CreateProjectAccessTokenOptions::from_parameters(&token_name(cr), &cr.spec.for_provider);

        let token = self
            .client
            .create_project_access_token(&project_id, &options)
            .await
            .map_err(|e| Error::transport(ERR_CREATE_FAILED, e))?;

        let external_name = TokenId(token.id);
        set_external_name(cr.meta_mut(), external_name);
        cr.status
            .get_or_insert_with(Default::default)
            .at_provider
            .copy_from_token(&token);

        info!(
            resource.name = %cr.name_any(),
            project.id = %project_id,
            token.id = %external_name,
            "Created access token"
        );

        Ok(ExternalCreation {
            external_name,
            connection_details: ConnectionDetails::from_token(&token),
        })
    }

    async fn update(&self, cr: &mut AccessToken) -> Result<ExternalUpdate> {
        let token_id = require_token_id(cr)?;
        let project_id = require_project_id(&cr.spec.for_provider)?.to_string();
        let threshold = cr.spec.for_provider.rotate_threshold()?.map(|d| d.abs());

        let observed = cr
            .status
            .as_ref()
            .map(|s| s.at_provider.clone())
            .unwrap_or_default();
        let expires_at = next_expiration(&observed, threshold, (self.now)());
        let options = RotateProjectAccessTokenOptions {
            expires_at: Some(expires_at.date_naive()),
        };

        let token = self
            .client
            .rotate_project_access_token(&project_id, token_id.0, &options)
            .await
            .map_err(Error::Rotation)?;

        let external_name = TokenId(token.id);
        set_external_name(cr.meta_mut(), external_name);
        cr.status
            .get_or_insert_with(Default::default)
            .at_provider
            .copy_from_token(&token);

        info!(
            resource.name = %cr.name_any(),
            project.id = %project_id,
            previous.id = %token_id,
            token.id = %external_name,
            expires_at = %expires_at.date_naive(),
            "Rotated access token"
        );

        Ok(ExternalUpdate {
            external_name,
            connection_details: ConnectionDetails::from_token(&token),
        })
    }

    async fn delete(&self, cr: &AccessToken) -> Result<()> {
        let token_id = require_token_id(cr)?;
        let project_id = require_project_id(&cr.spec.for_provider)?;

        match self
            .client
            .revoke_project_access_token(project_id, token_id.0)
            .await
        {
            Ok(()) => {
                info!(resource.name = %cr.name_any(), token.id = %token_id, "Revoked access token");
                Ok(())
            }
            Err(e) if e.is_not_found() => {
                debug!(resource.name = %cr.name_any(), token.id = %token_id, "Access token already gone");
                Ok(())
            }
            Err(e) => Err(Error::transport(ERR_DELETE_FAILED, e)),
        }
    }
}
