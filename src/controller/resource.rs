//! # Managed Resources
//!
//! Capabilities the managed reconciler needs from a resource kind.
//!
//! Connectors and external clients name their resource kind through an
//! associated type, so they receive the concrete type and never downcast.

use kube::{Resource, ResourceExt};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::Debug;

use crate::crd::{AccessToken, Condition, DeletionPolicy, SecretReference};

/// Closed set of resource kinds managed by this controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManagedKind {
    AccessToken,
}

impl ManagedKind {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ManagedKind::AccessToken => "AccessToken",
        }
    }
}

/// A cluster-scoped resource whose lifecycle is mirrored by an external record
pub trait ManagedResource:
    Resource<DynamicType = ()> + Clone + Debug + Serialize + DeserializeOwned + Send + Sync + 'static
{
    const KIND: ManagedKind;

    /// Name of the `ProviderConfig` holding the connection profile
    fn provider_config_name(&self) -> &str;

    /// Secret receiving connection details, if any
    fn connection_secret_ref(&self) -> Option<&SecretReference>;

    fn deletion_policy(&self) -> DeletionPolicy;

    fn conditions(&self) -> &[Condition];

    fn conditions_mut(&mut self) -> &mut Vec<Condition>;

    /// Key identifying this resource in logs and backoff state
    fn resource_key(&self) -> String {
        format!("{}/{}", Self::KIND.as_str(), self.name_any())
    }
}

impl ManagedResource for AccessToken {
    const KIND: ManagedKind = ManagedKind::AccessToken;

    fn provider_config_name(&self) -> &str {
        &self.spec.provider_config_ref.name
    }

    fn connection_secret_ref(&self) -> Option<&SecretReference> {
        self.spec.write_connection_secret_to_ref.as_ref()
    }

    fn deletion_policy(&self) -> DeletionPolicy {
        self.spec.deletion_policy
    }

    fn conditions(&self) -> &[Condition] {
        self.status.as_ref().map_or(&[], |s| s.conditions.as_slice())
    }

    fn conditions_mut(&mut self) -> &mut Vec<Condition> {
        &mut self.status.get_or_insert_with(Default::default).conditions
    }
}
