//! # Connection Secret
//!
//! Publishes connection details to the Secret named by `writeConnectionSecretToRef`.

use k8s_openapi::api::core::v1::Secret;
use k8s_openapi::ByteString;
use kube::api::{Api, ObjectMeta, Patch, PatchParams};
use std::collections::BTreeMap;
use tracing::debug;

use crate::constants::{CONNECTION_SECRET_TYPE, FIELD_MANAGER};
use crate::controller::external::ConnectionDetails;
use crate::crd::SecretReference;

/// Label naming the managed resource a connection secret belongs to
pub const LABEL_MANAGED_RESOURCE: &str = "gitlab.crossplane.io/access-token";

/// Secret holding `details`, labelled with the managed resource that produced it
#[must_use]
pub fn build_connection_secret(
    secret_ref: &SecretReference,
    resource_name: &str,
    details: &ConnectionDetails,
) -> Secret {
    let data: BTreeMap<String, ByteString> = details
        .iter()
        .map(|(k, v)| (k.to_string(), ByteString(v.to_vec())))
        .collect();

    Secret {
        metadata: ObjectMeta {
            name: Some(secret_ref.name.clone()),
            namespace: Some(secret_ref.namespace.clone()),
            labels: Some(BTreeMap::from([(
                LABEL_MANAGED_RESOURCE.to_string(),
                resource_name.to_string(),
            )])),
            ..Default::default()
        },
        type_: Some(CONNECTION_SECRET_TYPE.to_string()),
        data: Some(data),
        ..Default::default()
    }
}

/// Server-side apply the connection details. Nothing is written when `details` is empty.
///
/// # Errors
/// Returns the Kubernetes API error if the apply fails
pub async fn publish_connection_details(
    client: &kube::Client,
    secret_ref: &SecretReference,
    resource_name: &str,
    details: &ConnectionDetails,
) -> Result<(), kube::Error> {
    if details.is_empty() {
        return Ok(());
    }

    let secrets: Api<Secret> = Api::namespaced(client.clone(), &secret_ref.namespace);
    let secret = build_connection_secret(secret_ref, resource_name, details);

    secrets
        .patch(
            &secret_ref.name,
            &PatchParams::apply(FIELD_MANAGER).force(),
            &Patch::Apply(&secret),
        )
        .await?;

    debug!(
        resource.name = resource_name,
        secret = %format!("{}/{}", secret_ref.namespace, secret_ref.name),
        "Published connection details"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_connection_secret() {
        let secret_ref = SecretReference {
            name: "deployer-token".to_string(),
            namespace: "ci".to_string(),
        };
        let mut details = ConnectionDetails::default();
        details.insert("token", b"glpat-abc".to_vec());

        let secret = build_connection_secret(&secret_ref, "deployer", &details);

        assert_eq!(secret.metadata.name.as_deref(), Some("deployer-token"));
        assert_eq!(secret.metadata.namespace.as_deref(), Some("ci"));
        assert_eq!(secret.type_.as_deref(), Some(CONNECTION_SECRET_TYPE));
        assert_eq!(
            secret.metadata.labels.unwrap().get(LABEL_MANAGED_RESOURCE).map(String::as_str),
            Some("deployer")
        );
        assert_eq!(
            secret.data.unwrap().get("token").map(|b| b.0.as_slice()),
            Some(b"glpat-abc".as_slice())
        );
    }
}
