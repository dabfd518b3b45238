//! # Controller
//!
//! Reconciliation of GitLab project access tokens.
//!
//! - `managed`: finalizer-driven orchestration of observe, create, update and delete
//! - `external`: GitLab-facing external client and its outcomes
//! - `connector`: builds an external client from the resource's `ProviderConfig`
//! - `late_init`: fills unset desired fields from GitLab and detects drift
//! - `rotation`: expiration of rotated tokens and requeue timing
//! - `external_name`: identity binding stored in the external-name annotation
//! - `secret`: publishing connection details to a Kubernetes Secret
//! - `resource`: capabilities shared by managed resource kinds
//! - `duration`: Kubernetes duration string parsing
//! - `backoff`: Fibonacci backoff for failed reconciliations

pub mod backoff;
pub mod connector;
pub mod duration;
pub mod external;
pub mod external_name;
pub mod late_init;
pub mod managed;
pub mod resource;
pub mod rotation;
pub mod secret;
