//! # Access Token Controller
//!
//! A Kubernetes controller that reconciles GitLab project access tokens and
//! rotates them before they expire.
//!
//! An `AccessToken` resource describes the desired token. The controller
//! creates it in GitLab, binds the resource to it through the
//! `crossplane.io/external-name` annotation, publishes the plaintext token to
//! a Secret, and rotates it once it enters its rotation window.

pub mod client;
pub mod config;
pub mod constants;
pub mod controller;
pub mod crd;
pub mod error;
pub mod observability;
pub mod runtime;
pub mod server;
