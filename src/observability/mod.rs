//! # Observability
//!
//! Prometheus metrics collection. Logging goes through `tracing`, set up in `runtime::initialization`.

pub mod metrics;

pub use metrics::*;
