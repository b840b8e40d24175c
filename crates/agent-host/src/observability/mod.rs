//! Observability for Agent Host.

pub mod metrics;
