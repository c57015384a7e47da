//! HTTP API Module
//!
//! Read surface for operators and the node GUI: status, neighbor snapshots,
//! configuration get/apply, and metrics.

mod metrics;
mod routes;

pub use metrics::Metrics;
pub use routes::run_api_server;
