//! Observability module for monitoring and metrics.
//!
//! Counters for store round trips, decision outcomes and maintenance work,
//! alongside the structured `tracing` events emitted by the services.

pub mod metrics;

pub use metrics::{Decision, MetricsTracker, Timer};
