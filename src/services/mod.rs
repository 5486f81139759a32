//! Application service layer.
//!
//! Services hold the decision logic and orchestrate the interval resolver,
//! phone normalizer and store. They are the boundary callers such as a
//! send-eligibility service or a maintenance scheduler talk to.

mod match_service;
mod retention_service;

pub use match_service::{MatchEngine, MatchService};
pub use retention_service::{MaintenanceReport, RetentionMaintainer, RetentionService};
