//! Data models consulted and produced by the match engine.
//!
//! This module contains the contact and client views the engine reads, the
//! send-history row it queries, and the rule configuration it evaluates.

pub mod contact;
pub mod record;
pub mod rule;

pub use contact::{Category, Contact, ContactClient};
pub use record::{CacheRecord, RecordRef};
pub use rule::{DuplicateRule, LimitHit, LimitRule};
