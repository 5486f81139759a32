//! Contact Cache - send-eligibility decisions over a contact send-history table.
//!
//! Given an incoming contact and a destination client, this library decides
//! whether the contact may be sent, based on duplicate-suppression rules,
//! exclusivity locks shared across clients and categories, and rolling or
//! calendar-aligned volume limits.
//!
//! # Architecture
//!
//! - **domain**: Matching/scope bit flags, phone normalization, address tuples
//! - **models**: Contacts, clients, send-history rows and rule configuration
//! - **interval**: Duration parsing, window boundaries and the clock
//! - **query**: Filter groups, predicate composition and SQL rendering
//! - **repositories**: The event store (PostgreSQL and in-memory) and read routing
//! - **services**: The match engine and the retention maintainer
//! - **observability**: Query and decision metrics
//! - **error**: Custom error types for precise error handling
//! - **config**: Configuration management from environment variables

pub mod config;
pub mod domain;
pub mod error;
pub mod interval;
pub mod models;
pub mod observability;
pub mod query;
pub mod repositories;
pub mod services;

pub use config::Config;
pub use domain::{E164PhoneNormalizer, Matching, PhoneNormalizer, Scope};
pub use error::{CacheError, CacheResult, ConfigError, StoreError, StoreResult};
pub use interval::{Clock, FixedClock, IntervalResolver, SystemClock};
pub use models::{CacheRecord, Contact, ContactClient, DuplicateRule, LimitHit, LimitRule, RecordRef};
pub use observability::MetricsTracker;
pub use repositories::{CacheStore, ConnectionRouter, MemoryCacheRepository, PgCacheRepository, PgRouter};
pub use services::{MatchEngine, MatchService, MaintenanceReport, RetentionMaintainer, RetentionService};
