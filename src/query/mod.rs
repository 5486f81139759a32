//! Query construction.
//!
//! Rules become [`FilterGroup`]s, groups are composed into one [`Predicate`]
//! tree, and the tree is either rendered to parameterized SQL or evaluated
//! against in-memory rows.

pub mod builder;
pub mod filter_group;
pub mod predicate;
pub mod sql;

pub use builder::{clause_count, compose, expired_exclusivity_predicate, retention_predicate};
pub use filter_group::{dedup_groups, Combinator, FieldValue, FilterGroup, Gate};
pub use predicate::{leading_int, Column, ColumnKind, Comparator, Predicate, Value};
pub use sql::{is_valid_identifier, SqlParam, SqlQuery};
