//! Compose filter groups into one predicate.

use super::filter_group::{FilterGroup, Gate};
use super::predicate::{Column, Predicate};
use chrono::{DateTime, Utc};

/// Compose an ordered list of groups into a single predicate.
///
/// Window-gated groups each become one top-level clause:
/// `contactclient_id = id AND date_added >= since [AND expression]`.
/// Expiration-gated groups pool their expressions into one shared OR, gated
/// once by `exclusive_expire_date IS NOT NULL AND exclusive_expire_date >= floor`
/// using the floor of the first such group. Top-level clauses are OR'ed.
///
/// Returns `None` when there is nothing to ask, which callers must treat as
/// "no query needed" rather than "match everything".
pub fn compose(groups: &[FilterGroup]) -> Option<Predicate> {
    let mut clauses = Vec::with_capacity(groups.len() + 1);
    let mut expiration_floor = None;
    let mut gated = Vec::new();

    for group in groups {
        match group.gate() {
            Gate::Window {
                contactclient_id,
                since,
            } => {
                let mut clause = vec![
                    Predicate::eq(Column::ContactClientId, contactclient_id),
                    Predicate::gte(Column::DateAdded, since),
                ];
                clause.extend(group.expression());
                clauses.push(Predicate::and(clause));
            }
            Gate::Expiration { floor } => {
                expiration_floor.get_or_insert(floor);
                gated.extend(group.expression());
            }
        }
    }

    if let (Some(floor), false) = (expiration_floor, gated.is_empty()) {
        clauses.push(Predicate::and(vec![
            Predicate::is_not_null(Column::ExclusiveExpireDate),
            Predicate::gte(Column::ExclusiveExpireDate, floor),
            Predicate::or(gated),
        ]));
    }

    if clauses.is_empty() {
        None
    } else {
        Some(Predicate::or(clauses))
    }
}

/// Rows older than the retention cutoff.
pub fn retention_predicate(cutoff: DateTime<Utc>) -> Predicate {
    Predicate::lt(Column::DateAdded, cutoff)
}

/// Rows whose exclusivity lock has lapsed at `now`.
pub fn expired_exclusivity_predicate(now: DateTime<Utc>) -> Predicate {
    Predicate::and(vec![
        Predicate::is_not_null(Column::ExclusiveExpireDate),
        Predicate::lte(Column::ExclusiveExpireDate, now),
    ])
}

/// Number of top-level clauses in a composed predicate.
pub fn clause_count(predicate: &Predicate) -> usize {
    match predicate {
        Predicate::Or(children) => children.len(),
        _ => 1,
    }
}
