//! Filter groups: one rule's worth of conditions before composition.

use super::predicate::{Column, Predicate, Value};
use chrono::{DateTime, Utc};
use std::collections::HashSet;

/// How the fields of a group combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Combinator {
    /// Any field matching is enough
    Any,
    /// Every field must match
    All,
}

/// The right-hand side of one field condition.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldValue {
    One(Value),
    /// Integer membership, e.g. every pattern containing a flag
    Set(Vec<i64>),
}

impl From<Value> for FieldValue {
    fn from(value: Value) -> Self {
        FieldValue::One(value)
    }
}

impl From<Vec<i64>> for FieldValue {
    fn from(values: Vec<i64>) -> Self {
        FieldValue::Set(values)
    }
}

/// The constraint every match of a group must also satisfy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Gate {
    /// Same destination client, added at or after `since`
    Window {
        contactclient_id: i64,
        since: DateTime<Utc>,
    },
    /// Exclusivity lock still live at `floor`; shared by every gated group
    Expiration { floor: DateTime<Utc> },
}

/// A named composition of column conditions plus its gate.
///
/// Groups are value objects: two groups with the same combinator, fields (in
/// order) and gate are interchangeable, which is what deduplication relies on.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FilterGroup {
    combinator: Combinator,
    fields: Vec<(Column, FieldValue)>,
    gate: Gate,
}

impl FilterGroup {
    /// A group matching when any field matches.
    pub fn any(gate: Gate) -> Self {
        Self {
            combinator: Combinator::Any,
            fields: Vec::new(),
            gate,
        }
    }

    /// A group matching only when every field matches.
    pub fn all(gate: Gate) -> Self {
        Self {
            combinator: Combinator::All,
            fields: Vec::new(),
            gate,
        }
    }

    /// Set a field, replacing an existing condition on the same column in place.
    pub fn set(&mut self, column: Column, value: impl Into<FieldValue>) {
        let value = value.into();
        match self.fields.iter_mut().find(|(c, _)| *c == column) {
            Some(existing) => existing.1 = value,
            None => self.fields.push((column, value)),
        }
    }

    /// Builder form of [`FilterGroup::set`].
    pub fn with(mut self, column: Column, value: impl Into<FieldValue>) -> Self {
        self.set(column, value);
        self
    }

    pub fn combinator(&self) -> Combinator {
        self.combinator
    }

    pub fn gate(&self) -> Gate {
        self.gate
    }

    pub fn fields(&self) -> &[(Column, FieldValue)] {
        &self.fields
    }

    /// The condition on `column`, if any.
    pub fn get(&self, column: Column) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find(|(c, _)| *c == column)
            .map(|(_, v)| v)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// The group-internal expression, or `None` for a field-less group.
    ///
    /// Each field becomes `column IS NOT NULL AND column = value` (or `IN` for
    /// sets). Zero/blank scalars skip the NOT NULL guard.
    pub fn expression(&self) -> Option<Predicate> {
        if self.fields.is_empty() {
            return None;
        }

        let terms: Vec<Predicate> = self
            .fields
            .iter()
            .map(|(column, value)| match value {
                FieldValue::One(v) if v.is_empty() => Predicate::eq(*column, v.clone()),
                FieldValue::One(v) => Predicate::and(vec![
                    Predicate::is_not_null(*column),
                    Predicate::eq(*column, v.clone()),
                ]),
                FieldValue::Set(values) => Predicate::and(vec![
                    Predicate::is_not_null(*column),
                    Predicate::in_set(*column, values.clone()),
                ]),
            })
            .collect();

        Some(match self.combinator {
            Combinator::Any => Predicate::or(terms),
            Combinator::All => Predicate::and(terms),
        })
    }
}

/// Drop structurally repeated groups, keeping the first occurrence of each.
pub fn dedup_groups(groups: Vec<FilterGroup>) -> Vec<FilterGroup> {
    let mut seen = HashSet::with_capacity(groups.len());
    groups
        .into_iter()
        .filter(|group| seen.insert(group.clone()))
        .collect()
}
