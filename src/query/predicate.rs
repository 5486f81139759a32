//! Predicate trees over the send-history table.
//!
//! A `Predicate` is a typed `And`/`Or`/leaf tree. It is rendered to
//! parameterized SQL by [`crate::query::sql`] and evaluated directly against
//! in-memory rows by [`Predicate::matches`], with the same NULL semantics.

use crate::models::CacheRecord;
use chrono::{DateTime, Utc};
use std::fmt;

/// How a column is bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnKind {
    Integer,
    Text,
    Timestamp,
}

/// Columns of the send-history table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Column {
    Id,
    ContactId,
    ContactClientId,
    CampaignId,
    CategoryId,
    Email,
    Phone,
    Mobile,
    Address1,
    Address2,
    City,
    State,
    Zipcode,
    Country,
    UtmSource,
    DateAdded,
    ExclusivePattern,
    ExclusiveScope,
    ExclusiveExpireDate,
}

impl Column {
    /// The SQL column name.
    pub fn name(&self) -> &'static str {
        match self {
            Column::Id => "id",
            Column::ContactId => "contact_id",
            Column::ContactClientId => "contactclient_id",
            Column::CampaignId => "campaign_id",
            Column::CategoryId => "category_id",
            Column::Email => "email",
            Column::Phone => "phone",
            Column::Mobile => "mobile",
            Column::Address1 => "address1",
            Column::Address2 => "address2",
            Column::City => "city",
            Column::State => "state",
            Column::Zipcode => "zipcode",
            Column::Country => "country",
            Column::UtmSource => "utm_source",
            Column::DateAdded => "date_added",
            Column::ExclusivePattern => "exclusive_pattern",
            Column::ExclusiveScope => "exclusive_scope",
            Column::ExclusiveExpireDate => "exclusive_expire_date",
        }
    }

    /// How values for this column are bound.
    pub fn kind(&self) -> ColumnKind {
        match self {
            Column::Id
            | Column::ContactId
            | Column::ContactClientId
            | Column::CampaignId
            | Column::CategoryId
            | Column::ExclusivePattern
            | Column::ExclusiveScope => ColumnKind::Integer,
            Column::DateAdded | Column::ExclusiveExpireDate => ColumnKind::Timestamp,
            _ => ColumnKind::Text,
        }
    }

    /// Read this column from a row; `None` is SQL NULL.
    pub fn value_of(&self, record: &CacheRecord) -> Option<Value> {
        let text = |v: &Option<String>| v.clone().map(Value::Text);
        match self {
            Column::Id => Some(Value::Int(record.id)),
            Column::ContactId => record.contact_id.map(Value::Int),
            Column::ContactClientId => record.contactclient_id.map(Value::Int),
            Column::CampaignId => record.campaign_id.map(Value::Int),
            Column::CategoryId => record.category_id.map(Value::Int),
            Column::Email => text(&record.email),
            Column::Phone => text(&record.phone),
            Column::Mobile => text(&record.mobile),
            Column::Address1 => text(&record.address1),
            Column::Address2 => text(&record.address2),
            Column::City => text(&record.city),
            Column::State => text(&record.state),
            Column::Zipcode => text(&record.zipcode),
            Column::Country => text(&record.country),
            Column::UtmSource => text(&record.utm_source),
            Column::DateAdded => Some(Value::Timestamp(record.date_added)),
            Column::ExclusivePattern => record.exclusive_pattern.map(Value::Int),
            Column::ExclusiveScope => record.exclusive_scope.map(Value::Int),
            Column::ExclusiveExpireDate => record.exclusive_expire_date.map(Value::Timestamp),
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The integer prefix of `value`, or 0 when it has none.
///
/// Leading whitespace and one sign are accepted, so `"12abc"` reads as 12 and
/// `" -3"` as -3. Prefixes too large for `i64` saturate.
pub fn leading_int(value: &str) -> i64 {
    let value = value.trim_start();
    let (negative, rest) = match value.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, value.strip_prefix('+').unwrap_or(value)),
    };

    let len = rest.bytes().take_while(|b| b.is_ascii_digit()).count();
    if len == 0 {
        return 0;
    }

    let magnitude = rest[..len].parse::<i64>().unwrap_or(i64::MAX);
    if negative {
        -magnitude
    } else {
        magnitude
    }
}

/// A bound comparison value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Value {
    Int(i64),
    Text(String),
    Timestamp(DateTime<Utc>),
}

impl Value {
    /// Zero or blank; such values are compared without a NOT NULL guard.
    pub fn is_empty(&self) -> bool {
        match self {
            Value::Int(i) => *i == 0,
            Value::Text(s) => s.is_empty(),
            Value::Timestamp(_) => false,
        }
    }

    /// Coerce to the binding kind of a column.
    ///
    /// Integer columns always bind as integers, reading text by its integer
    /// prefix; text without one binds as 0, which can never match a real
    /// foreign key.
    pub fn coerce(self, kind: ColumnKind) -> Value {
        match (kind, self) {
            (ColumnKind::Integer, Value::Text(s)) => Value::Int(leading_int(&s)),
            (ColumnKind::Text, Value::Int(i)) => Value::Text(i.to_string()),
            (_, value) => value,
        }
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(i64::from(value))
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(value: DateTime<Utc>) -> Self {
        Value::Timestamp(value)
    }
}

/// Binary comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Comparator {
    Eq,
    Gte,
    Lt,
    Lte,
}

impl Comparator {
    /// The SQL operator.
    pub fn sql(&self) -> &'static str {
        match self {
            Comparator::Eq => "=",
            Comparator::Gte => ">=",
            Comparator::Lt => "<",
            Comparator::Lte => "<=",
        }
    }

    fn holds(&self, left: &Value, right: &Value) -> bool {
        match self {
            Comparator::Eq => left == right,
            Comparator::Gte => left >= right,
            Comparator::Lt => left < right,
            Comparator::Lte => left <= right,
        }
    }
}

/// A composable condition over one row.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Predicate {
    /// All children hold; empty is true
    And(Vec<Predicate>),
    /// Any child holds; empty is false
    Or(Vec<Predicate>),
    IsNotNull(Column),
    Compare {
        column: Column,
        op: Comparator,
        value: Value,
    },
    /// Integer column is one of `values`; empty is false
    In { column: Column, values: Vec<i64> },
}

impl Predicate {
    pub fn and(children: Vec<Predicate>) -> Self {
        Predicate::And(children)
    }

    pub fn or(children: Vec<Predicate>) -> Self {
        Predicate::Or(children)
    }

    pub fn is_not_null(column: Column) -> Self {
        Predicate::IsNotNull(column)
    }

    pub fn eq(column: Column, value: impl Into<Value>) -> Self {
        Self::compare(column, Comparator::Eq, value)
    }

    pub fn gte(column: Column, value: impl Into<Value>) -> Self {
        Self::compare(column, Comparator::Gte, value)
    }

    pub fn lt(column: Column, value: impl Into<Value>) -> Self {
        Self::compare(column, Comparator::Lt, value)
    }

    pub fn lte(column: Column, value: impl Into<Value>) -> Self {
        Self::compare(column, Comparator::Lte, value)
    }

    /// A comparison with the value coerced to the column's binding kind.
    pub fn compare(column: Column, op: Comparator, value: impl Into<Value>) -> Self {
        Predicate::Compare {
            column,
            op,
            value: value.into().coerce(column.kind()),
        }
    }

    pub fn in_set(column: Column, values: Vec<i64>) -> Self {
        Predicate::In { column, values }
    }

    /// Number of leaf conditions in the tree.
    pub fn leaf_count(&self) -> usize {
        match self {
            Predicate::And(children) | Predicate::Or(children) => {
                children.iter().map(Predicate::leaf_count).sum()
            }
            _ => 1,
        }
    }

    /// Evaluate against a row. A NULL column fails every comparison.
    pub fn matches(&self, record: &CacheRecord) -> bool {
        match self {
            Predicate::And(children) => children.iter().all(|p| p.matches(record)),
            Predicate::Or(children) => children.iter().any(|p| p.matches(record)),
            Predicate::IsNotNull(column) => column.value_of(record).is_some(),
            Predicate::Compare { column, op, value } => column
                .value_of(record)
                .is_some_and(|actual| op.holds(&actual, value)),
            Predicate::In { column, values } => match column.value_of(record) {
                Some(Value::Int(actual)) => values.contains(&actual),
                _ => false,
            },
        }
    }
}
