//! Render predicates into parameterized PostgreSQL.
//!
//! Values never enter the SQL text; every comparison binds a numbered
//! placeholder with an explicit cast so integer columns hit their indexes.

use super::predicate::{Predicate, Value};
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt::Write;

static IDENTIFIER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]{0,62}(\.[A-Za-z_][A-Za-z0-9_]{0,62})?$")
        .expect("identifier pattern is valid")
});

/// Whether `name` is safe to splice into SQL as a (optionally schema-qualified) table name.
pub fn is_valid_identifier(name: &str) -> bool {
    IDENTIFIER.is_match(name)
}

/// A bound query parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlParam {
    Int(i64),
    Text(String),
    Timestamp(DateTime<Utc>),
    IntArray(Vec<i64>),
}

impl SqlParam {
    fn cast(&self) -> &'static str {
        match self {
            SqlParam::Int(_) => "int8",
            SqlParam::Text(_) => "text",
            SqlParam::Timestamp(_) => "timestamptz",
            SqlParam::IntArray(_) => "int8[]",
        }
    }
}

impl From<&Value> for SqlParam {
    fn from(value: &Value) -> Self {
        match value {
            Value::Int(i) => SqlParam::Int(*i),
            Value::Text(s) => SqlParam::Text(s.clone()),
            Value::Timestamp(t) => SqlParam::Timestamp(*t),
        }
    }
}

/// SQL text plus its positional parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct SqlQuery {
    pub text: String,
    pub params: Vec<SqlParam>,
}

impl SqlQuery {
    /// `SELECT COUNT(*)` over rows matching `predicate`.
    pub fn count(table: &str, predicate: &Predicate) -> Self {
        let mut renderer = Renderer::new(format!("SELECT COUNT(*) FROM {} WHERE ", table));
        renderer.predicate(predicate);
        renderer.finish()
    }

    /// First matching `id, contact_id`, projected for a covering index.
    pub fn exists(table: &str, predicate: &Predicate) -> Self {
        let mut renderer =
            Renderer::new(format!("SELECT id, contact_id FROM {} WHERE ", table));
        renderer.predicate(predicate);
        renderer.text.push_str(" LIMIT 1");
        renderer.finish()
    }

    /// Hard-delete rows matching `predicate`.
    pub fn delete(table: &str, predicate: &Predicate) -> Self {
        let mut renderer = Renderer::new(format!("DELETE FROM {} WHERE ", table));
        renderer.predicate(predicate);
        renderer.finish()
    }

    /// Null the three exclusivity columns on rows matching `predicate`.
    pub fn clear_exclusivity(table: &str, predicate: &Predicate) -> Self {
        let mut renderer = Renderer::new(format!(
            "UPDATE {} SET exclusive_expire_date = NULL, exclusive_pattern = NULL, \
             exclusive_scope = NULL WHERE ",
            table
        ));
        renderer.predicate(predicate);
        renderer.finish()
    }
}

struct Renderer {
    text: String,
    params: Vec<SqlParam>,
}

impl Renderer {
    fn new(prefix: String) -> Self {
        Self {
            text: prefix,
            params: Vec::new(),
        }
    }

    fn bind(&mut self, param: SqlParam) {
        let cast = param.cast();
        self.params.push(param);
        // Writing to a String cannot fail.
        let _ = write!(self.text, "${}::{}", self.params.len(), cast);
    }

    fn join(&mut self, children: &[Predicate], separator: &str, empty: &str) {
        if children.is_empty() {
            self.text.push_str(empty);
            return;
        }
        self.text.push('(');
        for (i, child) in children.iter().enumerate() {
            if i > 0 {
                self.text.push_str(separator);
            }
            self.predicate(child);
        }
        self.text.push(')');
    }

    fn predicate(&mut self, predicate: &Predicate) {
        match predicate {
            Predicate::And(children) => self.join(children, " AND ", "TRUE"),
            Predicate::Or(children) => self.join(children, " OR ", "FALSE"),
            Predicate::IsNotNull(column) => {
                let _ = write!(self.text, "{} IS NOT NULL", column);
            }
            Predicate::Compare { column, op, value } => {
                let _ = write!(self.text, "{} {} ", column, op.sql());
                self.bind(SqlParam::from(value));
            }
            Predicate::In { column, values } => {
                let _ = write!(self.text, "{} = ANY(", column);
                self.bind(SqlParam::IntArray(values.clone()));
                self.text.push(')');
            }
        }
    }

    fn finish(self) -> SqlQuery {
        SqlQuery {
            text: self.text,
            params: self.params,
        }
    }
}
