//! Rule configuration for limits and duplicates.
//!
//! Rules are stored as JSON on the client configuration and evaluated in the
//! order they are listed.

use crate::domain::{Matching, Scope};
use crate::error::{CacheError, CacheResult};
use serde::{Deserialize, Deserializer, Serialize};

/// Accept the scope value as either a JSON string or a JSON number.
fn deserialize_scope_value<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<serde_json::Value> = Option::deserialize(deserializer)?;
    Ok(match value {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        Some(other) => {
            return Err(serde::de::Error::custom(format!(
                "expected string or number for value, got {}",
                other
            )))
        }
    })
}

/// A volume cap ("limit" or "budget") for a destination client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LimitRule {
    /// Recorded with the rule but not used for counting
    #[serde(default)]
    pub matching: Matching,

    /// Which sub-population `value` narrows the count to
    pub scope: Scope,

    /// Interval spec: `P`-prefixed for rolling windows, bare for calendar-aligned
    pub duration: String,

    /// Maximum sends allowed within the window
    pub quantity: i64,

    /// The utm source or category id the scope bits refer to
    #[serde(
        default,
        deserialize_with = "deserialize_scope_value",
        skip_serializing_if = "Option::is_none"
    )]
    pub value: Option<String>,
}

impl LimitRule {
    /// Create a rule without a scope value.
    pub fn new(scope: Scope, duration: impl Into<String>, quantity: i64) -> Self {
        Self {
            matching: Matching::empty(),
            scope,
            duration: duration.into(),
            quantity,
            value: None,
        }
    }

    /// Set the scope value.
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    /// Parse an ordered rule list from client configuration JSON.
    pub fn list_from_json(json: &str) -> CacheResult<Vec<Self>> {
        serde_json::from_str(json)
            .map_err(|e| CacheError::InvalidRule(format!("limit rules: {}", e)))
    }
}

/// A duplicate-suppression rule for a destination client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DuplicateRule {
    /// Contact attributes that identify a duplicate
    pub matching: Matching,

    /// Extra alternatives that also count as a duplicate
    pub scope: Scope,

    /// Interval spec: `P`-prefixed for rolling windows, bare for calendar-aligned
    pub duration: String,
}

impl DuplicateRule {
    /// Create a new rule.
    pub fn new(matching: Matching, scope: Scope, duration: impl Into<String>) -> Self {
        Self {
            matching,
            scope,
            duration: duration.into(),
        }
    }

    /// Parse an ordered rule list from client configuration JSON.
    pub fn list_from_json(json: &str) -> CacheResult<Vec<Self>> {
        serde_json::from_str(json)
            .map_err(|e| CacheError::InvalidRule(format!("duplicate rules: {}", e)))
    }
}

/// The first limit rule found exceeded, with the count that exceeded it.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct LimitHit {
    pub rule: LimitRule,
    pub count: i64,
}
