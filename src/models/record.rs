//! The send-history row.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One contact send attempt, as stored in the append-only history table.
///
/// Rows are only ever inserted, except that expired exclusivity metadata
/// (`exclusive_expire_date`, `exclusive_pattern`, `exclusive_scope`) is
/// cleared in place once it can no longer match.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CacheRecord {
    pub id: i64,
    pub contact_id: Option<i64>,
    pub contactclient_id: Option<i64>,
    pub campaign_id: Option<i64>,
    pub category_id: Option<i64>,

    pub email: Option<String>,
    pub phone: Option<String>,
    pub mobile: Option<String>,
    pub address1: Option<String>,
    pub address2: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zipcode: Option<String>,
    pub country: Option<String>,
    pub utm_source: Option<String>,

    /// Creation time; every window is measured against it
    pub date_added: DateTime<Utc>,

    /// Matching bits that produced the exclusivity lock
    pub exclusive_pattern: Option<i64>,
    /// Scope bits the exclusivity lock applies to
    pub exclusive_scope: Option<i64>,
    /// Null or past means the lock is inert
    pub exclusive_expire_date: Option<DateTime<Utc>>,
}

impl CacheRecord {
    /// A bare row for a client at a point in time.
    pub fn new(id: i64, contactclient_id: i64, date_added: DateTime<Utc>) -> Self {
        Self {
            id,
            contact_id: None,
            contactclient_id: Some(contactclient_id),
            campaign_id: None,
            category_id: None,
            email: None,
            phone: None,
            mobile: None,
            address1: None,
            address2: None,
            city: None,
            state: None,
            zipcode: None,
            country: None,
            utm_source: None,
            date_added,
            exclusive_pattern: None,
            exclusive_scope: None,
            exclusive_expire_date: None,
        }
    }

    /// The minimal reference returned by existence checks.
    pub fn record_ref(&self) -> RecordRef {
        RecordRef {
            id: self.id,
            contact_id: self.contact_id,
        }
    }
}

/// The covering-index projection returned by duplicate/exclusive checks.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct RecordRef {
    pub id: i64,
    pub contact_id: Option<i64>,
}
