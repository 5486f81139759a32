use crate::error::StoreResult;
use crate::models::{CacheRecord, RecordRef};
use crate::query::{expired_exclusivity_predicate, retention_predicate, Predicate};
use crate::repositories::traits::CacheStore;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

/// In-process send history.
///
/// Predicates are evaluated row by row with SQL NULL semantics, so answers
/// match the PostgreSQL store for the same data. Rows are scanned in insertion
/// order; `exists_one` returns the earliest inserted match.
#[derive(Default)]
pub struct MemoryCacheRepository {
    rows: RwLock<Vec<CacheRecord>>,
}

impl MemoryCacheRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with existing rows.
    pub fn with_records(records: Vec<CacheRecord>) -> Self {
        Self {
            rows: RwLock::new(records),
        }
    }

    /// Append one send record.
    pub async fn insert(&self, record: CacheRecord) {
        self.rows.write().await.push(record);
    }

    /// A snapshot of every row.
    pub async fn records(&self) -> Vec<CacheRecord> {
        self.rows.read().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rows.read().await.is_empty()
    }
}

#[async_trait]
impl CacheStore for MemoryCacheRepository {
    async fn count(&self, predicate: &Predicate) -> StoreResult<i64> {
        let rows = self.rows.read().await;
        Ok(rows.iter().filter(|r| predicate.matches(r)).count() as i64)
    }

    async fn exists_one(&self, predicate: &Predicate) -> StoreResult<Option<RecordRef>> {
        let rows = self.rows.read().await;
        Ok(rows
            .iter()
            .find(|r| predicate.matches(r))
            .map(CacheRecord::record_ref))
    }

    async fn delete_older_than(&self, cutoff: DateTime<Utc>) -> StoreResult<u64> {
        let expired = retention_predicate(cutoff);
        let mut rows = self.rows.write().await;
        let before = rows.len();
        rows.retain(|r| !expired.matches(r));
        Ok((before - rows.len()) as u64)
    }

    async fn clear_expired_exclusivity(&self, now: DateTime<Utc>) -> StoreResult<u64> {
        let lapsed = expired_exclusivity_predicate(now);
        let mut rows = self.rows.write().await;
        let mut changed = 0;
        for row in rows.iter_mut().filter(|r| lapsed.matches(r)) {
            row.exclusive_expire_date = None;
            row.exclusive_pattern = None;
            row.exclusive_scope = None;
            changed += 1;
        }
        Ok(changed)
    }
}
