use async_trait::async_trait;
use chrono::{DateTime, Utc};
use contact_cache::error::{StoreError, StoreResult};
use contact_cache::models::{CacheRecord, RecordRef};
use contact_cache::query::{expired_exclusivity_predicate, retention_predicate, Predicate};
use contact_cache::repositories::CacheStore;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Mock send-history store for testing.
///
/// Evaluates predicates against in-memory rows like the real stores, and
/// additionally tracks method calls, remembers the last predicate asked, and
/// can be switched into a failing mode to simulate an unreachable database.
#[derive(Clone)]
pub struct MockCacheStore {
    records: Arc<Mutex<Vec<CacheRecord>>>,
    call_counts: Arc<Mutex<HashMap<String, usize>>>,
    last_predicate: Arc<Mutex<Option<Predicate>>>,
    failure: Arc<Mutex<Option<String>>>,
}

impl MockCacheStore {
    /// Create a new empty MockCacheStore.
    pub fn new() -> Self {
        Self {
            records: Arc::new(Mutex::new(Vec::new())),
            call_counts: Arc::new(Mutex::new(HashMap::new())),
            last_predicate: Arc::new(Mutex::new(None)),
            failure: Arc::new(Mutex::new(None)),
        }
    }

    /// Add a record to the mock store.
    pub fn add_record(&self, record: CacheRecord) {
        self.records.lock().unwrap().push(record);
    }

    /// Add multiple records to the mock store.
    pub fn add_records(&self, records: Vec<CacheRecord>) {
        self.records.lock().unwrap().extend(records);
    }

    /// A snapshot of the stored rows.
    pub fn records(&self) -> Vec<CacheRecord> {
        self.records.lock().unwrap().clone()
    }

    /// Make every subsequent call fail as unavailable.
    pub fn fail_with(&self, message: &str) {
        *self.failure.lock().unwrap() = Some(message.to_string());
    }

    /// Stop failing.
    pub fn recover(&self) {
        *self.failure.lock().unwrap() = None;
    }

    /// Get the number of times a method was called.
    pub fn get_call_count(&self, method: &str) -> usize {
        let counts = self.call_counts.lock().unwrap();
        *counts.get(method).unwrap_or(&0)
    }

    /// Total store calls of any kind.
    pub fn total_calls(&self) -> usize {
        self.call_counts.lock().unwrap().values().sum()
    }

    /// The predicate of the most recent read.
    pub fn last_predicate(&self) -> Option<Predicate> {
        self.last_predicate.lock().unwrap().clone()
    }

    /// Reset all call counts.
    pub fn reset_call_counts(&self) {
        self.call_counts.lock().unwrap().clear();
    }

    fn track_call(&self, method: &str) -> StoreResult<()> {
        let mut counts = self.call_counts.lock().unwrap();
        *counts.entry(method.to_string()).or_insert(0) += 1;

        match self.failure.lock().unwrap().as_ref() {
            Some(message) => Err(StoreError::Unavailable(message.clone())),
            None => Ok(()),
        }
    }

    fn remember(&self, predicate: &Predicate) {
        *self.last_predicate.lock().unwrap() = Some(predicate.clone());
    }
}

impl Default for MockCacheStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CacheStore for MockCacheStore {
    async fn count(&self, predicate: &Predicate) -> StoreResult<i64> {
        self.track_call("count")?;
        self.remember(predicate);

        let records = self.records.lock().unwrap();
        Ok(records.iter().filter(|r| predicate.matches(r)).count() as i64)
    }

    async fn exists_one(&self, predicate: &Predicate) -> StoreResult<Option<RecordRef>> {
        self.track_call("exists_one")?;
        self.remember(predicate);

        let records = self.records.lock().unwrap();
        Ok(records
            .iter()
            .find(|r| predicate.matches(r))
            .map(CacheRecord::record_ref))
    }

    async fn delete_older_than(&self, cutoff: DateTime<Utc>) -> StoreResult<u64> {
        self.track_call("delete_older_than")?;

        let expired = retention_predicate(cutoff);
        let mut records = self.records.lock().unwrap();
        let before = records.len();
        records.retain(|r| !expired.matches(r));
        Ok((before - records.len()) as u64)
    }

    async fn clear_expired_exclusivity(&self, now: DateTime<Utc>) -> StoreResult<u64> {
        self.track_call("clear_expired_exclusivity")?;

        let lapsed = expired_exclusivity_predicate(now);
        let mut records = self.records.lock().unwrap();
        let mut changed = 0;
        for record in records.iter_mut().filter(|r| lapsed.matches(r)) {
            record.exclusive_expire_date = None;
            record.exclusive_pattern = None;
            record.exclusive_scope = None;
            changed += 1;
        }
        Ok(changed)
    }
}
