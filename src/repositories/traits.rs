use crate::error::StoreResult;
use crate::models::RecordRef;
use crate::query::Predicate;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// The send-history event store.
///
/// Reads go to a replica when one is available; the two maintenance writes
/// always go to the primary. Every method issues exactly one statement.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Count rows matching `predicate`.
    async fn count(&self, predicate: &Predicate) -> StoreResult<i64>;

    /// The first row matching `predicate`, projected to `id, contact_id`.
    async fn exists_one(&self, predicate: &Predicate) -> StoreResult<Option<RecordRef>>;

    /// Hard-delete rows added before `cutoff`. Returns rows removed.
    async fn delete_older_than(&self, cutoff: DateTime<Utc>) -> StoreResult<u64>;

    /// Null the exclusivity columns of rows whose lock lapsed at or before `now`.
    /// Returns rows changed.
    async fn clear_expired_exclusivity(&self, now: DateTime<Utc>) -> StoreResult<u64>;
}
