//! Sample data and wiring for integration tests.

use chrono::{DateTime, Duration, TimeZone, Utc};
use chrono_tz::Tz;
use contact_cache::domain::E164PhoneNormalizer;
use contact_cache::interval::{FixedClock, IntervalResolver};
use contact_cache::models::CacheRecord;
use contact_cache::observability::MetricsTracker;
use contact_cache::repositories::CacheStore;
use contact_cache::services::{MatchEngine, RetentionMaintainer};
use std::sync::Arc;

/// The fixed "now" every test runs at: Monday 2024-05-20 12:00 UTC.
pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 20, 12, 0, 0).unwrap()
}

pub fn days_ago(days: i64) -> DateTime<Utc> {
    now() - Duration::days(days)
}

pub fn resolver() -> IntervalResolver {
    IntervalResolver::new(Tz::UTC, Arc::new(FixedClock::new(now())))
}

/// A match engine over `store`, pinned to [`now`].
pub fn engine(store: Arc<dyn CacheStore>) -> MatchEngine {
    MatchEngine::new(
        store,
        resolver(),
        Arc::new(E164PhoneNormalizer::default()),
        MetricsTracker::new(),
    )
}

/// A retention maintainer over `store`, pinned to [`now`].
pub fn maintainer(store: Arc<dyn CacheStore>) -> RetentionMaintainer {
    RetentionMaintainer::new(store, resolver(), MetricsTracker::new())
}

/// A send of `contact_id` to `client_id`, `days` ago.
pub fn sent(id: i64, client_id: i64, contact_id: i64, days: i64) -> CacheRecord {
    let mut record = CacheRecord::new(id, client_id, days_ago(days));
    record.contact_id = Some(contact_id);
    record
}

/// A send carrying a live exclusivity lock until `expires`.
pub fn exclusive(
    id: i64,
    client_id: i64,
    contact_id: i64,
    pattern: i64,
    scope: i64,
    expires: DateTime<Utc>,
) -> CacheRecord {
    let mut record = sent(id, client_id, contact_id, 1);
    record.exclusive_pattern = Some(pattern);
    record.exclusive_scope = Some(scope);
    record.exclusive_expire_date = Some(expires);
    record
}
