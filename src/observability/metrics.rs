//! Decision and maintenance metrics.
//!
//! Counters are cheap to clone and share: every clone points at the same
//! atomics, so one tracker can be handed to the engine and the maintainer.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// What a finished decision found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    LimitHit,
    Duplicate,
    Exclusive,
    Clear,
}

/// Shared metrics tracker for the match engine and retention maintainer.
#[derive(Debug, Clone)]
pub struct MetricsTracker {
    queries_total: Arc<AtomicU64>,
    query_errors_total: Arc<AtomicU64>,
    limit_hits_total: Arc<AtomicU64>,
    duplicates_found_total: Arc<AtomicU64>,
    exclusives_found_total: Arc<AtomicU64>,
    rows_purged_total: Arc<AtomicU64>,
    rows_collapsed_total: Arc<AtomicU64>,
}

impl MetricsTracker {
    /// Create a new metrics tracker.
    pub fn new() -> Self {
        Self {
            queries_total: Arc::new(AtomicU64::new(0)),
            query_errors_total: Arc::new(AtomicU64::new(0)),
            limit_hits_total: Arc::new(AtomicU64::new(0)),
            duplicates_found_total: Arc::new(AtomicU64::new(0)),
            exclusives_found_total: Arc::new(AtomicU64::new(0)),
            rows_purged_total: Arc::new(AtomicU64::new(0)),
            rows_collapsed_total: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Track one store round trip.
    pub fn track_query(&self, operation: &str, duration_ms: u128, success: bool) {
        self.queries_total.fetch_add(1, Ordering::Relaxed);

        if !success {
            self.query_errors_total.fetch_add(1, Ordering::Relaxed);
        }

        tracing::debug!(
            operation = %operation,
            duration_ms = duration_ms,
            success = success,
            "Store query completed"
        );
    }

    /// Track the outcome of a match decision.
    pub fn track_decision(&self, decision: Decision) {
        let counter = match decision {
            Decision::LimitHit => &self.limit_hits_total,
            Decision::Duplicate => &self.duplicates_found_total,
            Decision::Exclusive => &self.exclusives_found_total,
            Decision::Clear => return,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Track rows removed by a purge.
    pub fn track_purged(&self, rows: u64) {
        self.rows_purged_total.fetch_add(rows, Ordering::Relaxed);
    }

    /// Track rows whose exclusivity metadata was cleared.
    pub fn track_collapsed(&self, rows: u64) {
        self.rows_collapsed_total.fetch_add(rows, Ordering::Relaxed);
    }

    pub fn queries_total(&self) -> u64 {
        self.queries_total.load(Ordering::Relaxed)
    }

    pub fn query_errors_total(&self) -> u64 {
        self.query_errors_total.load(Ordering::Relaxed)
    }

    pub fn limit_hits_total(&self) -> u64 {
        self.limit_hits_total.load(Ordering::Relaxed)
    }

    pub fn duplicates_found_total(&self) -> u64 {
        self.duplicates_found_total.load(Ordering::Relaxed)
    }

    pub fn exclusives_found_total(&self) -> u64 {
        self.exclusives_found_total.load(Ordering::Relaxed)
    }

    pub fn rows_purged_total(&self) -> u64 {
        self.rows_purged_total.load(Ordering::Relaxed)
    }

    pub fn rows_collapsed_total(&self) -> u64 {
        self.rows_collapsed_total.load(Ordering::Relaxed)
    }

    /// Get the query error rate (0.0 to 1.0).
    pub fn query_error_rate(&self) -> f64 {
        let errors = self.query_errors_total() as f64;
        let total = self.queries_total() as f64;

        if total == 0.0 {
            0.0
        } else {
            errors / total
        }
    }

    /// Print a summary of all metrics.
    pub fn summary(&self) -> String {
        format!(
            "Metrics Summary:\n\
             Queries: {}\n\
             Query Errors: {} ({:.2}% error rate)\n\
             Limit Hits: {}\n\
             Duplicates Found: {}\n\
             Exclusives Found: {}\n\
             Rows Purged: {}\n\
             Rows Collapsed: {}",
            self.queries_total(),
            self.query_errors_total(),
            self.query_error_rate() * 100.0,
            self.limit_hits_total(),
            self.duplicates_found_total(),
            self.exclusives_found_total(),
            self.rows_purged_total(),
            self.rows_collapsed_total(),
        )
    }
}

impl Default for MetricsTracker {
    fn default() -> Self {
        Self::new()
    }
}

/// A timer for tracking operation duration.
pub struct Timer {
    start: Instant,
    operation: &'static str,
}

impl Timer {
    /// Start a new timer for the given operation.
    pub fn new(operation: &'static str) -> Self {
        Self {
            start: Instant::now(),
            operation,
        }
    }

    pub fn operation(&self) -> &'static str {
        self.operation
    }

    /// Elapsed time in milliseconds, without stopping the timer.
    pub fn elapsed_ms(&self) -> u128 {
        self.start.elapsed().as_millis()
    }

    /// Finish the timer, record the query on `metrics`, and return the elapsed milliseconds.
    pub fn finish(self, metrics: &MetricsTracker, success: bool) -> u128 {
        let duration_ms = self.elapsed_ms();
        metrics.track_query(self.operation, duration_ms, success);

        if !success {
            tracing::warn!(
                operation = %self.operation,
                duration_ms = duration_ms,
                "Store query failed"
            );
        }

        duration_ms
    }
}
