//! Retention maintenance for the send-history table.
//!
//! Rows older than the retention ceiling (one month plus one day) are
//! deleted outright. That ceiling is the outer bound for every rule duration:
//! a window reaching further back silently under-counts. Expired exclusivity
//! locks are collapsed in place so the exclusivity index stays small; those
//! rows stay for duplicate and limit counting.
//!
//! Both operations are idempotent and safe to run concurrently with reads
//! and with each other.

use crate::error::{CacheError, CacheResult};
use crate::interval::IntervalResolver;
use crate::observability::MetricsTracker;
use crate::repositories::CacheStore;
use async_trait::async_trait;
use std::sync::Arc;

/// Outcome of one full maintenance pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MaintenanceReport {
    pub purged: u64,
    pub collapsed: u64,
}

/// Retention service trait for scheduled cleanup.
#[async_trait]
pub trait RetentionService: Send + Sync {
    /// Delete every row added before now minus the retention ceiling.
    async fn purge_expired(&self) -> CacheResult<u64>;

    /// Clear exclusivity metadata whose expiry is at or before now.
    async fn collapse_expired_exclusivity(&self) -> CacheResult<u64>;

    /// Run both operations, collapse first.
    async fn run_once(&self) -> CacheResult<MaintenanceReport> {
        let collapsed = self.collapse_expired_exclusivity().await?;
        let purged = self.purge_expired().await?;
        Ok(MaintenanceReport { purged, collapsed })
    }
}

/// Default implementation of [`RetentionService`].
pub struct RetentionMaintainer {
    store: Arc<dyn CacheStore>,
    resolver: IntervalResolver,
    metrics: MetricsTracker,
}

impl RetentionMaintainer {
    /// Create a new retention maintainer.
    pub fn new(store: Arc<dyn CacheStore>, resolver: IntervalResolver, metrics: MetricsTracker) -> Self {
        Self {
            store,
            resolver,
            metrics,
        }
    }
}

#[async_trait]
impl RetentionService for RetentionMaintainer {
    async fn purge_expired(&self) -> CacheResult<u64> {
        let cutoff = self.resolver.retention_cutoff();
        let rows = self.store.delete_older_than(cutoff).await.map_err(|e| {
            tracing::warn!(cutoff = %cutoff, error = %e, "Purge failed");
            CacheError::from(e)
        })?;

        self.metrics.track_purged(rows);
        tracing::info!(cutoff = %cutoff, rows = rows, "Purged expired send records");
        Ok(rows)
    }

    async fn collapse_expired_exclusivity(&self) -> CacheResult<u64> {
        let now = self.resolver.now();
        let rows = self.store.clear_expired_exclusivity(now).await.map_err(|e| {
            tracing::warn!(error = %e, "Exclusivity collapse failed");
            CacheError::from(e)
        })?;

        self.metrics.track_collapsed(rows);
        tracing::info!(rows = rows, "Collapsed expired exclusivity");
        Ok(rows)
    }
}
