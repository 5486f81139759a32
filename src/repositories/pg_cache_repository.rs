use crate::error::{ConfigError, ConfigResult, StoreResult};
use crate::models::RecordRef;
use crate::observability::{MetricsTracker, Timer};
use crate::query::{
    expired_exclusivity_predicate, is_valid_identifier, retention_predicate, Predicate, SqlParam,
    SqlQuery,
};
use crate::repositories::router::ConnectionRouter;
use crate::repositories::traits::CacheStore;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use deadpool_postgres::Object;
use std::sync::Arc;
use tokio_postgres::types::ToSql;

/// Borrow each parameter as the driver's bind type.
fn bind(params: &[SqlParam]) -> Vec<&(dyn ToSql + Sync)> {
    params
        .iter()
        .map(|param| match param {
            SqlParam::Int(v) => v as &(dyn ToSql + Sync),
            SqlParam::Text(v) => v as &(dyn ToSql + Sync),
            SqlParam::Timestamp(v) => v as &(dyn ToSql + Sync),
            SqlParam::IntArray(v) => v as &(dyn ToSql + Sync),
        })
        .collect()
}

/// Which connection a statement runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// A replica when one is configured, otherwise the primary
    PreferReplica,
    /// Always the writable primary
    Primary,
}

/// The statements the store issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOp {
    Count,
    ExistsOne,
    DeleteOlderThan,
    ClearExpiredExclusivity,
}

impl StoreOp {
    /// Operation name used for timing and logs.
    pub fn name(self) -> &'static str {
        match self {
            StoreOp::Count => "count",
            StoreOp::ExistsOne => "exists_one",
            StoreOp::DeleteOlderThan => "delete_older_than",
            StoreOp::ClearExpiredExclusivity => "clear_expired_exclusivity",
        }
    }

    /// Reads tolerate replica lag; writes never leave the primary.
    pub fn route(self) -> Route {
        match self {
            StoreOp::Count | StoreOp::ExistsOne => Route::PreferReplica,
            StoreOp::DeleteOlderThan | StoreOp::ClearExpiredExclusivity => Route::Primary,
        }
    }
}

/// PostgreSQL-backed send history.
///
/// Each statement is routed by [`StoreOp::route`]: reads go through
/// [`ConnectionRouter::prefer_replica`], purges and exclusivity collapses
/// through [`ConnectionRouter::primary`].
pub struct PgCacheRepository {
    router: Arc<dyn ConnectionRouter>,
    table: String,
    metrics: MetricsTracker,
}

impl PgCacheRepository {
    /// Create a repository over `table`, which must be a plain SQL identifier.
    pub fn new(
        router: Arc<dyn ConnectionRouter>,
        table: impl Into<String>,
        metrics: MetricsTracker,
    ) -> ConfigResult<Self> {
        let table = table.into();
        if !is_valid_identifier(&table) {
            return Err(ConfigError::InvalidValue {
                var: "CACHE_TABLE".to_string(),
                reason: format!("Not a valid SQL identifier: {}", table),
            });
        }
        Ok(Self {
            router,
            table,
            metrics,
        })
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    async fn connection(&self, op: StoreOp) -> StoreResult<Object> {
        match op.route() {
            Route::PreferReplica => self.router.prefer_replica().await,
            Route::Primary => self.router.primary().await,
        }
    }

    async fn fetch_count(&self, query: &SqlQuery) -> StoreResult<i64> {
        let conn = self.connection(StoreOp::Count).await?;
        let row = conn.query_one(query.text.as_str(), &bind(&query.params)).await?;
        Ok(row.try_get::<_, i64>(0)?)
    }

    async fn fetch_first(&self, query: &SqlQuery) -> StoreResult<Option<RecordRef>> {
        let conn = self.connection(StoreOp::ExistsOne).await?;
        let row = conn.query_opt(query.text.as_str(), &bind(&query.params)).await?;
        match row {
            Some(row) => Ok(Some(RecordRef {
                id: row.try_get("id")?,
                contact_id: row.try_get("contact_id")?,
            })),
            None => Ok(None),
        }
    }

    async fn execute(&self, op: StoreOp, query: &SqlQuery) -> StoreResult<u64> {
        let conn = self.connection(op).await?;
        Ok(conn.execute(query.text.as_str(), &bind(&query.params)).await?)
    }

    async fn write(&self, op: StoreOp, query: SqlQuery) -> StoreResult<u64> {
        tracing::debug!(operation = op.name(), sql = %query.text, "Running write statement");
        let timer = Timer::new(op.name());
        let result = self.execute(op, &query).await;
        timer.finish(&self.metrics, result.is_ok());
        result
    }
}

#[async_trait]
impl CacheStore for PgCacheRepository {
    async fn count(&self, predicate: &Predicate) -> StoreResult<i64> {
        let query = SqlQuery::count(&self.table, predicate);
        tracing::debug!(sql = %query.text, params = query.params.len(), "Running count query");
        let timer = Timer::new(StoreOp::Count.name());
        let result = self.fetch_count(&query).await;
        timer.finish(&self.metrics, result.is_ok());
        result
    }

    async fn exists_one(&self, predicate: &Predicate) -> StoreResult<Option<RecordRef>> {
        let query = SqlQuery::exists(&self.table, predicate);
        tracing::debug!(sql = %query.text, params = query.params.len(), "Running existence query");
        let timer = Timer::new(StoreOp::ExistsOne.name());
        let result = self.fetch_first(&query).await;
        timer.finish(&self.metrics, result.is_ok());
        result
    }

    async fn delete_older_than(&self, cutoff: DateTime<Utc>) -> StoreResult<u64> {
        let query = SqlQuery::delete(&self.table, &retention_predicate(cutoff));
        self.write(StoreOp::DeleteOlderThan, query).await
    }

    async fn clear_expired_exclusivity(&self, now: DateTime<Utc>) -> StoreResult<u64> {
        let query = SqlQuery::clear_exclusivity(&self.table, &expired_exclusivity_predicate(now));
        self.write(StoreOp::ClearExpiredExclusivity, query).await
    }
}
