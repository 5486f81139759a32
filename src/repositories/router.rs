use crate::config::Config;
use crate::error::{ConfigError, ConfigResult, StoreResult};
use async_trait::async_trait;
use deadpool_postgres::{Manager, ManagerConfig, Object, Pool, PoolConfig, RecyclingMethod, Runtime};
use tokio_postgres::NoTls;

/// Hands out connections for reads and writes.
///
/// Stores never build connections themselves; they ask the router for the
/// primary (writes) or for a replica if one exists (reads).
#[async_trait]
pub trait ConnectionRouter: Send + Sync {
    /// A connection to the writable primary.
    async fn primary(&self) -> StoreResult<Object>;

    /// A replica connection when configured, otherwise the primary.
    async fn prefer_replica(&self) -> StoreResult<Object>;

    /// Whether reads are actually served by a replica.
    fn has_replica(&self) -> bool;
}

/// Routes between a primary pool and an optional replica pool.
#[derive(Clone)]
pub struct PgRouter {
    primary: Pool,
    replica: Option<Pool>,
}

impl PgRouter {
    /// Create a router over existing pools.
    pub fn new(primary: Pool, replica: Option<Pool>) -> Self {
        Self { primary, replica }
    }

    /// Build both pools from configuration. No connection is opened yet.
    pub fn from_config(config: &Config) -> ConfigResult<Self> {
        let primary = Self::create_pool("CACHE_DB_PRIMARY_URL", &config.primary_url, config.pool_size)?;
        let replica = config
            .replica_url
            .as_deref()
            .map(|url| Self::create_pool("CACHE_DB_REPLICA_URL", url, config.pool_size))
            .transpose()?;

        tracing::info!(
            pool_size = config.pool_size,
            replica = replica.is_some(),
            "Connection pools created"
        );

        Ok(Self::new(primary, replica))
    }

    fn create_pool(var: &str, url: &str, max_size: usize) -> ConfigResult<Pool> {
        let pg_config = url
            .parse::<tokio_postgres::Config>()
            .map_err(|e| ConfigError::InvalidValue {
                var: var.to_string(),
                reason: e.to_string(),
            })?;

        let manager = Manager::from_config(
            pg_config,
            NoTls,
            ManagerConfig {
                recycling_method: RecyclingMethod::Fast,
            },
        );

        Pool::builder(manager)
            .config(PoolConfig::new(max_size))
            .runtime(Runtime::Tokio1)
            .build()
            .map_err(|e| ConfigError::Other(format!("Failed to create pool for {}: {}", var, e)))
    }
}

#[async_trait]
impl ConnectionRouter for PgRouter {
    async fn primary(&self) -> StoreResult<Object> {
        Ok(self.primary.get().await?)
    }

    async fn prefer_replica(&self) -> StoreResult<Object> {
        match &self.replica {
            Some(replica) => Ok(replica.get().await?),
            None => self.primary().await,
        }
    }

    fn has_replica(&self) -> bool {
        self.replica.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_router_without_replica() {
        let config = Config {
            primary_url: "postgres://app@localhost/leads".to_string(),
            ..Config::default()
        };
        let router = PgRouter::from_config(&config).unwrap();
        assert!(!router.has_replica());
    }

    #[tokio::test]
    async fn test_router_with_replica() {
        let config = Config {
            primary_url: "postgres://app@localhost/leads".to_string(),
            replica_url: Some("postgres://app@replica/leads".to_string()),
            ..Config::default()
        };
        let router = PgRouter::from_config(&config).unwrap();
        assert!(router.has_replica());
    }

    #[test]
    fn test_router_rejects_unparsable_url() {
        let config = Config {
            primary_url: "postgres://app@localhost:notaport/leads".to_string(),
            ..Config::default()
        };
        assert!(matches!(
            PgRouter::from_config(&config),
            Err(ConfigError::InvalidValue { .. })
        ));
    }
}
