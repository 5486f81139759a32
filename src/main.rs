//! Contact Cache maintenance - scheduled retention for the send-history table.
//!
//! Collapses expired exclusivity locks and purges rows past the retention
//! ceiling, once or on a fixed interval.

use anyhow::Result;
use contact_cache::{
    CacheStore, Config, IntervalResolver, MetricsTracker, PgCacheRepository, PgRouter,
    RetentionMaintainer, RetentionService, SystemClock,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Load configuration before logging so LOG_LEVEL can seed the filter.
    let config = Config::from_env();
    let log_level = config
        .as_ref()
        .map(|c| c.log_level.clone())
        .unwrap_or_else(|_| "info".to_string());

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = match config {
        Ok(cfg) => {
            info!("Configuration loaded successfully");
            cfg
        }
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    let metrics = MetricsTracker::new();
    let router = Arc::new(PgRouter::from_config(&config)?);
    let store = Arc::new(PgCacheRepository::new(router, config.table.clone(), metrics.clone())?)
        as Arc<dyn CacheStore>;
    let resolver = IntervalResolver::new(config.default_timezone, Arc::new(SystemClock));
    let maintainer = RetentionMaintainer::new(store, resolver, metrics.clone());

    info!(
        table = %config.table,
        replica = config.replica_url.is_some(),
        interval_secs = config.maintenance_interval_secs,
        "Starting contact cache maintenance"
    );

    if config.maintenance_interval_secs == 0 {
        let report = maintainer.run_once().await?;
        info!(purged = report.purged, collapsed = report.collapsed, "Maintenance complete");
    } else {
        let mut ticker = tokio::time::interval(Duration::from_secs(config.maintenance_interval_secs));
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    // Overlapping or failed runs are harmless; try again next tick.
                    match maintainer.run_once().await {
                        Ok(report) => info!(
                            purged = report.purged,
                            collapsed = report.collapsed,
                            "Maintenance pass complete"
                        ),
                        Err(e) => error!(retriable = e.is_retriable(), "Maintenance pass failed: {}", e),
                    }
                }
                _ = tokio::signal::ctrl_c() => {
                    info!("Shutdown requested");
                    break;
                }
            }
        }
    }

    info!("{}", metrics.summary());
    Ok(())
}
