//! Configuration management for the contact cache.
//!
//! This module handles loading and validating configuration from environment
//! variables, optionally seeded from a `.env` file.

use crate::error::{ConfigError, ConfigResult};
use crate::query::is_valid_identifier;
use chrono_tz::Tz;
use std::env;

/// Configuration for the match engine, the store, and the maintenance binary.
#[derive(Debug, Clone)]
pub struct Config {
    /// Primary (writable) PostgreSQL URL
    pub primary_url: String,

    /// Read replica URL; reads use the primary when unset
    pub replica_url: Option<String>,

    /// Maximum connections per pool (default: 16)
    pub pool_size: usize,

    /// Send-history table name (default: "contactclient_cache")
    pub table: String,

    /// Timezone for calendar-aligned windows when rules don't name one (default: UTC)
    pub default_timezone: Tz,

    /// Country calling code assumed for national phone numbers (default: 1)
    pub phone_country_code: u16,

    /// Seconds between maintenance runs; 0 runs once and exits (default: 0)
    pub maintenance_interval_secs: u64,

    /// Log level (default: "info")
    pub log_level: String,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Required environment variables:
    /// - `CACHE_DB_PRIMARY_URL`: PostgreSQL URL of the primary
    ///
    /// Optional environment variables:
    /// - `CACHE_DB_REPLICA_URL`: PostgreSQL URL of a read replica
    /// - `CACHE_DB_POOL_SIZE`: Connections per pool (default: 16)
    /// - `CACHE_TABLE`: History table name (default: "contactclient_cache")
    /// - `CACHE_DEFAULT_TIMEZONE`: IANA timezone name (default: "UTC")
    /// - `CACHE_PHONE_COUNTRY_CODE`: Default calling code (default: 1)
    /// - `CACHE_MAINTENANCE_INTERVAL_SECS`: Maintenance period (default: 0)
    /// - `LOG_LEVEL`: Logging level (default: "info")
    pub fn from_env() -> ConfigResult<Self> {
        // A missing .env is fine.
        let _ = dotenvy::dotenv();

        let primary_url = env::var("CACHE_DB_PRIMARY_URL")
            .map_err(|_| ConfigError::MissingVar("CACHE_DB_PRIMARY_URL".to_string()))?;
        Self::validate_url("CACHE_DB_PRIMARY_URL", &primary_url)?;

        let replica_url = match env::var("CACHE_DB_REPLICA_URL") {
            Ok(url) if !url.trim().is_empty() => {
                Self::validate_url("CACHE_DB_REPLICA_URL", &url)?;
                Some(url)
            }
            _ => None,
        };

        let pool_size = Self::parse_env_usize("CACHE_DB_POOL_SIZE", 16)?;
        if pool_size == 0 {
            return Err(ConfigError::InvalidValue {
                var: "CACHE_DB_POOL_SIZE".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        let table = env::var("CACHE_TABLE").unwrap_or_else(|_| "contactclient_cache".to_string());
        if !is_valid_identifier(&table) {
            return Err(ConfigError::InvalidValue {
                var: "CACHE_TABLE".to_string(),
                reason: format!("Not a valid SQL identifier: {}", table),
            });
        }

        let timezone_name =
            env::var("CACHE_DEFAULT_TIMEZONE").unwrap_or_else(|_| "UTC".to_string());
        let default_timezone =
            timezone_name
                .trim()
                .parse::<Tz>()
                .map_err(|_| ConfigError::InvalidValue {
                    var: "CACHE_DEFAULT_TIMEZONE".to_string(),
                    reason: format!("Unknown timezone: {}", timezone_name),
                })?;

        let phone_country_code = Self::parse_env_u16("CACHE_PHONE_COUNTRY_CODE", 1)?;
        if phone_country_code == 0 || phone_country_code > 999 {
            return Err(ConfigError::InvalidValue {
                var: "CACHE_PHONE_COUNTRY_CODE".to_string(),
                reason: "Must be between 1 and 999".to_string(),
            });
        }

        let maintenance_interval_secs = Self::parse_env_u64("CACHE_MAINTENANCE_INTERVAL_SECS", 0)?;
        let log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Config {
            primary_url,
            replica_url,
            pool_size,
            table,
            default_timezone,
            phone_country_code,
            maintenance_interval_secs,
            log_level,
        })
    }

    fn validate_url(var_name: &str, url: &str) -> ConfigResult<()> {
        if url.starts_with("postgres://") || url.starts_with("postgresql://") {
            Ok(())
        } else {
            Err(ConfigError::InvalidValue {
                var: var_name.to_string(),
                reason: "Must start with postgres:// or postgresql://".to_string(),
            })
        }
    }

    /// Parse an environment variable as u64 with a default value.
    fn parse_env_u64(var_name: &str, default: u64) -> ConfigResult<u64> {
        match env::var(var_name) {
            Ok(val) => val.parse::<u64>().map_err(|_| ConfigError::InvalidValue {
                var: var_name.to_string(),
                reason: format!("Must be a positive number, got: {}", val),
            }),
            Err(_) => Ok(default),
        }
    }

    /// Parse an environment variable as usize with a default value.
    fn parse_env_usize(var_name: &str, default: usize) -> ConfigResult<usize> {
        match env::var(var_name) {
            Ok(val) => val.parse::<usize>().map_err(|_| ConfigError::InvalidValue {
                var: var_name.to_string(),
                reason: format!("Must be a positive number, got: {}", val),
            }),
            Err(_) => Ok(default),
        }
    }

    /// Parse an environment variable as u16 with a default value.
    fn parse_env_u16(var_name: &str, default: u16) -> ConfigResult<u16> {
        match env::var(var_name) {
            Ok(val) => val.parse::<u16>().map_err(|_| ConfigError::InvalidValue {
                var: var_name.to_string(),
                reason: format!("Must be a number between 0-65535, got: {}", val),
            }),
            Err(_) => Ok(default),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            primary_url: String::new(),
            replica_url: None,
            pool_size: 16,
            table: "contactclient_cache".to_string(),
            default_timezone: Tz::UTC,
            phone_country_code: 1,
            maintenance_interval_secs: 0,
            log_level: "info".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;

    const OPTIONAL_VARS: [&str; 7] = [
        "CACHE_DB_REPLICA_URL",
        "CACHE_DB_POOL_SIZE",
        "CACHE_TABLE",
        "CACHE_DEFAULT_TIMEZONE",
        "CACHE_PHONE_COUNTRY_CODE",
        "CACHE_MAINTENANCE_INTERVAL_SECS",
        "LOG_LEVEL",
    ];

    // Helper to set and unset env vars for testing
    struct EnvGuard {
        vars: Vec<String>,
    }

    impl EnvGuard {
        fn new() -> Self {
            let _ = dotenvy::dotenv();
            for var in OPTIONAL_VARS {
                env::remove_var(var);
            }
            EnvGuard { vars: Vec::new() }
        }

        fn set(&mut self, key: &str, value: &str) {
            env::set_var(key, value);
            self.vars.push(key.to_string());
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            for var in &self.vars {
                env::remove_var(var);
            }
        }
    }

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.pool_size, 16);
        assert_eq!(config.table, "contactclient_cache");
        assert_eq!(config.default_timezone, Tz::UTC);
        assert_eq!(config.phone_country_code, 1);
        assert_eq!(config.maintenance_interval_secs, 0);
        assert!(config.replica_url.is_none());
    }

    #[test]
    #[serial]
    fn test_config_from_env_valid_defaults() {
        let mut guard = EnvGuard::new();
        guard.set("CACHE_DB_PRIMARY_URL", "postgres://app@db-primary/leads");

        let config = Config::from_env().unwrap();
        assert_eq!(config.primary_url, "postgres://app@db-primary/leads");
        assert!(config.replica_url.is_none());
        assert_eq!(config.pool_size, 16);
        assert_eq!(config.table, "contactclient_cache");
        assert_eq!(config.log_level, "info");
    }

    #[test]
    #[serial]
    fn test_config_from_env_full() {
        let mut guard = EnvGuard::new();
        guard.set("CACHE_DB_PRIMARY_URL", "postgresql://app@db-primary/leads");
        guard.set("CACHE_DB_REPLICA_URL", "postgresql://app@db-replica/leads");
        guard.set("CACHE_DB_POOL_SIZE", "4");
        guard.set("CACHE_TABLE", "public.contactclient_cache");
        guard.set("CACHE_DEFAULT_TIMEZONE", "America/New_York");
        guard.set("CACHE_PHONE_COUNTRY_CODE", "44");
        guard.set("CACHE_MAINTENANCE_INTERVAL_SECS", "300");

        let config = Config::from_env().unwrap();
        assert_eq!(
            config.replica_url.as_deref(),
            Some("postgresql://app@db-replica/leads")
        );
        assert_eq!(config.pool_size, 4);
        assert_eq!(config.table, "public.contactclient_cache");
        assert_eq!(config.default_timezone, chrono_tz::America::New_York);
        assert_eq!(config.phone_country_code, 44);
        assert_eq!(config.maintenance_interval_secs, 300);
    }

    #[test]
    #[serial]
    fn test_config_from_env_invalid_url() {
        let mut guard = EnvGuard::new();
        guard.set("CACHE_DB_PRIMARY_URL", "mysql://db/leads");

        match Config::from_env() {
            Err(ConfigError::InvalidValue { var, .. }) => assert_eq!(var, "CACHE_DB_PRIMARY_URL"),
            other => panic!("Expected InvalidValue error, got: {:?}", other),
        }
    }

    #[test]
    #[serial]
    fn test_config_rejects_unsafe_table() {
        let mut guard = EnvGuard::new();
        guard.set("CACHE_DB_PRIMARY_URL", "postgres://db/leads");
        guard.set("CACHE_TABLE", "cache; DROP TABLE leads");

        match Config::from_env() {
            Err(ConfigError::InvalidValue { var, .. }) => assert_eq!(var, "CACHE_TABLE"),
            other => panic!("Expected InvalidValue error, got: {:?}", other),
        }
    }

    #[test]
    #[serial]
    fn test_config_rejects_unknown_timezone() {
        let mut guard = EnvGuard::new();
        guard.set("CACHE_DB_PRIMARY_URL", "postgres://db/leads");
        guard.set("CACHE_DEFAULT_TIMEZONE", "Mars/Olympus");

        match Config::from_env() {
            Err(ConfigError::InvalidValue { var, .. }) => {
                assert_eq!(var, "CACHE_DEFAULT_TIMEZONE")
            }
            other => panic!("Expected InvalidValue error, got: {:?}", other),
        }
    }

    #[test]
    #[serial]
    fn test_config_rejects_zero_pool() {
        let mut guard = EnvGuard::new();
        guard.set("CACHE_DB_PRIMARY_URL", "postgres://db/leads");
        guard.set("CACHE_DB_POOL_SIZE", "0");

        assert!(matches!(
            Config::from_env(),
            Err(ConfigError::InvalidValue { var, .. }) if var == "CACHE_DB_POOL_SIZE"
        ));
    }

    #[test]
    #[serial]
    fn test_parse_env_u64() {
        let mut guard = EnvGuard::new();
        guard.set("TEST_U64", "42");

        let result = Config::parse_env_u64("TEST_U64", 10);
        assert_eq!(result.unwrap(), 42);

        let result = Config::parse_env_u64("NONEXISTENT", 10);
        assert_eq!(result.unwrap(), 10);
    }

    #[test]
    #[serial]
    fn test_parse_env_u64_invalid() {
        let mut guard = EnvGuard::new();
        guard.set("TEST_U64_INVALID", "not-a-number");

        let result = Config::parse_env_u64("TEST_U64_INVALID", 10);
        assert!(result.is_err());
    }
}
