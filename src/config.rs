//! Configuration Module
//!
//! This module defines all configuration structures for the gateway.
//! Configuration is loaded from TOML files and parsed using serde.

use crate::amount::{Amount, AmountError};
use crate::restrictions::{Limit, RestrictionPolicy};
use serde::Deserialize;
use std::fs;
use std::time::Duration;
use thiserror::Error;

/// Main configuration structure
///
/// Loaded from a TOML file (e.g., config/default.toml).
///
/// # Example TOML
/// ```toml
/// [api]
/// host = "127.0.0.1"
/// port = 8000
///
/// [database]
/// core_url = "sqlite://core.db"
/// history_url = "sqlite://history.db"
///
/// [restrictions]
/// max_daily_outcome = "500"
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub api: ApiConfig,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub validation: ValidationConfig,
    #[serde(default)]
    pub ingestion: IngestionConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub restrictions: RestrictionsConfig,
}

/// API server configuration
///
/// # Fields
/// - `host`: IP address to bind to (e.g., "127.0.0.1" or "0.0.0.0")
/// - `port`: TCP port to listen on
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,
}

/// Database configuration
///
/// # Fields
/// - `core_url`: Mirror of the consensus node's ledger tables
/// - `history_url`: The gateway's own database holding account statistics
/// - `max_connections`: Pool size for each database
/// - `acquire_timeout_ms`: How long a query may wait for a pooled connection
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub core_url: String,
    pub history_url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_acquire_timeout_ms")]
    pub acquire_timeout_ms: u64,
}

impl DatabaseConfig {
    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_millis(self.acquire_timeout_ms)
    }
}

fn default_max_connections() -> u32 {
    10
}

fn default_acquire_timeout_ms() -> u64 {
    3_000
}

/// Per-request validation settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ValidationConfig {
    /// Requests still validating after this long get a retryable error.
    pub timeout_ms: u64,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self { timeout_ms: 5_000 }
    }
}

impl ValidationConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// How often the history store is polled for newly ingested ledgers.
#[derive(Debug, Clone, Deserialize)]
pub struct IngestionConfig {
    pub poll_interval_ms: u64,
}

impl Default for IngestionConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 1_000,
        }
    }
}

impl IngestionConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// History cache sizing
///
/// # Fields
/// - `capacity`: Most accounts whose aggregates are held at once. The least
///   recently used account is dropped beyond that.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    pub capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: crate::history::DEFAULT_CAPACITY,
        }
    }
}

/// Thresholds for anonymous accounts, as decimal strings.
///
/// A missing key or `"0"` disables that threshold.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RestrictionsConfig {
    pub max_daily_outcome: Option<String>,
    pub max_monthly_outcome: Option<String>,
    pub max_annual_outcome: Option<String>,
    pub max_annual_income: Option<String>,
    pub max_balance: Option<String>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid restriction {key}: {source}")]
    InvalidLimit {
        key: &'static str,
        #[source]
        source: AmountError,
    },
    #[error("restriction {key} must not be negative")]
    NegativeLimit { key: &'static str },
}

impl RestrictionsConfig {
    /// Parses every threshold into an immutable policy
    ///
    /// # Returns
    /// * `Ok(policy)` - Missing or zero thresholds become `Limit::Unlimited`
    /// * `Err(ConfigError)` - A value is not a decimal amount, or is negative
    pub fn to_policy(&self) -> Result<RestrictionPolicy, ConfigError> {
        Ok(RestrictionPolicy {
            max_daily_outcome: parse_limit("max_daily_outcome", &self.max_daily_outcome)?,
            max_monthly_outcome: parse_limit("max_monthly_outcome", &self.max_monthly_outcome)?,
            max_annual_outcome: parse_limit("max_annual_outcome", &self.max_annual_outcome)?,
            max_annual_income: parse_limit("max_annual_income", &self.max_annual_income)?,
            max_balance: parse_limit("max_balance", &self.max_balance)?,
        })
    }
}

fn parse_limit(key: &'static str, value: &Option<String>) -> Result<Limit, ConfigError> {
    let Some(raw) = value else {
        return Ok(Limit::Unlimited);
    };
    let amount = Amount::parse(raw.trim()).map_err(|source| ConfigError::InvalidLimit { key, source })?;
    if amount.is_negative() {
        return Err(ConfigError::NegativeLimit { key });
    }
    Ok(Limit::from_amount(amount))
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Arguments
    /// * `path` - Path to the TOML file
    ///
    /// # Example
    /// ```no_run
    /// let config = txsub::Config::load("config/default.toml")?;
    /// # Ok::<(), anyhow::Error>(())
    /// ```
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> anyhow::Result<Self> {
        let config: Config = toml::from_str(content)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
        [api]
        host = "127.0.0.1"
        port = 8000

        [database]
        core_url = "sqlite::memory:"
        history_url = "sqlite::memory:"
    "#;

    #[test]
    fn test_defaults_apply() {
        let config = Config::parse(MINIMAL).unwrap();
        assert_eq!(config.database.max_connections, 10);
        assert_eq!(config.validation.timeout(), Duration::from_secs(5));
        assert_eq!(config.ingestion.poll_interval(), Duration::from_secs(1));
        assert_eq!(config.cache.capacity, 100_000);
        assert_eq!(config.restrictions.to_policy().unwrap(), RestrictionPolicy::unlimited());
    }

    #[test]
    fn test_all_five_limits_parse() {
        let content = format!(
            "{MINIMAL}\n[restrictions]\nmax_daily_outcome = \"500\"\nmax_monthly_outcome = \"4000\"\n\
             max_annual_outcome = \"62000\"\nmax_annual_income = \"62000.5\"\nmax_balance = \"0\"\n"
        );
        let policy = Config::parse(&content).unwrap().restrictions.to_policy().unwrap();
        assert_eq!(policy.max_daily_outcome, Limit::Max(Amount::from_whole(500).unwrap()));
        assert_eq!(policy.max_monthly_outcome, Limit::Max(Amount::from_whole(4000).unwrap()));
        assert_eq!(policy.max_annual_outcome, Limit::Max(Amount::from_whole(62000).unwrap()));
        assert_eq!(
            policy.max_annual_income,
            Limit::Max(Amount::parse("62000.5").unwrap())
        );
        assert_eq!(policy.max_balance, Limit::Unlimited);
    }

    #[test]
    fn test_bad_limit_fails() {
        let restrictions = RestrictionsConfig {
            max_balance: Some("lots".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            restrictions.to_policy(),
            Err(ConfigError::InvalidLimit { key: "max_balance", .. })
        ));

        let restrictions = RestrictionsConfig {
            max_daily_outcome: Some("-5".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            restrictions.to_policy(),
            Err(ConfigError::NegativeLimit { key: "max_daily_outcome" })
        ));
    }

    #[test]
    fn test_shipped_config_loads() {
        let config = Config::load(concat!(env!("CARGO_MANIFEST_DIR"), "/config/default.toml")).unwrap();
        let policy = config.restrictions.to_policy().unwrap();
        assert_eq!(policy.max_balance, Limit::Max(Amount::from_whole(14000).unwrap()));
        assert_eq!(config.cache.capacity, 50_000);
    }
}
