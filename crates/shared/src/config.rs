//! Application configuration management.

use std::collections::BTreeMap;

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Ledger behaviour.
    #[serde(default)]
    pub ledger: LedgerConfig,
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// Ledger configuration.
///
/// Company settings stored in the database take precedence over the
/// defaults below.
#[derive(Debug, Clone, Deserialize)]
pub struct LedgerConfig {
    /// Invoice pattern used when a company has no `invoice_pattern` setting.
    #[serde(default = "default_invoice_pattern")]
    pub default_invoice_pattern: String,
    /// Store code used when a company has no `store_code` setting.
    #[serde(default = "default_store_code")]
    pub default_store_code: String,
    /// Capacity of the journal entry watcher queue.
    #[serde(default = "default_watcher_capacity")]
    pub watcher_capacity: usize,
    /// Maximum number of entries in each read cache.
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: u64,
    /// Time-to-live of read cache entries, in seconds.
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
    /// Counter group overrides: group name to transaction type names.
    #[serde(default)]
    pub counter_groups: BTreeMap<String, Vec<String>>,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            default_invoice_pattern: default_invoice_pattern(),
            default_store_code: default_store_code(),
            watcher_capacity: default_watcher_capacity(),
            cache_capacity: default_cache_capacity(),
            cache_ttl_secs: default_cache_ttl_secs(),
            counter_groups: BTreeMap::new(),
        }
    }
}

fn default_invoice_pattern() -> String {
    "{store}-{year}-{counter:5}".to_string()
}

fn default_store_code() -> String {
    "HQ".to_string()
}

fn default_watcher_capacity() -> usize {
    256
}

fn default_cache_capacity() -> u64 {
    1_000
}

fn default_cache_ttl_secs() -> u64 {
    300 // 5 minutes
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("TALLY").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}
