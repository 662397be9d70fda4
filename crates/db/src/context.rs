//! Shared state handed to every ledger component.

use std::sync::Arc;

use sea_orm::DatabaseConnection;
use tally_core::ledger::{CounterGroups, LedgerError};
use tally_shared::LedgerConfig;

use crate::cache::ReadCache;

/// Connection pool, read cache and ledger configuration.
///
/// Cloning is cheap; clones share the pool and the cache.
#[derive(Clone)]
pub struct LedgerContext {
    db: DatabaseConnection,
    cache: ReadCache,
    config: Arc<LedgerConfig>,
    counter_groups: Arc<CounterGroups>,
}

impl LedgerContext {
    /// Builds a context from a connection and the `ledger` config section.
    ///
    /// # Errors
    ///
    /// Returns `UnknownTransactionType` if a counter group override names
    /// an unknown type.
    pub fn new(db: DatabaseConnection, config: LedgerConfig) -> Result<Self, LedgerError> {
        let counter_groups = CounterGroups::with_overrides(&config.counter_groups)?;
        let cache = ReadCache::new(config.cache_capacity, config.cache_ttl_secs);
        Ok(Self {
            db,
            cache,
            config: Arc::new(config),
            counter_groups: Arc::new(counter_groups),
        })
    }

    /// Connection pool.
    #[must_use]
    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }

    /// Reference data cache.
    #[must_use]
    pub fn cache(&self) -> &ReadCache {
        &self.cache
    }

    /// Ledger configuration.
    #[must_use]
    pub fn config(&self) -> &Arc<LedgerConfig> {
        &self.config
    }

    /// Counter group table.
    #[must_use]
    pub fn counter_groups(&self) -> &Arc<CounterGroups> {
        &self.counter_groups
    }
}
