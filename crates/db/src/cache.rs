//! Read-through cache for reference data using Moka.
//!
//! Currencies and company settings are read on every ledger write but
//! change rarely. Lookups go through the caller's connection on a miss, so
//! a read inside a unit of work sees that unit's own writes.

use std::sync::Arc;
use std::time::Duration;

use moka::sync::Cache;

use crate::entities::currencies;

/// Cache of currencies by id and settings by (company, key).
///
/// Cloning is cheap; clones share the same entries.
#[derive(Clone)]
pub struct ReadCache {
    currencies: Cache<i64, Arc<currencies::Model>>,
    settings: Cache<(i64, String), Option<Arc<str>>>,
}

impl ReadCache {
    /// Creates a cache holding at most `max_capacity` entries per table,
    /// each living `ttl_secs` seconds.
    #[must_use]
    pub fn new(max_capacity: u64, ttl_secs: u64) -> Self {
        let ttl = Duration::from_secs(ttl_secs);
        Self {
            currencies: Cache::builder()
                .max_capacity(max_capacity)
                .time_to_live(ttl)
                .build(),
            settings: Cache::builder()
                .max_capacity(max_capacity)
                .time_to_live(ttl)
                .build(),
        }
    }

    pub(crate) fn currency(&self, id: i64) -> Option<Arc<currencies::Model>> {
        self.currencies.get(&id)
    }

    pub(crate) fn store_currency(&self, model: currencies::Model) -> Arc<currencies::Model> {
        let model = Arc::new(model);
        self.currencies.insert(model.id, Arc::clone(&model));
        model
    }

    /// Drops a cached currency.
    pub fn invalidate_currency(&self, id: i64) {
        self.currencies.invalidate(&id);
    }

    /// Cached setting: `None` on a miss, `Some(None)` for a known-absent key.
    pub(crate) fn setting(&self, company_id: i64, key: &str) -> Option<Option<Arc<str>>> {
        self.settings.get(&(company_id, key.to_string()))
    }

    pub(crate) fn store_setting(&self, company_id: i64, key: &str, value: Option<Arc<str>>) {
        self.settings.insert((company_id, key.to_string()), value);
    }

    /// Drops a cached setting.
    pub fn invalidate_setting(&self, company_id: i64, key: &str) {
        self.settings.invalidate(&(company_id, key.to_string()));
    }

    /// Drops every cached entry.
    pub fn clear(&self) {
        self.currencies.invalidate_all();
        self.settings.invalidate_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn usd() -> currencies::Model {
        currencies::Model {
            id: 1,
            company_id: 1001,
            node_id: 1,
            code: "USD".to_string(),
            symbol: "$".to_string(),
        }
    }

    #[test]
    fn test_currency_round_trip_and_invalidate() {
        let cache = ReadCache::new(10, 60);
        assert!(cache.currency(1).is_none());

        cache.store_currency(usd());
        assert_eq!(cache.currency(1).unwrap().code, "USD");

        cache.invalidate_currency(1);
        assert!(cache.currency(1).is_none());
    }

    #[test]
    fn test_absent_setting_is_cached() {
        let cache = ReadCache::new(10, 60);
        assert_eq!(cache.setting(1001, "store_code"), None);

        cache.store_setting(1001, "store_code", None);
        assert_eq!(cache.setting(1001, "store_code"), Some(None));

        cache.store_setting(1001, "store_code", Some(Arc::from("BR1")));
        assert_eq!(
            cache.setting(1001, "store_code").flatten().as_deref(),
            Some("BR1")
        );

        cache.clear();
        assert_eq!(cache.setting(1001, "store_code"), None);
    }
}
