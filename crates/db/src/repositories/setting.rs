//! Company settings read by the ledger.

use std::sync::Arc;

use sea_orm::sea_query::OnConflict;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, Set};
use tally_core::ledger::LedgerError;

use crate::cache::ReadCache;
use crate::entities::settings;
use crate::trace::TraceExt;

/// Invoice pattern setting key.
pub const INVOICE_PATTERN: &str = "invoice_pattern";
/// Store code setting key.
pub const STORE_CODE: &str = "store_code";

/// String map of settings per company.
#[derive(Clone)]
pub struct SettingStore {
    cache: ReadCache,
}

impl SettingStore {
    /// Creates a store backed by `cache`.
    #[must_use]
    pub const fn new(cache: ReadCache) -> Self {
        Self { cache }
    }

    /// Reads a setting.
    pub async fn get(
        &self,
        conn: &impl ConnectionTrait,
        company_id: i64,
        key: &str,
    ) -> Result<Option<Arc<str>>, LedgerError> {
        if let Some(cached) = self.cache.setting(company_id, key) {
            return Ok(cached);
        }

        let value = settings::Entity::find()
            .filter(settings::Column::CompanyId.eq(company_id))
            .filter(settings::Column::Key.eq(key))
            .one(conn)
            .await
            .trace("SS-GET")?
            .map(|row| Arc::from(row.value));

        self.cache.store_setting(company_id, key, value.clone());
        Ok(value)
    }

    /// Reads a setting, falling back to `default`.
    pub async fn get_or(
        &self,
        conn: &impl ConnectionTrait,
        company_id: i64,
        key: &str,
        default: &str,
    ) -> Result<String, LedgerError> {
        Ok(self
            .get(conn, company_id, key)
            .await?
            .map_or_else(|| default.to_string(), |v| v.to_string()))
    }

    /// Writes a setting and drops its cached value.
    pub async fn set(
        &self,
        conn: &impl ConnectionTrait,
        company_id: i64,
        key: &str,
        value: &str,
    ) -> Result<(), LedgerError> {
        let row = settings::ActiveModel {
            company_id: Set(company_id),
            key: Set(key.to_string()),
            value: Set(value.to_string()),
            ..Default::default()
        };
        settings::Entity::insert(row)
            .on_conflict(
                OnConflict::columns([settings::Column::CompanyId, settings::Column::Key])
                    .update_column(settings::Column::Value)
                    .to_owned(),
            )
            .exec_without_returning(conn)
            .await
            .trace("SS-SET")?;

        self.cache.invalidate_setting(company_id, key);
        Ok(())
    }
}
