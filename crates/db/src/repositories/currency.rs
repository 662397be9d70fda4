//! Currency lookup for slot scope validation.

use std::sync::Arc;

use sea_orm::{ConnectionTrait, EntityTrait};
use tally_core::ledger::LedgerError;

use crate::cache::ReadCache;
use crate::entities::currencies;
use crate::trace::TraceExt;

/// Cached currency reads.
#[derive(Clone)]
pub struct CurrencyLookup {
    cache: ReadCache,
}

impl CurrencyLookup {
    /// Creates a lookup backed by `cache`.
    #[must_use]
    pub const fn new(cache: ReadCache) -> Self {
        Self { cache }
    }

    /// Finds a currency of the company.
    ///
    /// # Errors
    ///
    /// `CurrencyNotFound` if it does not exist or belongs to another company.
    pub async fn find_by_id(
        &self,
        conn: &impl ConnectionTrait,
        company_id: i64,
        currency_id: i64,
    ) -> Result<Arc<currencies::Model>, LedgerError> {
        let currency = match self.cache.currency(currency_id) {
            Some(hit) => hit,
            None => {
                let model = currencies::Entity::find_by_id(currency_id)
                    .one(conn)
                    .await
                    .trace("CL-FIND")?
                    .ok_or(LedgerError::CurrencyNotFound(currency_id))?;
                self.cache.store_currency(model)
            }
        };

        if currency.company_id != company_id {
            return Err(LedgerError::CurrencyNotFound(currency_id));
        }
        Ok(currency)
    }
}
