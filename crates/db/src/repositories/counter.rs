//! Invoice counter allocation.

use std::sync::Arc;

use chrono::NaiveDateTime;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect};
use tally_core::ledger::{
    CounterGroups, Counters, FiscalYear, InvoiceFields, InvoicePattern, LedgerError,
    TransactionType,
};
use tally_shared::LedgerConfig;

use super::setting::{INVOICE_PATTERN, STORE_CODE, SettingStore};
use crate::context::LedgerContext;
use crate::entities::transactions;
use crate::trace::TraceExt;

/// Draws year and cumulative counters and formats the invoice number.
///
/// Soft-deleted documents keep their numbers, so nothing is ever reused.
/// Counter reads are taken `FOR UPDATE`; a unique index on
/// `(company, group, fiscal_year, year_counter)` rejects any duplicate that
/// slips through, surfacing as `ConcurrentModification`.
#[derive(Clone)]
pub struct CounterAllocator {
    groups: Arc<CounterGroups>,
    settings: SettingStore,
    config: Arc<LedgerConfig>,
}

impl CounterAllocator {
    /// Creates an allocator from the shared context.
    #[must_use]
    pub fn new(ctx: &LedgerContext) -> Self {
        Self {
            groups: Arc::clone(ctx.counter_groups()),
            settings: SettingStore::new(ctx.cache().clone()),
            config: Arc::clone(ctx.config()),
        }
    }

    /// Allocates counters for a new document of `ty` dated `post_date`.
    pub async fn allocate(
        &self,
        conn: &impl ConnectionTrait,
        company_id: i64,
        ty: TransactionType,
        post_date: NaiveDateTime,
    ) -> Result<Counters, LedgerError> {
        let fiscal = FiscalYear::containing(post_date)?;
        let group = self.groups.group_of(ty).to_string();

        let last_in_year = transactions::Entity::find()
            .filter(transactions::Column::CompanyId.eq(company_id))
            .filter(transactions::Column::CounterGroup.eq(group.as_str()))
            .filter(transactions::Column::PostDate.gte(fiscal.start))
            .filter(transactions::Column::PostDate.lt(fiscal.next_start))
            .order_by_desc(transactions::Column::YearCounter)
            .lock_exclusive()
            .one(conn)
            .await
            .trace("CA-ALLOCATE-YEAR")?;
        let year_counter = last_in_year.map_or(0, |t| t.year_counter) + 1;

        let last_overall = transactions::Entity::find()
            .filter(transactions::Column::CompanyId.eq(company_id))
            .filter(transactions::Column::PostDate.lt(fiscal.next_start))
            .order_by_desc(transactions::Column::YearCumulative)
            .lock_exclusive()
            .one(conn)
            .await
            .trace("CA-ALLOCATE-CUMULATIVE")?;
        let year_cumulative = last_overall.map_or(0, |t| t.year_cumulative) + 1;

        let pattern = self
            .settings
            .get_or(conn, company_id, INVOICE_PATTERN, &self.config.default_invoice_pattern)
            .await?;
        let store = self
            .settings
            .get_or(conn, company_id, STORE_CODE, &self.config.default_store_code)
            .await?;
        let invoice = InvoicePattern::parse(&pattern)?.render(&InvoiceFields {
            year: fiscal.year,
            store: &store,
            counter: year_counter,
            cumulative: year_cumulative,
        });

        tracing::debug!(company_id, %group, year_counter, year_cumulative, %invoice, "counters allocated");

        Ok(Counters {
            counter_group: group,
            fiscal_year: fiscal.year,
            year_counter,
            year_cumulative,
            invoice,
        })
    }
}
