//! Balanced document creation, update and deletion on the permanent ledger.

use rust_decimal::Decimal;
use tally_core::ledger::{
    BalanceKey, ChainScope, LedgerError, TransactionInput, TransactionStatus, TransferInput,
    VoucherWorkflow, validate_transfer,
};
use tally_shared::types::{PageRequest, PageResponse};

use super::balance::BalanceCache;
use super::counter::CounterAllocator;
use super::document::{self, LedgerDocument};
use super::slot_ledger::{SlotLedger, TempSlotLedger};
use super::slot_table::SlotRecord;
use crate::context::LedgerContext;
use crate::unit_of_work::UnitOfWork;

/// Owns create, update and delete of approved documents.
///
/// Every operation runs in its own [`UnitOfWork`]; the first failure rolls
/// back the header, every slot, the balance cache and the counters.
#[derive(Clone)]
pub struct TransactionCoordinator {
    ctx: LedgerContext,
    counters: CounterAllocator,
    slots: SlotLedger,
    temp_slots: TempSlotLedger,
}

impl TransactionCoordinator {
    /// Creates a coordinator from the shared context.
    #[must_use]
    pub fn new(ctx: LedgerContext) -> Self {
        Self {
            counters: CounterAllocator::new(&ctx),
            slots: SlotLedger::new(&ctx),
            temp_slots: TempSlotLedger::new(&ctx),
            ctx,
        }
    }

    /// Moves `amount` from the pioneer account (credited) to the follower
    /// account (debited) as a manual document.
    pub async fn transfer(&self, transfer: TransferInput) -> Result<LedgerDocument, LedgerError> {
        validate_transfer(&transfer)?;
        self.create(transfer.into_transaction()).await
    }

    /// Posts a balanced document straight to the permanent ledger.
    ///
    /// # Errors
    ///
    /// `WrongTransactionType` for voucher types, which go through the
    /// voucher coordinator; otherwise any validation, guard or
    /// persistence error.
    pub async fn create(&self, input: TransactionInput) -> Result<LedgerDocument, LedgerError> {
        if input.transaction_type.is_voucher() {
            return Err(LedgerError::WrongTransactionType {
                actual: input.transaction_type,
            });
        }
        let drafts = document::stamped(&input, 0)?;

        let uow = UnitOfWork::begin(self.ctx.db()).await?;
        let counters = self
            .counters
            .allocate(uow.conn(), input.company_id, input.transaction_type, input.post_date)
            .await?;
        let header =
            document::insert_header(uow.conn(), &input, TransactionStatus::Approved, counters)
                .await?;
        let slots = document::post_slots(&self.slots, uow.conn(), drafts, header.id).await?;
        uow.commit().await?;

        tracing::info!(
            company_id = header.company_id,
            transaction_id = header.id,
            invoice = %header.invoice,
            kind = %input.transaction_type,
            slots = slots.len(),
            "document posted"
        );
        Ok(LedgerDocument { header, slots })
    }

    /// Posts a journal entry; identical to [`create`](Self::create).
    pub async fn journal_entry(&self, input: TransactionInput) -> Result<LedgerDocument, LedgerError> {
        self.create(input).await
    }

    /// Rewrites an approved document: new slots are created, changed slots
    /// saved and missing slots reversed and tombstoned.
    pub async fn journal_update(&self, input: TransactionInput) -> Result<LedgerDocument, LedgerError> {
        let drafts = document::stamped(&input, input.id)?;

        let uow = UnitOfWork::begin(self.ctx.db()).await?;
        let prior = document::find_header(uow.conn(), input.company_id, input.id).await?;
        VoucherWorkflow::ensure_posted(prior.id, prior.status.into())?;

        let diff = document::apply_update(&self.slots, uow.conn(), prior.id, drafts).await?;
        let header = document::update_header(uow.conn(), prior, &input).await?;
        let slots = self.slots.find_by_transaction(uow.conn(), header.id).await?;
        uow.commit().await?;

        tracing::info!(
            company_id = header.company_id,
            transaction_id = header.id,
            created = diff.created.len(),
            updated = diff.updated.len(),
            deleted = diff.deleted.len(),
            "document updated"
        );
        Ok(LedgerDocument { header, slots })
    }

    /// Reverses and tombstones every slot of an approved document, then
    /// the header.
    pub async fn delete(&self, company_id: i64, id: i64, user_id: i64) -> Result<(), LedgerError> {
        let uow = UnitOfWork::begin(self.ctx.db()).await?;
        let prior = document::find_header(uow.conn(), company_id, id).await?;
        VoucherWorkflow::ensure_posted(prior.id, prior.status.into())?;

        let removed = document::remove_slots(&self.slots, uow.conn(), prior.id).await?;
        document::tombstone_header(uow.conn(), prior, user_id).await?;
        uow.commit().await?;

        tracing::info!(company_id, transaction_id = id, slots = removed, "document deleted");
        Ok(())
    }

    /// A live document with its slots.
    pub async fn find_by_id(&self, company_id: i64, id: i64) -> Result<LedgerDocument, LedgerError> {
        let conn = self.ctx.db();
        let header = document::find_header(conn, company_id, id).await?;
        document::load(conn, &self.slots, &self.temp_slots, header).await
    }

    /// One page of an account's permanent slots in chronological order.
    pub async fn statement(
        &self,
        scope: ChainScope,
        page: PageRequest,
    ) -> Result<PageResponse<SlotRecord>, LedgerError> {
        self.slots.statement(self.ctx.db(), scope, page).await
    }

    /// Cached closing balance of a scope; zero if nothing was ever posted.
    pub async fn balance(&self, key: BalanceKey) -> Result<Decimal, LedgerError> {
        Ok(BalanceCache::get(self.ctx.db(), key)
            .await?
            .unwrap_or(Decimal::ZERO))
    }
}
