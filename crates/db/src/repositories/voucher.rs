//! Two-phase vouchers: provisional slots until approval.

use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use tally_core::ledger::{
    LedgerError, SlotDraft, TransactionInput, TransactionStatus, TransactionType,
    VoucherWorkflow,
};

use super::counter::CounterAllocator;
use super::document::{self, LedgerDocument};
use super::notification::{NewNotification, NotificationService};
use super::slot_ledger::{SlotLedger, TempSlotLedger};
use crate::context::LedgerContext;
use crate::entities::transactions;
use crate::trace::TraceExt;
use crate::unit_of_work::UnitOfWork;

/// Identifies a voucher to approve.
#[derive(Debug, Clone, Copy)]
pub struct VoucherApproval {
    /// Company.
    pub company_id: i64,
    /// Voucher id.
    pub id: i64,
    /// Approving user.
    pub user_id: i64,
}

/// Creates vouchers in the temp ledger and moves them into the permanent
/// ledger on approval.
#[derive(Clone)]
pub struct VoucherCoordinator {
    ctx: LedgerContext,
    counters: CounterAllocator,
    slots: SlotLedger,
    temp_slots: TempSlotLedger,
}

impl VoucherCoordinator {
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

    /// Records an unapproved voucher. With a recipient, a notification
    /// linking to the voucher is created in the same unit of work.
    pub async fn journal_voucher(&self, input: TransactionInput) -> Result<LedgerDocument, LedgerError> {
        if input.transaction_type != TransactionType::JournalVoucher {
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
            document::insert_header(uow.conn(), &input, TransactionStatus::Unapproved, counters)
                .await?;
        let slots = document::post_slots(&self.temp_slots, uow.conn(), drafts, header.id).await?;

        if let Some(recipient_user_id) = header.recipient_user_id {
            NotificationService::create(
                uow.conn(),
                NewNotification {
                    company_id: header.company_id,
                    recipient_user_id,
                    title: "Voucher awaiting approval".to_string(),
                    message: format!("Voucher {} needs your approval", header.invoice),
                    link: format!("/vouchers/{}", header.id),
                },
            )
            .await?;
        }
        uow.commit().await?;

        tracing::info!(
            company_id = header.company_id,
            transaction_id = header.id,
            invoice = %header.invoice,
            slots = slots.len(),
            "voucher recorded"
        );
        Ok(LedgerDocument { header, slots })
    }

    /// Approves a voucher: every temp slot is created on the permanent
    /// ledger and then purged, along with any tombstoned temp rows.
    ///
    /// # Errors
    ///
    /// `InvalidStatus` (forbidden) if the voucher is already approved.
    pub async fn approve_voucher(&self, approval: VoucherApproval) -> Result<LedgerDocument, LedgerError> {
        let uow = UnitOfWork::begin(self.ctx.db()).await?;
        let prior = document::find_header(uow.conn(), approval.company_id, approval.id).await?;
        let next = VoucherWorkflow::approve(prior.id, prior.status.into())?;
        let header = document::set_status(uow.conn(), prior, next, approval.user_id).await?;

        let pending = self.temp_slots.find_by_transaction(uow.conn(), header.id).await?;
        let mut slots = Vec::with_capacity(pending.len());
        for temp in &pending {
            let draft = SlotDraft {
                id: 0,
                ..temp.draft()
            };
            slots.push(self.slots.create(uow.conn(), draft).await?);
            self.temp_slots.purge(uow.conn(), temp).await?;
        }
        self.temp_slots.purge_remaining(uow.conn(), header.id).await?;
        uow.commit().await?;

        tracing::info!(
            company_id = header.company_id,
            transaction_id = header.id,
            approved_by = approval.user_id,
            slots = slots.len(),
            "voucher approved"
        );
        Ok(LedgerDocument { header, slots })
    }

    /// Rewrites a pending voucher's temp slots.
    ///
    /// # Errors
    ///
    /// `InvalidStatus` (forbidden) once the voucher is approved.
    pub async fn voucher_update(&self, input: TransactionInput) -> Result<LedgerDocument, LedgerError> {
        let drafts = document::stamped(&input, input.id)?;

        let uow = UnitOfWork::begin(self.ctx.db()).await?;
        let prior = document::find_header(uow.conn(), input.company_id, input.id).await?;
        VoucherWorkflow::ensure_pending(prior.id, prior.status.into())?;

        let diff = document::apply_update(&self.temp_slots, uow.conn(), prior.id, drafts).await?;
        let header = document::update_header(uow.conn(), prior, &input).await?;
        let slots = self.temp_slots.find_by_transaction(uow.conn(), header.id).await?;
        uow.commit().await?;

        tracing::info!(
            company_id = header.company_id,
            transaction_id = header.id,
            created = diff.created.len(),
            updated = diff.updated.len(),
            deleted = diff.deleted.len(),
            "voucher updated"
        );
        Ok(LedgerDocument { header, slots })
    }

    /// Deletes a pending voucher and its temp slots.
    pub async fn delete_voucher(&self, company_id: i64, id: i64, user_id: i64) -> Result<(), LedgerError> {
        let uow = UnitOfWork::begin(self.ctx.db()).await?;
        let prior = document::find_header(uow.conn(), company_id, id).await?;
        VoucherWorkflow::ensure_pending(prior.id, prior.status.into())?;

        let removed = document::remove_slots(&self.temp_slots, uow.conn(), prior.id).await?;
        document::tombstone_header(uow.conn(), prior, user_id).await?;
        uow.commit().await?;

        tracing::info!(company_id, transaction_id = id, slots = removed, "voucher deleted");
        Ok(())
    }

    /// A live voucher with slots from the ledger matching its status.
    pub async fn find_voucher_by_id(&self, company_id: i64, id: i64) -> Result<LedgerDocument, LedgerError> {
        let conn = self.ctx.db();
        let header = document::find_header(conn, company_id, id).await?;
        document::load(conn, &self.slots, &self.temp_slots, header).await
    }

    /// A live voucher by its position in the voucher counter sequence.
    pub async fn find_by_year_counter(
        &self,
        company_id: i64,
        fiscal_year: i32,
        year_counter: i64,
    ) -> Result<LedgerDocument, LedgerError> {
        let conn = self.ctx.db();
        let group = self
            .ctx
            .counter_groups()
            .group_of(TransactionType::JournalVoucher);

        let header = transactions::Entity::find()
            .filter(transactions::Column::CompanyId.eq(company_id))
            .filter(transactions::Column::CounterGroup.eq(group))
            .filter(transactions::Column::FiscalYear.eq(fiscal_year))
            .filter(transactions::Column::YearCounter.eq(year_counter))
            .filter(transactions::Column::DeletedAt.is_null())
            .one(conn)
            .await
            .trace("VC-FIND-BY-YEAR-COUNTER")?
            .ok_or(LedgerError::VoucherNumberNotFound {
                fiscal_year,
                year_counter,
            })?;

        document::load(conn, &self.slots, &self.temp_slots, header).await
    }
}
