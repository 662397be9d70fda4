//! Chronologically ordered slot ledgers and balance regulation.
//!
//! Every live slot stores the running balance of its chain (company,
//! account, currency) ordered by `(post_date, id)`. Any write in the middle
//! of a chain shifts the stored balance of every later slot in one bulk
//! `UPDATE`, so the chain stays consistent after each step:
//!
//! | operation    | later slots shifted by |
//! |--------------|------------------------|
//! | create       | `debit - credit`       |
//! | retract      | `credit - debit` (old) |
//! | reapply      | `debit - credit` (new) |
//! | reverse      | `credit - debit`       |
//! | purge        | `credit - debit`       |
//!
//! The permanent ledger also locks the scope's balance row before writing
//! and refreshes it afterwards. The provisional ledger never touches
//! balances.

use std::marker::PhantomData;

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::ConnectionTrait;
use tally_core::ledger::{
    BalanceKey, ChainPosition, ChainScope, LedgerError, SlotDraft, running_balance,
    validate_slot,
};
use tally_shared::types::{PageRequest, PageResponse};

use super::account_guard::AccountGuard;
use super::balance::BalanceCache;
use super::currency::CurrencyLookup;
use super::slot_table::{Permanent, Provisional, SlotPatch, SlotRecord, SlotTable};
use crate::context::LedgerContext;
use crate::trace::TraceExt;

/// Slot ledger over one slot table.
pub struct ChainLedger<T: SlotTable> {
    currencies: CurrencyLookup,
    _table: PhantomData<fn() -> T>,
}

/// The permanent ledger (`slots`).
pub type SlotLedger = ChainLedger<Permanent>;

/// The provisional ledger of unapproved vouchers (`temp_slots`).
pub type TempSlotLedger = ChainLedger<Provisional>;

impl<T: SlotTable> Clone for ChainLedger<T> {
    fn clone(&self) -> Self {
        Self {
            currencies: self.currencies.clone(),
            _table: PhantomData,
        }
    }
}

impl<T: SlotTable> ChainLedger<T> {
    /// Creates a ledger from the shared context.
    #[must_use]
    pub fn new(ctx: &LedgerContext) -> Self {
        Self {
            currencies: CurrencyLookup::new(ctx.cache().clone()),
            _table: PhantomData,
        }
    }

    /// Persists a new slot and regulates the later slots of its chain.
    ///
    /// # Errors
    ///
    /// Validation failures, `AccountNotFound`, `AccountInactive`,
    /// `AccountReadOnly`, `CurrencyNotFound` or a traced database error.
    pub async fn create(
        &self,
        conn: &impl ConnectionTrait,
        draft: SlotDraft,
    ) -> Result<SlotRecord, LedgerError> {
        validate_slot(&draft)?;
        let key = self.admit(conn, &draft).await?;

        let inserted = T::insert(conn, &draft).await.trace("SL-CREATE-INSERT")?;
        let placed = self.place(conn, inserted).await?;

        self.settle(conn, key).await?;
        Ok(placed)
    }

    /// Saves an edited slot.
    ///
    /// If a field that moves money changed, the stored slot is retracted
    /// and the new version reapplied. A description-only change is written
    /// in place without touching any balance.
    pub async fn save(
        &self,
        conn: &impl ConnectionTrait,
        draft: SlotDraft,
    ) -> Result<SlotRecord, LedgerError> {
        let prior = self.find(conn, draft.company_id, draft.id).await?;
        if prior.transaction_id != draft.transaction_id {
            return Err(LedgerError::ForeignSlot {
                slot_id: draft.id,
                transaction_id: draft.transaction_id,
            });
        }

        if draft.changes_balances(&prior.draft()) {
            self.retract(conn, &prior).await?;
            return self.reapply(conn, draft).await;
        }

        if draft.description == prior.description {
            return Ok(prior);
        }
        T::update(
            conn,
            prior.id,
            SlotPatch {
                description: Some(draft.description.clone()),
                ..SlotPatch::default()
            },
        )
        .await
        .trace("SL-SAVE-DESCRIBE")?;
        Ok(SlotRecord {
            description: draft.description,
            ..prior
        })
    }

    /// Takes a slot out of its chain without removing the row: amounts are
    /// zeroed, its balance becomes the preceding balance and later slots
    /// lose its old contribution.
    pub async fn retract(
        &self,
        conn: &impl ConnectionTrait,
        prior: &SlotRecord,
    ) -> Result<SlotRecord, LedgerError> {
        let key = self.guard(conn, prior).await?;
        if T::WRITES_BALANCE {
            BalanceCache::lock(conn, key).await?;
        }

        let preceding = T::preceding(conn, prior.scope(), prior.position())
            .await
            .trace("SL-RETRACT-PRECEDING")?;
        let base = preceding.map_or(Decimal::ZERO, |p| p.balance);

        T::update(
            conn,
            prior.id,
            SlotPatch {
                debit: Some(Decimal::ZERO),
                credit: Some(Decimal::ZERO),
                balance: Some(base),
                ..SlotPatch::default()
            },
        )
        .await
        .trace("SL-RETRACT-ZERO")?;
        self.regulate(conn, prior.scope(), prior.position(), -prior.contribution())
            .await?;

        self.settle(conn, key).await?;
        Ok(SlotRecord {
            debit: Decimal::ZERO,
            credit: Decimal::ZERO,
            balance: base,
            ..prior.clone()
        })
    }

    /// Writes new fields onto a retracted slot and places it again as if
    /// it were created, excluding itself from its own chain walk.
    pub async fn reapply(
        &self,
        conn: &impl ConnectionTrait,
        draft: SlotDraft,
    ) -> Result<SlotRecord, LedgerError> {
        validate_slot(&draft)?;
        let key = self.admit(conn, &draft).await?;

        T::update(conn, draft.id, SlotPatch::rewrite(&draft))
            .await
            .trace("SL-REAPPLY-REWRITE")?;
        let rewritten = self.find(conn, draft.company_id, draft.id).await?;
        let placed = self.place(conn, rewritten).await?;

        self.settle(conn, key).await?;
        Ok(placed)
    }

    /// First half of a delete: later slots lose the slot's contribution.
    /// The row itself stays live until [`soft_delete`](Self::soft_delete).
    pub async fn reverse(
        &self,
        conn: &impl ConnectionTrait,
        slot: &SlotRecord,
    ) -> Result<(), LedgerError> {
        let key = self.guard(conn, slot).await?;
        if T::WRITES_BALANCE {
            BalanceCache::lock(conn, key).await?;
        }
        self.regulate(conn, slot.scope(), slot.position(), -slot.contribution())
            .await?;
        Ok(())
    }

    /// Second half of a delete: tombstones the row and refreshes the
    /// scope's balance.
    pub async fn soft_delete(
        &self,
        conn: &impl ConnectionTrait,
        slot: &SlotRecord,
    ) -> Result<(), LedgerError> {
        let key = self.key_of(conn, slot).await?;
        T::update(
            conn,
            slot.id,
            SlotPatch {
                deleted_at: Some(Utc::now().into()),
                ..SlotPatch::default()
            },
        )
        .await
        .trace("SL-SOFT-DELETE")?;
        self.settle(conn, key).await
    }

    /// Adds `delta` to every live slot of `scope` strictly after `after`.
    pub async fn regulate(
        &self,
        conn: &impl ConnectionTrait,
        scope: ChainScope,
        after: ChainPosition,
        delta: Decimal,
    ) -> Result<u64, LedgerError> {
        if delta.is_zero() {
            return Ok(0);
        }
        let shifted = T::shift_after(conn, scope, after, delta)
            .await
            .trace("SL-REGULATE")?;
        tracing::debug!(
            table = T::TABLE,
            company_id = scope.company_id,
            account_id = scope.account_id,
            currency_id = scope.currency_id,
            %delta,
            shifted,
            "regulated later slots"
        );
        Ok(shifted)
    }

    /// A live slot of the company.
    ///
    /// # Errors
    ///
    /// `SlotNotFound` if it does not exist, is tombstoned or belongs to
    /// another company.
    pub async fn find(
        &self,
        conn: &impl ConnectionTrait,
        company_id: i64,
        id: i64,
    ) -> Result<SlotRecord, LedgerError> {
        T::find(conn, id)
            .await
            .trace("SL-FIND")?
            .filter(|s| s.deleted_at.is_none() && s.company_id == company_id)
            .ok_or(LedgerError::SlotNotFound(id))
    }

    /// Live slots of a document, by id.
    pub async fn find_by_transaction(
        &self,
        conn: &impl ConnectionTrait,
        transaction_id: i64,
    ) -> Result<Vec<SlotRecord>, LedgerError> {
        T::by_transaction(conn, transaction_id)
            .await
            .trace("SL-FIND-BY-TRANSACTION")
    }

    /// Last live slot of a chain.
    pub async fn latest(
        &self,
        conn: &impl ConnectionTrait,
        scope: ChainScope,
    ) -> Result<Option<SlotRecord>, LedgerError> {
        T::latest(conn, scope).await.trace("SL-LATEST")
    }

    /// One page of a chain in chronological order.
    pub async fn statement(
        &self,
        conn: &impl ConnectionTrait,
        scope: ChainScope,
        page: PageRequest,
    ) -> Result<PageResponse<SlotRecord>, LedgerError> {
        let (rows, total) = T::page(conn, scope, page.offset(), page.limit())
            .await
            .trace("SL-STATEMENT")?;
        Ok(PageResponse::new(rows, page.page, page.per_page, total))
    }

    /// Vets the account and currency of a slot about to be written and,
    /// on the permanent ledger, takes the scope lock.
    async fn admit(
        &self,
        conn: &impl ConnectionTrait,
        draft: &SlotDraft,
    ) -> Result<BalanceKey, LedgerError> {
        let account =
            AccountGuard::ensure_postable(conn, draft.company_id, draft.account_id).await?;
        self.currencies
            .find_by_id(conn, draft.company_id, draft.currency_id)
            .await?;

        let key = BalanceKey {
            company_id: draft.company_id,
            node_id: account.node_id,
            account_id: draft.account_id,
            currency_id: draft.currency_id,
        };
        if T::WRITES_BALANCE {
            BalanceCache::lock(conn, key).await?;
        }
        Ok(key)
    }

    /// Computes a slot's balance from its predecessor and shifts the later
    /// slots by its contribution.
    async fn place(
        &self,
        conn: &impl ConnectionTrait,
        record: SlotRecord,
    ) -> Result<SlotRecord, LedgerError> {
        let preceding = T::preceding(conn, record.scope(), record.position())
            .await
            .trace("SL-PLACE-PRECEDING")?;
        let balance = running_balance(preceding.map(|p| p.balance), record.debit, record.credit);

        T::update(conn, record.id, SlotPatch::balance(balance))
            .await
            .trace("SL-PLACE-BALANCE")?;
        self.regulate(conn, record.scope(), record.position(), record.contribution())
            .await?;

        Ok(SlotRecord { balance, ..record })
    }

    async fn guard(
        &self,
        conn: &impl ConnectionTrait,
        slot: &SlotRecord,
    ) -> Result<BalanceKey, LedgerError> {
        let account = AccountGuard::ensure_postable(conn, slot.company_id, slot.account_id).await?;
        Ok(balance_key(slot, account.node_id))
    }

    async fn key_of(
        &self,
        conn: &impl ConnectionTrait,
        slot: &SlotRecord,
    ) -> Result<BalanceKey, LedgerError> {
        let (_, account) = AccountGuard::check_active(conn, slot.company_id, slot.account_id).await?;
        Ok(balance_key(slot, account.node_id))
    }

    async fn settle(&self, conn: &impl ConnectionTrait, key: BalanceKey) -> Result<(), LedgerError> {
        if T::WRITES_BALANCE {
            BalanceCache::refresh(conn, key).await?;
        }
        Ok(())
    }
}

impl TempSlotLedger {
    /// Physically removes a provisional slot, shifting later provisional
    /// slots of its chain by its inverse contribution. Used only when a
    /// voucher is approved.
    pub async fn purge(
        &self,
        conn: &impl ConnectionTrait,
        slot: &SlotRecord,
    ) -> Result<(), LedgerError> {
        self.regulate(conn, slot.scope(), slot.position(), -slot.contribution())
            .await?;
        Provisional::delete(conn, slot.id)
            .await
            .trace("TSL-PURGE")
    }

    /// Drops whatever provisional rows a voucher still owns. Live rows
    /// must already have been purged; only tombstones left by edits
    /// remain, and those sit outside every chain.
    pub async fn purge_remaining(
        &self,
        conn: &impl ConnectionTrait,
        transaction_id: i64,
    ) -> Result<u64, LedgerError> {
        Provisional::delete_transaction(conn, transaction_id)
            .await
            .trace("TSL-PURGE-REMAINING")
    }
}

const fn balance_key(slot: &SlotRecord, node_id: i64) -> BalanceKey {
    BalanceKey {
        company_id: slot.company_id,
        node_id,
        account_id: slot.account_id,
        currency_id: slot.currency_id,
    }
}
