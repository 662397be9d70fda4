//! Document headers and the slot-level steps shared by both coordinators.

use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, Set};
use sha2::{Digest, Sha256};
use tally_core::ledger::{
    Counters, LedgerError, SlotDiff, SlotDraft, SlotSource, TransactionInput, TransactionStatus,
};
use uuid::Uuid;

use super::slot_ledger::{ChainLedger, SlotLedger, TempSlotLedger};
use super::slot_table::{SlotRecord, SlotTable};
use crate::entities::transactions;
use crate::trace::TraceExt;

/// A document header with its live slots.
#[derive(Debug, Clone)]
pub struct LedgerDocument {
    /// Header row.
    pub header: transactions::Model,
    /// Slots from the ledger matching the header's status.
    pub slots: Vec<SlotRecord>,
}

/// Creation fingerprint: SHA-256 over the document identity and a fresh
/// time-ordered UUID.
pub(crate) fn fingerprint(company_id: i64, input: &TransactionInput, invoice: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(company_id.to_be_bytes());
    hasher.update(input.transaction_type.as_str().as_bytes());
    hasher.update(invoice.as_bytes());
    hasher.update(Uuid::now_v7().as_bytes());
    format!("{:x}", hasher.finalize())
}

pub(crate) async fn insert_header(
    conn: &impl ConnectionTrait,
    input: &TransactionInput,
    status: TransactionStatus,
    counters: Counters,
) -> Result<transactions::Model, LedgerError> {
    let now = Utc::now().into();
    let row = transactions::ActiveModel {
        company_id: Set(input.company_id),
        node_id: Set(input.node_id),
        transaction_type: Set(input.transaction_type.into()),
        status: Set(status.into()),
        hash: Set(fingerprint(input.company_id, input, &counters.invoice)),
        invoice: Set(counters.invoice),
        counter_group: Set(counters.counter_group),
        fiscal_year: Set(counters.fiscal_year),
        year_counter: Set(counters.year_counter),
        year_cumulative: Set(counters.year_cumulative),
        post_date: Set(input.post_date),
        description: Set(input.description.clone()),
        recipient_user_id: Set(input.recipient_user_id),
        created_by: Set(input.user_id),
        updated_by: Set(input.user_id),
        created_at: Set(now),
        updated_at: Set(now),
        deleted_at: Set(None),
        ..Default::default()
    };
    row.insert(conn).await.trace("TX-INSERT-HEADER")
}

/// A live header of the company.
pub(crate) async fn find_header(
    conn: &impl ConnectionTrait,
    company_id: i64,
    id: i64,
) -> Result<transactions::Model, LedgerError> {
    transactions::Entity::find_by_id(id)
        .filter(transactions::Column::CompanyId.eq(company_id))
        .filter(transactions::Column::DeletedAt.is_null())
        .one(conn)
        .await
        .trace("TX-FIND-HEADER")?
        .ok_or(LedgerError::TransactionNotFound(id))
}

/// Writes the editable header fields. Created-by, hash, type, invoice,
/// counters, created-at and status are carried over from `prior`.
pub(crate) async fn update_header(
    conn: &impl ConnectionTrait,
    prior: transactions::Model,
    input: &TransactionInput,
) -> Result<transactions::Model, LedgerError> {
    let mut row: transactions::ActiveModel = prior.into();
    row.node_id = Set(input.node_id);
    row.post_date = Set(input.post_date);
    row.description = Set(input.description.clone());
    row.recipient_user_id = Set(input.recipient_user_id);
    row.updated_by = Set(input.user_id);
    row.updated_at = Set(Utc::now().into());
    row.update(conn).await.trace("TX-UPDATE-HEADER")
}

pub(crate) async fn set_status(
    conn: &impl ConnectionTrait,
    prior: transactions::Model,
    status: TransactionStatus,
    user_id: i64,
) -> Result<transactions::Model, LedgerError> {
    let mut row: transactions::ActiveModel = prior.into();
    row.status = Set(status.into());
    row.updated_by = Set(user_id);
    row.updated_at = Set(Utc::now().into());
    row.update(conn).await.trace("TX-SET-STATUS")
}

pub(crate) async fn tombstone_header(
    conn: &impl ConnectionTrait,
    prior: transactions::Model,
    user_id: i64,
) -> Result<(), LedgerError> {
    let now = Utc::now().into();
    let mut row: transactions::ActiveModel = prior.into();
    row.deleted_at = Set(Some(now));
    row.updated_by = Set(user_id);
    row.updated_at = Set(now);
    row.update(conn).await.trace("TX-TOMBSTONE-HEADER")?;
    Ok(())
}

/// Stamps a document's slots for an existing header and validates them.
pub(crate) fn stamped(
    input: &TransactionInput,
    transaction_id: i64,
) -> Result<Vec<SlotDraft>, LedgerError> {
    let mut drafts = input.stamp_slots()?;
    for draft in &mut drafts {
        draft.transaction_id = transaction_id;
    }
    tally_core::ledger::validate_document(&drafts)?;
    Ok(drafts)
}

/// Creates every draft as a new slot of `transaction_id`.
pub(crate) async fn post_slots<T: SlotTable>(
    ledger: &ChainLedger<T>,
    conn: &impl ConnectionTrait,
    drafts: Vec<SlotDraft>,
    transaction_id: i64,
) -> Result<Vec<SlotRecord>, LedgerError> {
    let mut posted = Vec::with_capacity(drafts.len());
    for draft in drafts {
        let draft = SlotDraft {
            id: 0,
            transaction_id,
            ..draft
        };
        posted.push(ledger.create(conn, draft).await?);
    }
    Ok(posted)
}

/// Diffs the stored slots of a document against `incoming` and applies
/// the result: deletions (reverse, then soft delete), edits, then new
/// slots.
pub(crate) async fn apply_update<T: SlotTable>(
    ledger: &ChainLedger<T>,
    conn: &impl ConnectionTrait,
    transaction_id: i64,
    incoming: Vec<SlotDraft>,
) -> Result<SlotDiff, LedgerError> {
    let stored = ledger.find_by_transaction(conn, transaction_id).await?;
    let diff = SlotDiff::compute(
        transaction_id,
        stored.iter().map(SlotRecord::draft).collect(),
        incoming,
    )?;

    for gone in &diff.deleted {
        if let Some(record) = stored.iter().find(|s| s.id == gone.id) {
            ledger.reverse(conn, record).await?;
            ledger.soft_delete(conn, record).await?;
        }
    }
    for change in &diff.updated {
        ledger.save(conn, change.next.clone()).await?;
    }
    for draft in &diff.created {
        ledger.create(conn, draft.clone()).await?;
    }
    Ok(diff)
}

/// Reverses and tombstones every live slot of a document.
pub(crate) async fn remove_slots<T: SlotTable>(
    ledger: &ChainLedger<T>,
    conn: &impl ConnectionTrait,
    transaction_id: i64,
) -> Result<usize, LedgerError> {
    let stored = ledger.find_by_transaction(conn, transaction_id).await?;
    for slot in &stored {
        ledger.reverse(conn, slot).await?;
        ledger.soft_delete(conn, slot).await?;
    }
    Ok(stored.len())
}

/// Loads a header's slots from the ledger its status points at.
pub(crate) async fn load(
    conn: &impl ConnectionTrait,
    slots: &SlotLedger,
    temp_slots: &TempSlotLedger,
    header: transactions::Model,
) -> Result<LedgerDocument, LedgerError> {
    let records = match SlotSource::for_status(header.status.into()) {
        SlotSource::Permanent => slots.find_by_transaction(conn, header.id).await?,
        SlotSource::Provisional => temp_slots.find_by_transaction(conn, header.id).await?,
    };
    Ok(LedgerDocument {
        header,
        slots: records,
    })
}
