//! Business rule validation for ledger documents.

use rust_decimal::Decimal;

use super::error::LedgerError;
use super::types::{SlotDraft, TransferInput};

/// Checks that a slot carries exactly one non-negative, non-zero amount.
///
/// # Errors
///
/// Returns `NegativeAmount` or `InvalidSlotSide`.
pub fn validate_slot(slot: &SlotDraft) -> Result<(), LedgerError> {
    if slot.debit < Decimal::ZERO || slot.credit < Decimal::ZERO {
        return Err(LedgerError::NegativeAmount {
            account_id: slot.account_id,
        });
    }

    let has_debit = !slot.debit.is_zero();
    let has_credit = !slot.credit.is_zero();
    if has_debit == has_credit {
        return Err(LedgerError::InvalidSlotSide {
            account_id: slot.account_id,
        });
    }

    Ok(())
}

/// Returns Σ(debit − credit) over the slots.
#[must_use]
pub fn difference(slots: &[SlotDraft]) -> Decimal {
    slots.iter().map(SlotDraft::contribution).sum()
}

/// Fails with the computed sum if the slots do not balance.
///
/// # Errors
///
/// Returns `Unbalanced` carrying Σ(debit − credit).
pub fn ensure_balanced(slots: &[SlotDraft]) -> Result<(), LedgerError> {
    let difference = difference(slots);
    if difference.is_zero() {
        Ok(())
    } else {
        Err(LedgerError::Unbalanced { difference })
    }
}

/// Validates a whole document: at least one slot, every slot well formed,
/// and the document balanced.
///
/// # Errors
///
/// Returns the first rule violation found.
pub fn validate_document(slots: &[SlotDraft]) -> Result<(), LedgerError> {
    if slots.is_empty() {
        return Err(LedgerError::EmptyTransaction);
    }
    slots.iter().try_for_each(validate_slot)?;
    ensure_balanced(slots)
}

/// Validates a transfer request before it is expanded into slots.
///
/// # Errors
///
/// Returns `NonPositiveAmount` or `SelfTransfer`.
pub fn validate_transfer(transfer: &TransferInput) -> Result<(), LedgerError> {
    if transfer.amount <= Decimal::ZERO {
        return Err(LedgerError::NonPositiveAmount(transfer.amount));
    }
    if transfer.pioneer_account_id == transfer.follower_account_id {
        return Err(LedgerError::SelfTransfer(transfer.pioneer_account_id));
    }
    Ok(())
}
