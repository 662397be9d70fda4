//! Voucher state machine.
//!
//! A voucher starts `Unapproved` with its slots in the temp ledger and
//! becomes `Approved` exactly once, when its slots move into the permanent
//! ledger. Nothing leaves `Approved`.

use super::error::LedgerError;
use super::types::TransactionStatus;

/// Ledger that holds a document's slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotSource {
    /// `slots`: affects balances.
    Permanent,
    /// `temp_slots`: pending approval.
    Provisional,
}

impl SlotSource {
    /// Ledger holding the slots of a document in `status`.
    #[must_use]
    pub const fn for_status(status: TransactionStatus) -> Self {
        match status {
            TransactionStatus::Unapproved => Self::Provisional,
            TransactionStatus::Approved => Self::Permanent,
        }
    }
}

/// Stateless transition checks for documents.
pub struct VoucherWorkflow;

impl VoucherWorkflow {
    /// Approves a voucher, returning its next status.
    ///
    /// # Errors
    ///
    /// Returns `InvalidStatus` unless the voucher is `Unapproved`.
    pub fn approve(id: i64, status: TransactionStatus) -> Result<TransactionStatus, LedgerError> {
        let next = TransactionStatus::Approved;
        if status.can_transition_to(next) {
            Ok(next)
        } else {
            Err(LedgerError::InvalidStatus { id, status })
        }
    }

    /// Allows edits and deletion of a pending voucher only.
    ///
    /// # Errors
    ///
    /// Returns `InvalidStatus` once the voucher is approved.
    pub fn ensure_pending(id: i64, status: TransactionStatus) -> Result<(), LedgerError> {
        match status {
            TransactionStatus::Unapproved => Ok(()),
            TransactionStatus::Approved => Err(LedgerError::InvalidStatus { id, status }),
        }
    }

    /// Allows journal updates and deletes of approved documents only.
    ///
    /// # Errors
    ///
    /// Returns `InvalidStatus` for a pending voucher.
    pub fn ensure_posted(id: i64, status: TransactionStatus) -> Result<(), LedgerError> {
        match status {
            TransactionStatus::Approved => Ok(()),
            TransactionStatus::Unapproved => Err(LedgerError::InvalidStatus { id, status }),
        }
    }
}
