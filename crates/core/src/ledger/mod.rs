//! Double-entry ledger logic.
//!
//! This module holds everything about slots and documents that does not
//! need a database:
//! - Domain types for documents, slots and chain scopes
//! - Error taxonomy
//! - Document validation (Σ debit − credit = 0)
//! - Running balance math
//! - Three-way slot diff for updates
//! - Fiscal year bounds, counter groups and invoice patterns
//! - The voucher state machine

pub mod balance;
pub mod counter;
pub mod diff;
pub mod error;
pub mod fiscal;
pub mod types;
pub mod validation;
pub mod voucher;

#[cfg(test)]
mod balance_props;
#[cfg(test)]
mod validation_props;

pub use balance::{Chain, ChainBreak, ChainEntry, contribution, first_break, running_balance};
pub use counter::{CounterGroups, InvoiceFields, InvoicePattern};
pub use diff::{SlotChange, SlotDiff};
pub use error::{ErrorKind, LedgerError};
pub use fiscal::FiscalYear;
pub use types::{
    AccountStatus, BalanceKey, ChainPosition, ChainScope, Counters, SlotDraft, SlotInput,
    TransactionInput, TransactionStatus, TransactionType, TransferInput,
};
pub use validation::{difference, ensure_balanced, validate_document, validate_slot, validate_transfer};
pub use voucher::{SlotSource, VoucherWorkflow};
