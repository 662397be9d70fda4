//! Ledger error types for validation, lookup and state errors.
//!
//! Every variant belongs to one [`ErrorKind`]; callers that only need the
//! broad category (an HTTP layer, a CLI) match on `kind()` instead of the
//! individual variants.

use rust_decimal::Decimal;
use thiserror::Error;
use tally_shared::AppError;

use super::types::{TransactionStatus, TransactionType};

/// Broad category of a [`LedgerError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The input violates a ledger rule.
    ValidationFailed,
    /// A referenced record does not exist in the company scope.
    NotFound,
    /// The operation is not allowed for the record's state.
    Forbidden,
    /// A concurrent writer got there first; the operation may be retried.
    Conflict,
    /// Persistence or other unexpected failure.
    Internal,
}

/// Errors that can occur during ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    // ========== Validation Errors ==========
    /// Document has no slots.
    #[error("transaction must have at least one slot")]
    EmptyTransaction,

    /// Σ(debit − credit) over the document is not zero.
    #[error("difference is not zero: {difference}")]
    Unbalanced {
        /// Σ(debit − credit) of the submitted slots.
        difference: Decimal,
    },

    /// Slot carries a negative amount.
    #[error("slot for account {account_id} has a negative amount")]
    NegativeAmount {
        /// Account of the offending slot.
        account_id: i64,
    },

    /// Slot carries both a debit and a credit, or neither.
    #[error("slot for account {account_id} must carry exactly one of debit or credit")]
    InvalidSlotSide {
        /// Account of the offending slot.
        account_id: i64,
    },

    /// Slot has no currency and the document has no default.
    #[error("slot for account {account_id} has no currency")]
    MissingCurrency {
        /// Account of the offending slot.
        account_id: i64,
    },

    /// Transfer amount is zero or negative.
    #[error("transfer amount must be positive, got {0}")]
    NonPositiveAmount(Decimal),

    /// Transfer names the same account on both sides.
    #[error("cannot transfer from account {0} to itself")]
    SelfTransfer(i64),

    /// Transaction type name is not recognised.
    #[error("unknown transaction type: {0}")]
    UnknownTransactionType(String),

    /// Invoice pattern contains an unknown or malformed token.
    #[error("invalid invoice pattern: {0}")]
    InvalidInvoicePattern(String),

    /// Post date falls outside the representable fiscal years.
    #[error("post date {0} has no fiscal year")]
    NoFiscalYear(chrono::NaiveDateTime),

    /// Operation does not accept this document type.
    #[error("operation does not accept {actual} documents")]
    WrongTransactionType {
        /// Type of the stored document.
        actual: TransactionType,
    },

    /// Submitted slot id does not belong to the document.
    #[error("slot {slot_id} does not belong to transaction {transaction_id}")]
    ForeignSlot {
        /// Submitted slot id.
        slot_id: i64,
        /// Document being updated.
        transaction_id: i64,
    },

    // ========== Lookup Errors ==========
    /// Account not found in the company.
    #[error("account not found: {0}")]
    AccountNotFound(i64),

    /// Currency not found in the company.
    #[error("currency not found: {0}")]
    CurrencyNotFound(i64),

    /// Transaction not found in the company.
    #[error("transaction not found: {0}")]
    TransactionNotFound(i64),

    /// No voucher carries this counter in the fiscal year.
    #[error("voucher {fiscal_year}/{year_counter} not found")]
    VoucherNumberNotFound {
        /// Fiscal year searched.
        fiscal_year: i32,
        /// Per-year counter searched.
        year_counter: i64,
    },

    /// Slot not found.
    #[error("slot not found: {0}")]
    SlotNotFound(i64),

    // ========== State Errors ==========
    /// Account is inactive.
    #[error("account {0} is inactive")]
    AccountInactive(i64),

    /// Account is read-only.
    #[error("account {0} is read-only")]
    AccountReadOnly(i64),

    /// Document status does not allow the operation.
    #[error("transaction {id} is {status:?}, operation not allowed")]
    InvalidStatus {
        /// Document id.
        id: i64,
        /// Current status.
        status: TransactionStatus,
    },

    // ========== Concurrency Errors ==========
    /// A concurrent writer claimed the same counter or row.
    #[error("concurrent modification detected, please retry")]
    ConcurrentModification,

    // ========== Internal Errors ==========
    /// Persistence failure at a named call site.
    #[error("database error [{trace}]: {message}")]
    Database {
        /// Call-site trace code.
        trace: &'static str,
        /// Driver message.
        message: String,
    },

    /// Internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl LedgerError {
    /// Returns the broad category of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::EmptyTransaction
            | Self::Unbalanced { .. }
            | Self::NegativeAmount { .. }
            | Self::InvalidSlotSide { .. }
            | Self::MissingCurrency { .. }
            | Self::NonPositiveAmount(_)
            | Self::SelfTransfer(_)
            | Self::UnknownTransactionType(_)
            | Self::InvalidInvoicePattern(_)
            | Self::NoFiscalYear(_)
            | Self::WrongTransactionType { .. }
            | Self::ForeignSlot { .. } => ErrorKind::ValidationFailed,

            Self::AccountNotFound(_)
            | Self::CurrencyNotFound(_)
            | Self::TransactionNotFound(_)
            | Self::VoucherNumberNotFound { .. }
            | Self::SlotNotFound(_) => ErrorKind::NotFound,

            Self::AccountInactive(_) | Self::AccountReadOnly(_) | Self::InvalidStatus { .. } => {
                ErrorKind::Forbidden
            }

            Self::ConcurrentModification => ErrorKind::Conflict,

            Self::Database { .. } | Self::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::EmptyTransaction => "EMPTY_TRANSACTION",
            Self::Unbalanced { .. } => "UNBALANCED_TRANSACTION",
            Self::NegativeAmount { .. } => "NEGATIVE_AMOUNT",
            Self::InvalidSlotSide { .. } => "INVALID_SLOT_SIDE",
            Self::MissingCurrency { .. } => "MISSING_CURRENCY",
            Self::NonPositiveAmount(_) => "NON_POSITIVE_AMOUNT",
            Self::SelfTransfer(_) => "SELF_TRANSFER",
            Self::UnknownTransactionType(_) => "UNKNOWN_TRANSACTION_TYPE",
            Self::InvalidInvoicePattern(_) => "INVALID_INVOICE_PATTERN",
            Self::NoFiscalYear(_) => "NO_FISCAL_YEAR",
            Self::WrongTransactionType { .. } => "WRONG_TRANSACTION_TYPE",
            Self::ForeignSlot { .. } => "FOREIGN_SLOT",
            Self::AccountNotFound(_) => "ACCOUNT_NOT_FOUND",
            Self::CurrencyNotFound(_) => "CURRENCY_NOT_FOUND",
            Self::TransactionNotFound(_) => "TRANSACTION_NOT_FOUND",
            Self::VoucherNumberNotFound { .. } => "VOUCHER_NUMBER_NOT_FOUND",
            Self::SlotNotFound(_) => "SLOT_NOT_FOUND",
            Self::AccountInactive(_) => "ACCOUNT_INACTIVE",
            Self::AccountReadOnly(_) => "ACCOUNT_READ_ONLY",
            Self::InvalidStatus { .. } => "INVALID_STATUS",
            Self::ConcurrentModification => "CONCURRENT_MODIFICATION",
            Self::Database { .. } => "DATABASE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Returns true if this error is retryable.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::ConcurrentModification)
    }
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        let message = err.to_string();
        match err.kind() {
            ErrorKind::ValidationFailed => Self::Validation(message),
            ErrorKind::NotFound => Self::NotFound(message),
            ErrorKind::Forbidden => Self::Forbidden(message),
            ErrorKind::Conflict => Self::Conflict(message),
            ErrorKind::Internal => match err {
                LedgerError::Database { .. } => Self::Database(message),
                _ => Self::Internal(message),
            },
        }
    }
}
