//! Conversion of persistence failures into traced ledger errors.
//!
//! Every database call in the ledger is tagged with a short code naming its
//! call site, e.g. `SL-CREATE-INSERT`. The code travels in
//! [`LedgerError::Database`] and is logged once, where the error is
//! converted.

use sea_orm::{DbErr, SqlErr};
use tally_core::ledger::LedgerError;

/// Extension for tagging `DbErr` results with a call-site code.
pub trait TraceExt<T> {
    /// Converts the error, logging it under `code`.
    ///
    /// Unique constraint violations become the retryable
    /// `ConcurrentModification`.
    fn trace(self, code: &'static str) -> Result<T, LedgerError>;
}

impl<T> TraceExt<T> for Result<T, DbErr> {
    fn trace(self, code: &'static str) -> Result<T, LedgerError> {
        self.map_err(|err| classify(code, &err))
    }
}

fn classify(code: &'static str, err: &DbErr) -> LedgerError {
    if let Some(SqlErr::UniqueConstraintViolation(detail)) = err.sql_err() {
        tracing::warn!(trace = code, %detail, "unique constraint violated");
        return LedgerError::ConcurrentModification;
    }
    tracing::error!(trace = code, error = %err, "database operation failed");
    LedgerError::Database {
        trace: code,
        message: err.to_string(),
    }
}
