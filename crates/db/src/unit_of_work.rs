//! One database transaction per logical operation.

use sea_orm::{DatabaseConnection, DatabaseTransaction, TransactionTrait};
use tally_core::ledger::LedgerError;

use crate::trace::TraceExt;

/// Owns the database transaction of one ledger operation.
///
/// Every read and write of the operation goes through [`conn`](Self::conn).
/// Dropping the unit without calling [`commit`](Self::commit), including
/// while unwinding from a panic, rolls everything back.
pub struct UnitOfWork {
    txn: DatabaseTransaction,
}

impl UnitOfWork {
    /// Begins a new unit of work.
    pub async fn begin(db: &DatabaseConnection) -> Result<Self, LedgerError> {
        let txn = db.begin().await.trace("UOW-BEGIN")?;
        Ok(Self { txn })
    }

    /// Connection bound to this unit of work.
    #[must_use]
    pub fn conn(&self) -> &DatabaseTransaction {
        &self.txn
    }

    /// Commits every write made through this unit.
    pub async fn commit(self) -> Result<(), LedgerError> {
        self.txn.commit().await.trace("UOW-COMMIT")
    }

    /// Rolls back explicitly.
    pub async fn rollback(self) -> Result<(), LedgerError> {
        self.txn.rollback().await.trace("UOW-ROLLBACK")
    }
}
