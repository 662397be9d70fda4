//! Account status checks run before every slot mutation.

use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter};
use tally_core::ledger::{AccountStatus, LedgerError};

use crate::entities::accounts;
use crate::trace::TraceExt;

/// Read-only veto over ledger mutations against an account.
pub struct AccountGuard;

impl AccountGuard {
    /// Returns whether the account is active, along with the account.
    ///
    /// # Errors
    ///
    /// `AccountNotFound` if the account is not in the company.
    pub async fn check_active(
        conn: &impl ConnectionTrait,
        company_id: i64,
        account_id: i64,
    ) -> Result<(bool, accounts::Model), LedgerError> {
        let account = accounts::Entity::find_by_id(account_id)
            .filter(accounts::Column::CompanyId.eq(company_id))
            .one(conn)
            .await
            .trace("AG-FIND")?
            .ok_or(LedgerError::AccountNotFound(account_id))?;

        let active = AccountStatus::from(account.status) == AccountStatus::Active;
        Ok((active, account))
    }

    /// Fails if the account is read-only.
    ///
    /// # Errors
    ///
    /// `AccountNotFound` or `AccountReadOnly`.
    pub async fn check_not_read_only(
        conn: &impl ConnectionTrait,
        company_id: i64,
        account_id: i64,
    ) -> Result<(), LedgerError> {
        let (_, account) = Self::check_active(conn, company_id, account_id).await?;
        Self::read_write(&account)
    }

    /// Runs both checks with one lookup and returns the account.
    ///
    /// # Errors
    ///
    /// `AccountNotFound`, `AccountInactive` or `AccountReadOnly`.
    pub async fn ensure_postable(
        conn: &impl ConnectionTrait,
        company_id: i64,
        account_id: i64,
    ) -> Result<accounts::Model, LedgerError> {
        let (active, account) = Self::check_active(conn, company_id, account_id).await?;
        if !active {
            tracing::warn!(company_id, account_id, "posting to inactive account rejected");
            return Err(LedgerError::AccountInactive(account_id));
        }
        Self::read_write(&account)?;
        Ok(account)
    }

    fn read_write(account: &accounts::Model) -> Result<(), LedgerError> {
        if account.read_only {
            tracing::warn!(
                company_id = account.company_id,
                account_id = account.id,
                "posting to read-only account rejected"
            );
            return Err(LedgerError::AccountReadOnly(account.id));
        }
        Ok(())
    }
}
