//! Materialized current balance per (company, node, account, currency).

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::sea_query::OnConflict;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set};
use tally_core::ledger::{BalanceKey, LedgerError};

use crate::entities::{balances, slots};
use crate::trace::TraceExt;

/// Upsert-only cache of each scope's closing balance.
///
/// Only the permanent ledger writes here.
pub struct BalanceCache;

impl BalanceCache {
    /// Inserts or overwrites the balance of `key`.
    pub async fn upsert(
        conn: &impl ConnectionTrait,
        key: BalanceKey,
        balance: Decimal,
    ) -> Result<(), LedgerError> {
        balances::Entity::insert(row(key, balance))
            .on_conflict(
                OnConflict::columns(scope_columns())
                    .update_columns([balances::Column::Balance, balances::Column::UpdatedAt])
                    .to_owned(),
            )
            .exec_without_returning(conn)
            .await
            .trace("BC-UPSERT")?;
        Ok(())
    }

    /// Current cached balance of `key`, if any.
    pub async fn get(
        conn: &impl ConnectionTrait,
        key: BalanceKey,
    ) -> Result<Option<Decimal>, LedgerError> {
        let row = by_key(key).one(conn).await.trace("BC-GET")?;
        Ok(row.map(|r| r.balance))
    }

    /// Recomputes `key` from the last live permanent slot of its chain and
    /// stores it. An empty chain stores zero.
    pub async fn refresh(
        conn: &impl ConnectionTrait,
        key: BalanceKey,
    ) -> Result<Decimal, LedgerError> {
        let chain = key.chain();
        let latest = slots::Entity::find()
            .filter(slots::Column::CompanyId.eq(chain.company_id))
            .filter(slots::Column::AccountId.eq(chain.account_id))
            .filter(slots::Column::CurrencyId.eq(chain.currency_id))
            .filter(slots::Column::DeletedAt.is_null())
            .order_by_desc(slots::Column::PostDate)
            .order_by_desc(slots::Column::Id)
            .one(conn)
            .await
            .trace("BC-REFRESH-LATEST")?;

        let balance = latest.map_or(Decimal::ZERO, |slot| slot.balance);
        Self::upsert(conn, key, balance).await?;
        tracing::debug!(
            company_id = key.company_id,
            account_id = key.account_id,
            currency_id = key.currency_id,
            %balance,
            "balance refreshed"
        );
        Ok(balance)
    }

    /// Takes the per-scope write lock: makes sure the row exists, then
    /// selects it `FOR UPDATE`. Held until the unit of work ends.
    pub async fn lock(
        conn: &impl ConnectionTrait,
        key: BalanceKey,
    ) -> Result<balances::Model, LedgerError> {
        balances::Entity::insert(row(key, Decimal::ZERO))
            .on_conflict(OnConflict::columns(scope_columns()).do_nothing().to_owned())
            .exec_without_returning(conn)
            .await
            .trace("BC-LOCK-ENSURE")?;

        by_key(key)
            .lock_exclusive()
            .one(conn)
            .await
            .trace("BC-LOCK-SELECT")?
            .ok_or_else(|| LedgerError::Internal("balance row vanished under lock".to_string()))
    }
}

fn row(key: BalanceKey, balance: Decimal) -> balances::ActiveModel {
    balances::ActiveModel {
        company_id: Set(key.company_id),
        node_id: Set(key.node_id),
        account_id: Set(key.account_id),
        currency_id: Set(key.currency_id),
        balance: Set(balance),
        updated_at: Set(Utc::now().into()),
        ..Default::default()
    }
}

const fn scope_columns() -> [balances::Column; 4] {
    [
        balances::Column::CompanyId,
        balances::Column::NodeId,
        balances::Column::AccountId,
        balances::Column::CurrencyId,
    ]
}

fn by_key(key: BalanceKey) -> sea_orm::Select<balances::Entity> {
    balances::Entity::find()
        .filter(balances::Column::CompanyId.eq(key.company_id))
        .filter(balances::Column::NodeId.eq(key.node_id))
        .filter(balances::Column::AccountId.eq(key.account_id))
        .filter(balances::Column::CurrencyId.eq(key.currency_id))
}
