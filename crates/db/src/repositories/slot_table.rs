//! Storage seam shared by the permanent and provisional slot tables.
//!
//! `slots` and `temp_slots` have the same shape. [`SlotTable`] exposes the
//! handful of queries the chain algorithm needs, and [`Permanent`] and
//! [`Provisional`] implement it over the two entities.

use async_trait::async_trait;
use chrono::{NaiveDateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ActiveValue, ColumnTrait, Condition, ConnectionTrait, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};
use tally_core::ledger::{ChainPosition, ChainScope, SlotDraft};

use crate::entities::{slots, temp_slots};

/// A stored slot, permanent or provisional.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotRecord {
    /// Slot id.
    pub id: i64,
    /// Company.
    pub company_id: i64,
    /// Node of the owning document.
    pub node_id: i64,
    /// Owning document.
    pub transaction_id: i64,
    /// Account.
    pub account_id: i64,
    /// Currency.
    pub currency_id: i64,
    /// Debit amount.
    pub debit: Decimal,
    /// Credit amount.
    pub credit: Decimal,
    /// Running balance of the chain up to and including this slot.
    pub balance: Decimal,
    /// Business date.
    pub post_date: NaiveDateTime,
    /// Line description.
    pub description: String,
    /// Insert time.
    pub created_at: DateTimeWithTimeZone,
    /// Last write time.
    pub updated_at: DateTimeWithTimeZone,
    /// Tombstone.
    pub deleted_at: Option<DateTimeWithTimeZone>,
}

impl SlotRecord {
    /// Position in the chain.
    #[must_use]
    pub const fn position(&self) -> ChainPosition {
        ChainPosition {
            post_date: self.post_date,
            id: self.id,
        }
    }

    /// Chain the slot belongs to.
    #[must_use]
    pub const fn scope(&self) -> ChainScope {
        ChainScope {
            company_id: self.company_id,
            account_id: self.account_id,
            currency_id: self.currency_id,
        }
    }

    /// Signed effect on the chain.
    #[must_use]
    pub fn contribution(&self) -> Decimal {
        self.debit - self.credit
    }

    /// The slot as a draft, for diffing against submitted slots.
    #[must_use]
    pub fn draft(&self) -> SlotDraft {
        SlotDraft {
            id: self.id,
            company_id: self.company_id,
            node_id: self.node_id,
            transaction_id: self.transaction_id,
            account_id: self.account_id,
            currency_id: self.currency_id,
            debit: self.debit,
            credit: self.credit,
            post_date: self.post_date,
            description: self.description.clone(),
        }
    }
}

/// Partial update of a slot row. `None` leaves a column untouched.
#[derive(Debug, Clone, Default)]
pub struct SlotPatch {
    /// New account.
    pub account_id: Option<i64>,
    /// New currency.
    pub currency_id: Option<i64>,
    /// New debit.
    pub debit: Option<Decimal>,
    /// New credit.
    pub credit: Option<Decimal>,
    /// New running balance.
    pub balance: Option<Decimal>,
    /// New business date.
    pub post_date: Option<NaiveDateTime>,
    /// New description.
    pub description: Option<String>,
    /// Tombstone time.
    pub deleted_at: Option<DateTimeWithTimeZone>,
}

impl SlotPatch {
    /// Sets only the running balance.
    #[must_use]
    pub fn balance(balance: Decimal) -> Self {
        Self {
            balance: Some(balance),
            ..Self::default()
        }
    }

    /// Overwrites every field an update may change, with the balance reset
    /// to zero until the slot is placed again.
    #[must_use]
    pub fn rewrite(draft: &SlotDraft) -> Self {
        Self {
            account_id: Some(draft.account_id),
            currency_id: Some(draft.currency_id),
            debit: Some(draft.debit),
            credit: Some(draft.credit),
            balance: Some(Decimal::ZERO),
            post_date: Some(draft.post_date),
            description: Some(draft.description.clone()),
            deleted_at: None,
        }
    }
}

fn value<V: Into<sea_orm::Value>>(v: Option<V>) -> ActiveValue<V> {
    v.map_or(ActiveValue::NotSet, Set)
}

/// Queries the chain algorithm runs against one slot table.
///
/// Every query that walks a chain only sees live rows (`deleted_at IS
/// NULL`).
#[async_trait]
pub trait SlotTable: Send + Sync + 'static {
    /// Table name, for logs.
    const TABLE: &'static str;
    /// Whether mutations must keep the balance cache current.
    const WRITES_BALANCE: bool;

    /// Inserts a slot with a zero balance.
    async fn insert<C: ConnectionTrait>(conn: &C, draft: &SlotDraft) -> Result<SlotRecord, DbErr>;

    /// Finds a slot by id, tombstoned or not.
    async fn find<C: ConnectionTrait>(conn: &C, id: i64) -> Result<Option<SlotRecord>, DbErr>;

    /// Last live slot strictly before `before`, read `FOR UPDATE`.
    async fn preceding<C: ConnectionTrait>(
        conn: &C,
        scope: ChainScope,
        before: ChainPosition,
    ) -> Result<Option<SlotRecord>, DbErr>;

    /// Last live slot of the chain.
    async fn latest<C: ConnectionTrait>(
        conn: &C,
        scope: ChainScope,
    ) -> Result<Option<SlotRecord>, DbErr>;

    /// Adds `delta` to the balance of every live slot strictly after
    /// `after`. Returns the number of rows shifted.
    async fn shift_after<C: ConnectionTrait>(
        conn: &C,
        scope: ChainScope,
        after: ChainPosition,
        delta: Decimal,
    ) -> Result<u64, DbErr>;

    /// Applies a partial update and bumps `updated_at`.
    async fn update<C: ConnectionTrait>(conn: &C, id: i64, patch: SlotPatch) -> Result<(), DbErr>;

    /// Physically deletes a row.
    async fn delete<C: ConnectionTrait>(conn: &C, id: i64) -> Result<(), DbErr>;

    /// Live slots of a document, by id.
    async fn by_transaction<C: ConnectionTrait>(
        conn: &C,
        transaction_id: i64,
    ) -> Result<Vec<SlotRecord>, DbErr>;

    /// One page of a chain in chronological order, with the chain length.
    async fn page<C: ConnectionTrait>(
        conn: &C,
        scope: ChainScope,
        offset: u64,
        limit: u64,
    ) -> Result<(Vec<SlotRecord>, u64), DbErr>;
}

/// The permanent `slots` table.
pub struct Permanent;

/// The provisional `temp_slots` table.
pub struct Provisional;

macro_rules! slot_table {
    ($table:ident, $entity:ident, $name:literal, $writes_balance:literal) => {
        impl From<$entity::Model> for SlotRecord {
            fn from(m: $entity::Model) -> Self {
                Self {
                    id: m.id,
                    company_id: m.company_id,
                    node_id: m.node_id,
                    transaction_id: m.transaction_id,
                    account_id: m.account_id,
                    currency_id: m.currency_id,
                    debit: m.debit,
                    credit: m.credit,
                    balance: m.balance,
                    post_date: m.post_date,
                    description: m.description,
                    created_at: m.created_at,
                    updated_at: m.updated_at,
                    deleted_at: m.deleted_at,
                }
            }
        }

        impl $table {
            fn live(scope: ChainScope) -> Condition {
                Condition::all()
                    .add($entity::Column::CompanyId.eq(scope.company_id))
                    .add($entity::Column::AccountId.eq(scope.account_id))
                    .add($entity::Column::CurrencyId.eq(scope.currency_id))
                    .add($entity::Column::DeletedAt.is_null())
            }

            fn before(at: ChainPosition) -> Condition {
                Condition::any()
                    .add($entity::Column::PostDate.lt(at.post_date))
                    .add(
                        Condition::all()
                            .add($entity::Column::PostDate.eq(at.post_date))
                            .add($entity::Column::Id.lt(at.id)),
                    )
            }

            fn after(at: ChainPosition) -> Condition {
                Condition::any()
                    .add($entity::Column::PostDate.gt(at.post_date))
                    .add(
                        Condition::all()
                            .add($entity::Column::PostDate.eq(at.post_date))
                            .add($entity::Column::Id.gt(at.id)),
                    )
            }
        }

        #[async_trait]
        impl SlotTable for $table {
            const TABLE: &'static str = $name;
            const WRITES_BALANCE: bool = $writes_balance;

            async fn insert<C: ConnectionTrait>(
                conn: &C,
                draft: &SlotDraft,
            ) -> Result<SlotRecord, DbErr> {
                let now: DateTimeWithTimeZone = Utc::now().into();
                let row = $entity::ActiveModel {
                    company_id: Set(draft.company_id),
                    node_id: Set(draft.node_id),
                    transaction_id: Set(draft.transaction_id),
                    account_id: Set(draft.account_id),
                    currency_id: Set(draft.currency_id),
                    debit: Set(draft.debit),
                    credit: Set(draft.credit),
                    balance: Set(Decimal::ZERO),
                    post_date: Set(draft.post_date),
                    description: Set(draft.description.clone()),
                    created_at: Set(now),
                    updated_at: Set(now),
                    deleted_at: Set(None),
                    ..Default::default()
                };
                row.insert(conn).await.map(SlotRecord::from)
            }

            async fn find<C: ConnectionTrait>(
                conn: &C,
                id: i64,
            ) -> Result<Option<SlotRecord>, DbErr> {
                let row = $entity::Entity::find_by_id(id).one(conn).await?;
                Ok(row.map(SlotRecord::from))
            }

            async fn preceding<C: ConnectionTrait>(
                conn: &C,
                scope: ChainScope,
                before: ChainPosition,
            ) -> Result<Option<SlotRecord>, DbErr> {
                let row = $entity::Entity::find()
                    .filter(Self::live(scope))
                    .filter(Self::before(before))
                    .order_by_desc($entity::Column::PostDate)
                    .order_by_desc($entity::Column::Id)
                    .lock_exclusive()
                    .one(conn)
                    .await?;
                Ok(row.map(SlotRecord::from))
            }

            async fn latest<C: ConnectionTrait>(
                conn: &C,
                scope: ChainScope,
            ) -> Result<Option<SlotRecord>, DbErr> {
                let row = $entity::Entity::find()
                    .filter(Self::live(scope))
                    .order_by_desc($entity::Column::PostDate)
                    .order_by_desc($entity::Column::Id)
                    .one(conn)
                    .await?;
                Ok(row.map(SlotRecord::from))
            }

            async fn shift_after<C: ConnectionTrait>(
                conn: &C,
                scope: ChainScope,
                after: ChainPosition,
                delta: Decimal,
            ) -> Result<u64, DbErr> {
                let result = $entity::Entity::update_many()
                    .col_expr(
                        $entity::Column::Balance,
                        Expr::col($entity::Column::Balance).add(delta),
                    )
                    .filter(Self::live(scope))
                    .filter(Self::after(after))
                    .exec(conn)
                    .await?;
                Ok(result.rows_affected)
            }

            async fn update<C: ConnectionTrait>(
                conn: &C,
                id: i64,
                patch: SlotPatch,
            ) -> Result<(), DbErr> {
                let row = $entity::ActiveModel {
                    account_id: value(patch.account_id),
                    currency_id: value(patch.currency_id),
                    debit: value(patch.debit),
                    credit: value(patch.credit),
                    balance: value(patch.balance),
                    post_date: value(patch.post_date),
                    description: value(patch.description),
                    deleted_at: patch.deleted_at.map_or(ActiveValue::NotSet, |at| Set(Some(at))),
                    updated_at: Set(Utc::now().into()),
                    ..Default::default()
                };
                $entity::Entity::update_many()
                    .set(row)
                    .filter($entity::Column::Id.eq(id))
                    .exec(conn)
                    .await?;
                Ok(())
            }

            async fn delete<C: ConnectionTrait>(conn: &C, id: i64) -> Result<(), DbErr> {
                $entity::Entity::delete_by_id(id).exec(conn).await?;
                Ok(())
            }

            async fn by_transaction<C: ConnectionTrait>(
                conn: &C,
                transaction_id: i64,
            ) -> Result<Vec<SlotRecord>, DbErr> {
                let rows = $entity::Entity::find()
                    .filter($entity::Column::TransactionId.eq(transaction_id))
                    .filter($entity::Column::DeletedAt.is_null())
                    .order_by_asc($entity::Column::Id)
                    .all(conn)
                    .await?;
                Ok(rows.into_iter().map(SlotRecord::from).collect())
            }

            async fn page<C: ConnectionTrait>(
                conn: &C,
                scope: ChainScope,
                offset: u64,
                limit: u64,
            ) -> Result<(Vec<SlotRecord>, u64), DbErr> {
                let query = $entity::Entity::find().filter(Self::live(scope));
                let total = query.clone().count(conn).await?;
                let rows = query
                    .order_by_asc($entity::Column::PostDate)
                    .order_by_asc($entity::Column::Id)
                    .offset(offset)
                    .limit(limit)
                    .all(conn)
                    .await?;
                Ok((rows.into_iter().map(SlotRecord::from).collect(), total))
            }
        }
    };
}

slot_table!(Permanent, slots, "slots", true);
slot_table!(Provisional, temp_slots, "temp_slots", false);

impl Provisional {
    /// Physically deletes every row of a voucher, tombstones included.
    pub async fn delete_transaction<C: ConnectionTrait>(
        conn: &C,
        transaction_id: i64,
    ) -> Result<u64, DbErr> {
        let result = temp_slots::Entity::delete_many()
            .filter(temp_slots::Column::TransactionId.eq(transaction_id))
            .exec(conn)
            .await?;
        Ok(result.rows_affected)
    }
}
