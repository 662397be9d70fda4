//! `SeaORM` Entity for transactions table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::{TransactionStatus, TransactionType};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub company_id: i64,
    pub node_id: i64,
    pub transaction_type: TransactionType,
    pub status: TransactionStatus,
    pub hash: String,
    pub invoice: String,
    pub counter_group: String,
    pub fiscal_year: i32,
    pub year_counter: i64,
    pub year_cumulative: i64,
    pub post_date: DateTime,
    pub description: String,
    pub recipient_user_id: Option<i64>,
    pub created_by: i64,
    pub updated_by: i64,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
    pub deleted_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::slots::Entity")]
    Slots,
    #[sea_orm(has_many = "super::temp_slots::Entity")]
    TempSlots,
}

impl Related<super::slots::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Slots.def()
    }
}

impl Related<super::temp_slots::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TempSlots.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
