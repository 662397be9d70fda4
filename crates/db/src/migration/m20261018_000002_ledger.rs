//! Ledger tables: transactions, slots, temp_slots and balances.

use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::DbBackend;

use super::m20261018_000001_reference_data::{Accounts, Currencies};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Transactions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Transactions::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Transactions::CompanyId).big_integer().not_null())
                    .col(ColumnDef::new(Transactions::NodeId).big_integer().not_null())
                    .col(
                        ColumnDef::new(Transactions::TransactionType)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Transactions::Status).string_len(16).not_null())
                    .col(ColumnDef::new(Transactions::Hash).string_len(64).not_null())
                    .col(ColumnDef::new(Transactions::Invoice).string_len(64).not_null())
                    .col(
                        ColumnDef::new(Transactions::CounterGroup)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Transactions::FiscalYear).integer().not_null())
                    .col(ColumnDef::new(Transactions::YearCounter).big_integer().not_null())
                    .col(
                        ColumnDef::new(Transactions::YearCumulative)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Transactions::PostDate).timestamp().not_null())
                    .col(
                        ColumnDef::new(Transactions::Description)
                            .text()
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(Transactions::RecipientUserId)
                            .big_integer()
                            .null(),
                    )
                    .col(ColumnDef::new(Transactions::CreatedBy).big_integer().not_null())
                    .col(ColumnDef::new(Transactions::UpdatedBy).big_integer().not_null())
                    .col(
                        ColumnDef::new(Transactions::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Transactions::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Transactions::DeletedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .to_owned(),
            )
            .await?;

        // Soft-deleted rows keep their numbers, so the index spans them too
        manager
            .create_index(
                Index::create()
                    .name("idx_transactions_counter")
                    .table(Transactions::Table)
                    .col(Transactions::CompanyId)
                    .col(Transactions::CounterGroup)
                    .col(Transactions::FiscalYear)
                    .col(Transactions::YearCounter)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_transactions_company_date")
                    .table(Transactions::Table)
                    .col(Transactions::CompanyId)
                    .col(Transactions::PostDate)
                    .to_owned(),
            )
            .await?;

        for (table, prefix) in [
            (Slots::Table.into_iden(), "slots"),
            (TempSlots::Table.into_iden(), "temp_slots"),
        ] {
            create_slot_table(manager, table, prefix).await?;
        }

        manager
            .create_table(
                Table::create()
                    .table(Balances::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Balances::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Balances::CompanyId).big_integer().not_null())
                    .col(ColumnDef::new(Balances::NodeId).big_integer().not_null())
                    .col(ColumnDef::new(Balances::AccountId).big_integer().not_null())
                    .col(ColumnDef::new(Balances::CurrencyId).big_integer().not_null())
                    .col(money(manager, Balances::Balance))
                    .col(
                        ColumnDef::new(Balances::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_balances_scope")
                    .table(Balances::Table)
                    .col(Balances::CompanyId)
                    .col(Balances::NodeId)
                    .col(Balances::AccountId)
                    .col(Balances::CurrencyId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Balances::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(TempSlots::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Slots::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Transactions::Table).to_owned())
            .await?;
        Ok(())
    }
}

/// A non-null money column defaulting to zero. `SQLite` caps decimal
/// precision at 16 digits; every other backend gets (19, 4).
fn money(manager: &SchemaManager<'_>, column: impl IntoIden) -> ColumnDef {
    let precision = if manager.get_database_backend() == DbBackend::Sqlite {
        16
    } else {
        19
    };
    ColumnDef::new(column)
        .decimal_len(precision, 4)
        .not_null()
        .default(0)
        .to_owned()
}

/// `slots` and `temp_slots` share one shape.
async fn create_slot_table(
    manager: &SchemaManager<'_>,
    table: DynIden,
    prefix: &str,
) -> Result<(), DbErr> {
    manager
        .create_table(
            Table::create()
                .table(table.clone())
                .if_not_exists()
                .col(
                    ColumnDef::new(Slots::Id)
                        .big_integer()
                        .not_null()
                        .auto_increment()
                        .primary_key(),
                )
                .col(ColumnDef::new(Slots::CompanyId).big_integer().not_null())
                .col(ColumnDef::new(Slots::NodeId).big_integer().not_null())
                .col(ColumnDef::new(Slots::TransactionId).big_integer().not_null())
                .col(ColumnDef::new(Slots::AccountId).big_integer().not_null())
                .col(ColumnDef::new(Slots::CurrencyId).big_integer().not_null())
                .col(money(manager, Slots::Debit))
                .col(money(manager, Slots::Credit))
                .col(money(manager, Slots::Balance))
                .col(ColumnDef::new(Slots::PostDate).timestamp().not_null())
                .col(
                    ColumnDef::new(Slots::Description)
                        .text()
                        .not_null()
                        .default(""),
                )
                .col(
                    ColumnDef::new(Slots::CreatedAt)
                        .timestamp_with_time_zone()
                        .not_null()
                        .default(Expr::current_timestamp()),
                )
                .col(
                    ColumnDef::new(Slots::UpdatedAt)
                        .timestamp_with_time_zone()
                        .not_null()
                        .default(Expr::current_timestamp()),
                )
                .col(
                    ColumnDef::new(Slots::DeletedAt)
                        .timestamp_with_time_zone()
                        .null(),
                )
                .foreign_key(
                    ForeignKey::create()
                        .name(format!("fk_{prefix}_transaction"))
                        .from(table.clone(), Slots::TransactionId)
                        .to(Transactions::Table, Transactions::Id),
                )
                .foreign_key(
                    ForeignKey::create()
                        .name(format!("fk_{prefix}_account"))
                        .from(table.clone(), Slots::AccountId)
                        .to(Accounts::Table, Accounts::Id),
                )
                .foreign_key(
                    ForeignKey::create()
                        .name(format!("fk_{prefix}_currency"))
                        .from(table.clone(), Slots::CurrencyId)
                        .to(Currencies::Table, Currencies::Id),
                )
                .to_owned(),
        )
        .await?;

    // Chain walk: scope, then (post_date, id)
    manager
        .create_index(
            Index::create()
                .name(format!("idx_{prefix}_chain"))
                .table(table.clone())
                .col(Slots::CompanyId)
                .col(Slots::AccountId)
                .col(Slots::CurrencyId)
                .col(Slots::PostDate)
                .col(Slots::Id)
                .to_owned(),
        )
        .await?;

    manager
        .create_index(
            Index::create()
                .name(format!("idx_{prefix}_transaction"))
                .table(table)
                .col(Slots::TransactionId)
                .to_owned(),
        )
        .await
}

#[derive(DeriveIden)]
enum Transactions {
    Table,
    Id,
    CompanyId,
    NodeId,
    TransactionType,
    Status,
    Hash,
    Invoice,
    CounterGroup,
    FiscalYear,
    YearCounter,
    YearCumulative,
    PostDate,
    Description,
    RecipientUserId,
    CreatedBy,
    UpdatedBy,
    CreatedAt,
    UpdatedAt,
    DeletedAt,
}

#[derive(DeriveIden)]
enum Slots {
    Table,
    Id,
    CompanyId,
    NodeId,
    TransactionId,
    AccountId,
    CurrencyId,
    Debit,
    Credit,
    Balance,
    PostDate,
    Description,
    CreatedAt,
    UpdatedAt,
    DeletedAt,
}

#[derive(DeriveIden)]
enum TempSlots {
    Table,
}

#[derive(DeriveIden)]
enum Balances {
    Table,
    Id,
    CompanyId,
    NodeId,
    AccountId,
    CurrencyId,
    Balance,
    UpdatedAt,
}
