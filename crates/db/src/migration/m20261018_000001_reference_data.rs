//! Reference tables read by the ledger: accounts, currencies, settings and
//! notifications.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Accounts::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Accounts::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Accounts::CompanyId).big_integer().not_null())
                    .col(ColumnDef::new(Accounts::NodeId).big_integer().not_null())
                    .col(ColumnDef::new(Accounts::Code).string_len(32).not_null())
                    .col(ColumnDef::new(Accounts::Name).string_len(255).not_null())
                    .col(
                        ColumnDef::new(Accounts::Status)
                            .string_len(16)
                            .not_null()
                            .default("active"),
                    )
                    .col(
                        ColumnDef::new(Accounts::ReadOnly)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Accounts::CreatedAt)
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
                    .name("idx_accounts_company_code")
                    .table(Accounts::Table)
                    .col(Accounts::CompanyId)
                    .col(Accounts::Code)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Currencies::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Currencies::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Currencies::CompanyId).big_integer().not_null())
                    .col(ColumnDef::new(Currencies::NodeId).big_integer().not_null())
                    .col(ColumnDef::new(Currencies::Code).string_len(8).not_null())
                    .col(ColumnDef::new(Currencies::Symbol).string_len(8).not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Settings::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Settings::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Settings::CompanyId).big_integer().not_null())
                    .col(ColumnDef::new(Settings::Key).string_len(64).not_null())
                    .col(ColumnDef::new(Settings::Value).text().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_settings_company_key")
                    .table(Settings::Table)
                    .col(Settings::CompanyId)
                    .col(Settings::Key)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Notifications::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Notifications::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Notifications::CompanyId).big_integer().not_null())
                    .col(
                        ColumnDef::new(Notifications::RecipientUserId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Notifications::Title).string_len(255).not_null())
                    .col(ColumnDef::new(Notifications::Message).text().not_null())
                    .col(ColumnDef::new(Notifications::Link).string_len(255).not_null())
                    .col(
                        ColumnDef::new(Notifications::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Notifications::ReadAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .to_owned(),
            )
            .await?;

        // Unread inbox lookup
        manager
            .create_index(
                Index::create()
                    .name("idx_notifications_recipient")
                    .table(Notifications::Table)
                    .col(Notifications::RecipientUserId)
                    .col(Notifications::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Notifications::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Settings::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Currencies::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Accounts::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
pub(super) enum Accounts {
    Table,
    Id,
    CompanyId,
    NodeId,
    Code,
    Name,
    Status,
    ReadOnly,
    CreatedAt,
}

#[derive(DeriveIden)]
pub(super) enum Currencies {
    Table,
    Id,
    CompanyId,
    NodeId,
    Code,
    Symbol,
}

#[derive(DeriveIden)]
enum Settings {
    Table,
    Id,
    CompanyId,
    Key,
    Value,
}

#[derive(DeriveIden)]
enum Notifications {
    Table,
    Id,
    CompanyId,
    RecipientUserId,
    Title,
    Message,
    Link,
    CreatedAt,
    ReadAt,
}
