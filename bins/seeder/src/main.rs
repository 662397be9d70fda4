//! Demo data seeder for Tally.
//!
//! Migrates the configured database, seeds a demo company with a small
//! chart of accounts, then posts a transfer and records a voucher so the
//! ledgers and balances have something to show.
//!
//! Usage: cargo run --bin seeder

use anyhow::Context;
use chrono::{NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set};
use sea_orm_migration::MigratorTrait;
use tally_core::ledger::{SlotInput, TransactionInput, TransactionType, TransferInput};
use tally_db::entities::{accounts, currencies, sea_orm_active_enums::AccountStatus};
use tally_db::migration::Migrator;
use tally_db::repositories::SettingStore;
use tally_db::repositories::setting::{INVOICE_PATTERN, STORE_CODE};
use tally_db::{LedgerContext, TransactionCoordinator, VoucherCoordinator};
use tally_shared::AppConfig;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const COMPANY_ID: i64 = 1001;
const NODE_ID: i64 = 1;
const USER_ID: i64 = 1;
const APPROVER_ID: i64 = 2;
const CURRENCY_ID: i64 = 1;

const CHART: [(i64, &str, &str); 4] = [
    (31, "1-100", "Cash on hand"),
    (32, "1-200", "Bank"),
    (33, "4-100", "Sales"),
    (34, "6-100", "Bank fees"),
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "seeder=info,tally_db=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::load().context("failed to load configuration")?;
    let db = tally_db::connect(&config.database)
        .await
        .context("failed to connect to database")?;
    info!("Connected to database");

    Migrator::up(&db, None).await.context("failed to migrate")?;

    seed_reference_data(&db).await?;

    let ctx = LedgerContext::new(db, config.ledger)?;
    SettingStore::new(ctx.cache().clone())
        .set(ctx.db(), COMPANY_ID, STORE_CODE, "HQ")
        .await?;
    SettingStore::new(ctx.cache().clone())
        .set(ctx.db(), COMPANY_ID, INVOICE_PATTERN, "{store}-{year}-{counter:5}")
        .await?;

    seed_documents(&ctx).await?;

    info!("Seeding complete");
    Ok(())
}

/// Seeds the demo currency and chart of accounts, skipping rows that
/// already exist.
async fn seed_reference_data(db: &DatabaseConnection) -> anyhow::Result<()> {
    if currencies::Entity::find_by_id(CURRENCY_ID).one(db).await?.is_none() {
        currencies::ActiveModel {
            id: Set(CURRENCY_ID),
            company_id: Set(COMPANY_ID),
            node_id: Set(NODE_ID),
            code: Set("IDR".to_string()),
            symbol: Set("Rp".to_string()),
        }
        .insert(db)
        .await?;
        info!(currency_id = CURRENCY_ID, "Seeded currency");
    }

    for (id, code, name) in CHART {
        if accounts::Entity::find_by_id(id).one(db).await?.is_some() {
            info!(account_id = id, "Account already exists, skipping");
            continue;
        }
        accounts::ActiveModel {
            id: Set(id),
            company_id: Set(COMPANY_ID),
            node_id: Set(NODE_ID),
            code: Set(code.to_string()),
            name: Set(name.to_string()),
            status: Set(AccountStatus::Active),
            read_only: Set(false),
            created_at: Set(Utc::now().into()),
        }
        .insert(db)
        .await?;
        info!(account_id = id, code, "Seeded account");
    }
    Ok(())
}

/// Posts a transfer from cash to bank and records a bank fee voucher for
/// the approver.
async fn seed_documents(ctx: &LedgerContext) -> anyhow::Result<()> {
    let post_date = demo_date()?;

    let transfer = TransactionCoordinator::new(ctx.clone())
        .transfer(TransferInput {
            company_id: COMPANY_ID,
            node_id: NODE_ID,
            pioneer_account_id: 31,
            follower_account_id: 32,
            currency_id: CURRENCY_ID,
            amount: Decimal::from(1000),
            post_date,
            description: "Deposit daily takings".to_string(),
            user_id: USER_ID,
        })
        .await?;
    info!(invoice = %transfer.header.invoice, "Posted transfer");

    let voucher = VoucherCoordinator::new(ctx.clone())
        .journal_voucher(TransactionInput {
            id: 0,
            company_id: COMPANY_ID,
            node_id: NODE_ID,
            transaction_type: TransactionType::JournalVoucher,
            post_date,
            description: "Monthly bank fee".to_string(),
            currency_id: Some(CURRENCY_ID),
            recipient_user_id: Some(APPROVER_ID),
            user_id: USER_ID,
            slots: vec![
                SlotInput::debit(34, Decimal::from(15)),
                SlotInput::credit(32, Decimal::from(15)),
            ],
        })
        .await?;
    info!(invoice = %voucher.header.invoice, "Recorded voucher awaiting approval");
    Ok(())
}

fn demo_date() -> anyhow::Result<NaiveDateTime> {
    NaiveDate::from_ymd_opt(2020, 10, 19)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .context("invalid demo date")
}
