//! Shared fixtures: an in-memory `SQLite` ledger with one seeded company.

#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ConnectOptions, ConnectionTrait, Database,
    DatabaseConnection,
};
use sea_orm_migration::MigratorTrait;
use tally_core::ledger::{
    BalanceKey, ChainEntry, ChainPosition, ChainScope, SlotInput, TransactionInput,
    TransactionType, first_break,
};
use tally_db::entities::{accounts, currencies, sea_orm_active_enums::AccountStatus};
use tally_db::migration::Migrator;
use tally_db::LedgerContext;
use tally_db::repositories::{
    BalanceCache, Permanent, Provisional, SlotLedger, SlotRecord, SlotTable,
};
use tally_shared::LedgerConfig;

pub const COMPANY: i64 = 1001;
pub const NODE: i64 = 1;
pub const USER: i64 = 7;
pub const APPROVER: i64 = 8;
pub const IDR: i64 = 1;

pub const CASH: i64 = 31;
pub const BANK: i64 = 32;
pub const SALES: i64 = 33;
pub const FEES: i64 = 34;
pub const DORMANT: i64 = 35;
pub const LOCKED: i64 = 36;

/// Connects to a fresh in-memory database and runs every migration.
pub async fn connect() -> DatabaseConnection {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);
    let db = Database::connect(options)
        .await
        .expect("Failed to connect to database");
    Migrator::up(&db, None).await.expect("Failed to migrate");
    db
}

/// A migrated database with company [`COMPANY`] seeded, wrapped in a
/// context with default configuration.
pub async fn ledger() -> LedgerContext {
    ledger_with(LedgerConfig::default()).await
}

pub async fn ledger_with(config: LedgerConfig) -> LedgerContext {
    let db = connect().await;
    seed(&db).await;
    LedgerContext::new(db, config).expect("valid ledger config")
}

async fn seed(db: &DatabaseConnection) {
    currencies::ActiveModel {
        id: Set(IDR),
        company_id: Set(COMPANY),
        node_id: Set(NODE),
        code: Set("IDR".to_string()),
        symbol: Set("Rp".to_string()),
    }
    .insert(db)
    .await
    .expect("Failed to seed currency");

    let chart = [
        (CASH, "1-100", "Cash", AccountStatus::Active, false),
        (BANK, "1-200", "Bank", AccountStatus::Active, false),
        (SALES, "4-100", "Sales", AccountStatus::Active, false),
        (FEES, "6-100", "Bank fees", AccountStatus::Active, false),
        (DORMANT, "1-900", "Old till", AccountStatus::Inactive, false),
        (LOCKED, "3-100", "Retained earnings", AccountStatus::Active, true),
    ];
    for (id, code, name, status, read_only) in chart {
        accounts::ActiveModel {
            id: Set(id),
            company_id: Set(COMPANY),
            node_id: Set(NODE),
            code: Set(code.to_string()),
            name: Set(name.to_string()),
            status: Set(status),
            read_only: Set(read_only),
            created_at: Set(Utc::now().into()),
        }
        .insert(db)
        .await
        .expect("Failed to seed account");
    }
}

pub fn day(year: i32, month: u32, day: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(year, month, day)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

pub fn amount(value: i64) -> Decimal {
    Decimal::from(value)
}

pub fn document(
    transaction_type: TransactionType,
    post_date: NaiveDateTime,
    slots: Vec<SlotInput>,
) -> TransactionInput {
    TransactionInput {
        id: 0,
        company_id: COMPANY,
        node_id: NODE,
        transaction_type,
        post_date,
        description: String::new(),
        currency_id: Some(IDR),
        recipient_user_id: None,
        user_id: USER,
        slots,
    }
}

pub fn scope(account_id: i64) -> ChainScope {
    ChainScope {
        company_id: COMPANY,
        account_id,
        currency_id: IDR,
    }
}

pub fn key(account_id: i64) -> BalanceKey {
    BalanceKey {
        company_id: COMPANY,
        node_id: NODE,
        account_id,
        currency_id: IDR,
    }
}

/// Loads a whole chain and asserts that every stored balance follows the
/// running balance recurrence.
pub async fn assert_unbroken<T: SlotTable, C: ConnectionTrait>(
    conn: &C,
    account_id: i64,
) -> Vec<SlotRecord> {
    let (rows, _) = T::page(conn, scope(account_id), 0, 10_000)
        .await
        .expect("Failed to load chain");
    let entries: Vec<ChainEntry> = rows
        .iter()
        .map(|slot| ChainEntry {
            position: ChainPosition {
                post_date: slot.post_date,
                id: slot.id,
            },
            debit: slot.debit,
            credit: slot.credit,
            balance: slot.balance,
        })
        .collect();
    assert_eq!(
        first_break(&entries),
        None,
        "{} chain of account {account_id} is broken",
        T::TABLE
    );
    rows
}

/// Asserts the permanent chain through `conn`, which may be an open unit
/// of work, and checks the balance cache against its last slot.
pub async fn assert_chain_on<C: ConnectionTrait>(
    conn: &C,
    ctx: &LedgerContext,
    account_id: i64,
) -> Vec<SlotRecord> {
    let rows = assert_unbroken::<Permanent, _>(conn, account_id).await;

    let latest = SlotLedger::new(ctx)
        .latest(conn, scope(account_id))
        .await
        .expect("Failed to load latest slot");
    let cached = BalanceCache::get(conn, key(account_id))
        .await
        .expect("Failed to read balance cache");
    assert_eq!(
        cached.unwrap_or(Decimal::ZERO),
        latest.map_or(Decimal::ZERO, |s| s.balance),
        "balance cache of account {account_id} disagrees with the chain"
    );
    rows
}

pub async fn assert_chain_consistent(ctx: &LedgerContext, account_id: i64) -> Vec<SlotRecord> {
    assert_chain_on(ctx.db(), ctx, account_id).await
}

/// Provisional chains keep no balance cache; only the recurrence is checked.
pub async fn assert_temp_chain(ctx: &LedgerContext, account_id: i64) -> Vec<SlotRecord> {
    assert_unbroken::<Provisional, _>(ctx.db(), account_id).await
}
