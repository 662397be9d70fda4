//! Database layer with `SeaORM` entities, slot ledgers and coordinators.
//!
//! This crate provides:
//! - `SeaORM` entity definitions
//! - Database migrations
//! - The ledger components (guard, balance cache, counters, slot ledgers)
//! - Transaction and voucher coordinators, and the watcher queue
//! - Unit of work and read cache plumbing

pub mod cache;
pub mod context;
pub mod entities;
pub mod migration;
pub mod repositories;
pub mod trace;
pub mod unit_of_work;
pub mod watcher;

pub use cache::ReadCache;
pub use context::LedgerContext;
pub use repositories::{
    LedgerDocument, SlotLedger, TempSlotLedger, TransactionCoordinator, VoucherApproval,
    VoucherCoordinator,
};
pub use unit_of_work::UnitOfWork;
pub use watcher::JournalEntryWatcher;

use std::time::Duration;

use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};
use tally_shared::DatabaseConfig;

/// Establishes a connection pool using the `database` config section.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect(config: &DatabaseConfig) -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new(config.url.clone());
    options
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .connect_timeout(Duration::from_secs(8))
        .sqlx_logging(false);
    Database::connect(options).await
}
