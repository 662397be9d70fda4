//! Ledger components over the database.
//!
//! Leaf-first: account guard, reference lookups and the balance cache;
//! counters; the two slot ledgers; the coordinators that group slots into
//! documents.

pub mod account_guard;
pub mod balance;
pub mod counter;
pub mod currency;
pub mod document;
pub mod notification;
pub mod setting;
pub mod slot_ledger;
pub mod slot_table;
pub mod transaction;
pub mod voucher;

pub use account_guard::AccountGuard;
pub use balance::BalanceCache;
pub use counter::CounterAllocator;
pub use currency::CurrencyLookup;
pub use document::LedgerDocument;
pub use notification::{NewNotification, NotificationService};
pub use setting::SettingStore;
pub use slot_ledger::{ChainLedger, SlotLedger, TempSlotLedger};
pub use slot_table::{Permanent, Provisional, SlotPatch, SlotRecord, SlotTable};
pub use transaction::TransactionCoordinator;
pub use voucher::{VoucherApproval, VoucherCoordinator};
