//! `SeaORM` active enums, stored as strings.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use tally_core::ledger;

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
pub enum TransactionType {
    #[sea_orm(string_value = "manual")]
    Manual,
    #[sea_orm(string_value = "journal_entry")]
    JournalEntry,
    #[sea_orm(string_value = "journal_update")]
    JournalUpdate,
    #[sea_orm(string_value = "opening_entry")]
    OpeningEntry,
    #[sea_orm(string_value = "payment_entry")]
    PaymentEntry,
    #[sea_orm(string_value = "receipt_entry")]
    ReceiptEntry,
    #[sea_orm(string_value = "journal_voucher")]
    JournalVoucher,
    #[sea_orm(string_value = "voucher_approve")]
    VoucherApprove,
    #[sea_orm(string_value = "voucher_update")]
    VoucherUpdate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum TransactionStatus {
    #[sea_orm(string_value = "unapproved")]
    Unapproved,
    #[sea_orm(string_value = "approved")]
    Approved,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum AccountStatus {
    #[sea_orm(string_value = "active")]
    Active,
    #[sea_orm(string_value = "inactive")]
    Inactive,
}

impl From<ledger::TransactionType> for TransactionType {
    fn from(value: ledger::TransactionType) -> Self {
        match value {
            ledger::TransactionType::Manual => Self::Manual,
            ledger::TransactionType::JournalEntry => Self::JournalEntry,
            ledger::TransactionType::JournalUpdate => Self::JournalUpdate,
            ledger::TransactionType::OpeningEntry => Self::OpeningEntry,
            ledger::TransactionType::PaymentEntry => Self::PaymentEntry,
            ledger::TransactionType::ReceiptEntry => Self::ReceiptEntry,
            ledger::TransactionType::JournalVoucher => Self::JournalVoucher,
            ledger::TransactionType::VoucherApprove => Self::VoucherApprove,
            ledger::TransactionType::VoucherUpdate => Self::VoucherUpdate,
        }
    }
}

impl From<TransactionType> for ledger::TransactionType {
    fn from(value: TransactionType) -> Self {
        match value {
            TransactionType::Manual => Self::Manual,
            TransactionType::JournalEntry => Self::JournalEntry,
            TransactionType::JournalUpdate => Self::JournalUpdate,
            TransactionType::OpeningEntry => Self::OpeningEntry,
            TransactionType::PaymentEntry => Self::PaymentEntry,
            TransactionType::ReceiptEntry => Self::ReceiptEntry,
            TransactionType::JournalVoucher => Self::JournalVoucher,
            TransactionType::VoucherApprove => Self::VoucherApprove,
            TransactionType::VoucherUpdate => Self::VoucherUpdate,
        }
    }
}

impl From<ledger::TransactionStatus> for TransactionStatus {
    fn from(value: ledger::TransactionStatus) -> Self {
        match value {
            ledger::TransactionStatus::Unapproved => Self::Unapproved,
            ledger::TransactionStatus::Approved => Self::Approved,
        }
    }
}

impl From<TransactionStatus> for ledger::TransactionStatus {
    fn from(value: TransactionStatus) -> Self {
        match value {
            TransactionStatus::Unapproved => Self::Unapproved,
            TransactionStatus::Approved => Self::Approved,
        }
    }
}

impl From<AccountStatus> for ledger::AccountStatus {
    fn from(value: AccountStatus) -> Self {
        match value {
            AccountStatus::Active => Self::Active,
            AccountStatus::Inactive => Self::Inactive,
        }
    }
}
