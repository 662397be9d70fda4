//! Ledger domain types for document creation and validation.
//!
//! This module defines the types shared by the permanent ledger, the
//! provisional (voucher) ledger and the coordinators that drive them.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::LedgerError;

/// Kind of ledger document.
///
/// Several kinds share one invoice counter sequence; see
/// [`CounterGroups`](super::counter::CounterGroups).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    /// Manual transfer between two accounts.
    Manual,
    /// General journal entry.
    JournalEntry,
    /// Edit of a journal entry.
    JournalUpdate,
    /// Opening balance entry.
    OpeningEntry,
    /// Outgoing payment.
    PaymentEntry,
    /// Incoming receipt.
    ReceiptEntry,
    /// Journal entry awaiting approval.
    JournalVoucher,
    /// Approval of a journal voucher.
    VoucherApprove,
    /// Edit of a pending journal voucher.
    VoucherUpdate,
}

impl TransactionType {
    /// Every transaction type, in declaration order.
    pub const ALL: [Self; 9] = [
        Self::Manual,
        Self::JournalEntry,
        Self::JournalUpdate,
        Self::OpeningEntry,
        Self::PaymentEntry,
        Self::ReceiptEntry,
        Self::JournalVoucher,
        Self::VoucherApprove,
        Self::VoucherUpdate,
    ];

    /// Returns the snake_case name used in storage and configuration.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Manual => "manual",
            Self::JournalEntry => "journal_entry",
            Self::JournalUpdate => "journal_update",
            Self::OpeningEntry => "opening_entry",
            Self::PaymentEntry => "payment_entry",
            Self::ReceiptEntry => "receipt_entry",
            Self::JournalVoucher => "journal_voucher",
            Self::VoucherApprove => "voucher_approve",
            Self::VoucherUpdate => "voucher_update",
        }
    }

    /// Returns true for types that pass through the approval step.
    #[must_use]
    pub const fn is_voucher(self) -> bool {
        matches!(
            self,
            Self::JournalVoucher | Self::VoucherApprove | Self::VoucherUpdate
        )
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionType {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| LedgerError::UnknownTransactionType(s.to_string()))
    }
}

/// Document status.
///
/// `Unapproved` is only used by vouchers; every other document is created
/// directly as `Approved`. `Approved` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    /// Provisional; slots live in the temp ledger.
    Unapproved,
    /// Final; slots live in the permanent ledger.
    Approved,
}

impl TransactionStatus {
    /// Returns true if no further transition is possible.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Approved)
    }

    /// Returns true if moving from `self` to `next` is a legal transition.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!((self, next), (Self::Unapproved, Self::Approved))
    }
}

/// Account availability, as recorded by the account master data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountStatus {
    /// Account accepts postings.
    Active,
    /// Account is closed for postings.
    Inactive,
}

/// Scope of one running-balance chain: slots of the same company, account
/// and currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChainScope {
    /// Company the slots belong to.
    pub company_id: i64,
    /// Account the slots post to.
    pub account_id: i64,
    /// Currency of the slot amounts.
    pub currency_id: i64,
}

/// Unique key of a materialized balance.
///
/// The node is the account's node, so a key maps onto exactly one chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BalanceKey {
    /// Company.
    pub company_id: i64,
    /// Node (store/branch) owning the account.
    pub node_id: i64,
    /// Account.
    pub account_id: i64,
    /// Currency.
    pub currency_id: i64,
}

impl BalanceKey {
    /// Returns the chain this balance summarizes.
    #[must_use]
    pub const fn chain(&self) -> ChainScope {
        ChainScope {
            company_id: self.company_id,
            account_id: self.account_id,
            currency_id: self.currency_id,
        }
    }
}

/// Position of a slot in its chain. Chains are ordered by `(post_date, id)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ChainPosition {
    /// Business date of the slot.
    pub post_date: NaiveDateTime,
    /// Slot id; breaks ties between slots on the same date.
    pub id: i64,
}

/// A slot as submitted by a caller, before it is stamped with the
/// document's date and default currency.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotInput {
    /// Existing slot id, or 0 for a new slot.
    pub id: i64,
    /// Account to post to.
    pub account_id: i64,
    /// Currency; `None` inherits the document currency.
    pub currency_id: Option<i64>,
    /// Debit amount (zero for a credit slot).
    pub debit: Decimal,
    /// Credit amount (zero for a debit slot).
    pub credit: Decimal,
    /// Free-text line description.
    pub description: String,
}

impl SlotInput {
    /// Creates a new debit slot.
    #[must_use]
    pub fn debit(account_id: i64, amount: Decimal) -> Self {
        Self {
            id: 0,
            account_id,
            currency_id: None,
            debit: amount,
            credit: Decimal::ZERO,
            description: String::new(),
        }
    }

    /// Creates a new credit slot.
    #[must_use]
    pub fn credit(account_id: i64, amount: Decimal) -> Self {
        Self {
            id: 0,
            account_id,
            currency_id: None,
            debit: Decimal::ZERO,
            credit: amount,
            description: String::new(),
        }
    }

    /// Sets the currency.
    #[must_use]
    pub fn in_currency(mut self, currency_id: i64) -> Self {
        self.currency_id = Some(currency_id);
        self
    }

    /// Sets the existing slot id.
    #[must_use]
    pub fn with_id(mut self, id: i64) -> Self {
        self.id = id;
        self
    }

    /// Sets the line description.
    #[must_use]
    pub fn described(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// A slot stamped with its document's scope, date and currency.
///
/// This is the unit the slot ledgers persist and the form in which prior
/// and incoming slots are compared during an update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotDraft {
    /// Existing slot id, or 0 for a new slot.
    pub id: i64,
    /// Company.
    pub company_id: i64,
    /// Node of the owning document.
    pub node_id: i64,
    /// Owning document, or 0 while the document is not yet persisted.
    pub transaction_id: i64,
    /// Account.
    pub account_id: i64,
    /// Currency.
    pub currency_id: i64,
    /// Debit amount.
    pub debit: Decimal,
    /// Credit amount.
    pub credit: Decimal,
    /// Business date.
    pub post_date: NaiveDateTime,
    /// Line description.
    pub description: String,
}

impl SlotDraft {
    /// Signed effect of this slot on its chain.
    #[must_use]
    pub fn contribution(&self) -> Decimal {
        self.debit - self.credit
    }

    /// Chain this slot belongs to.
    #[must_use]
    pub const fn chain(&self) -> ChainScope {
        ChainScope {
            company_id: self.company_id,
            account_id: self.account_id,
            currency_id: self.currency_id,
        }
    }

    /// Returns true if a field that affects balances differs.
    #[must_use]
    pub fn changes_balances(&self, other: &Self) -> bool {
        self.account_id != other.account_id
            || self.currency_id != other.currency_id
            || self.debit != other.debit
            || self.credit != other.credit
            || self.post_date != other.post_date
    }

    /// Returns true if any field an update may touch differs.
    #[must_use]
    pub fn differs_from(&self, other: &Self) -> bool {
        self.changes_balances(other) || self.description != other.description
    }
}

/// A ledger document as submitted by a caller.
#[derive(Debug, Clone)]
pub struct TransactionInput {
    /// Existing document id, or 0 when creating.
    pub id: i64,
    /// Company.
    pub company_id: i64,
    /// Node (store/branch) issuing the document.
    pub node_id: i64,
    /// Document type.
    pub transaction_type: TransactionType,
    /// Business date applied to every slot.
    pub post_date: NaiveDateTime,
    /// Document description.
    pub description: String,
    /// Currency applied to slots that do not name one.
    pub currency_id: Option<i64>,
    /// User to notify about a voucher awaiting approval.
    pub recipient_user_id: Option<i64>,
    /// Acting user.
    pub user_id: i64,
    /// Document lines.
    pub slots: Vec<SlotInput>,
}

impl TransactionInput {
    /// Stamps every slot with the document's company, node, date and
    /// default currency.
    ///
    /// # Errors
    ///
    /// Returns `MissingCurrency` if a slot has no currency and the document
    /// has no default.
    pub fn stamp_slots(&self) -> Result<Vec<SlotDraft>, LedgerError> {
        self.slots
            .iter()
            .map(|slot| {
                let currency_id = slot
                    .currency_id
                    .or(self.currency_id)
                    .ok_or(LedgerError::MissingCurrency {
                        account_id: slot.account_id,
                    })?;
                Ok(SlotDraft {
                    id: slot.id,
                    company_id: self.company_id,
                    node_id: self.node_id,
                    transaction_id: self.id,
                    account_id: slot.account_id,
                    currency_id,
                    debit: slot.debit,
                    credit: slot.credit,
                    post_date: self.post_date,
                    description: slot.description.clone(),
                })
            })
            .collect()
    }
}

/// A two-account transfer request.
#[derive(Debug, Clone)]
pub struct TransferInput {
    /// Company.
    pub company_id: i64,
    /// Node issuing the transfer.
    pub node_id: i64,
    /// Account the money leaves (credited).
    pub pioneer_account_id: i64,
    /// Account the money enters (debited).
    pub follower_account_id: i64,
    /// Currency of the amount.
    pub currency_id: i64,
    /// Amount moved; must be positive.
    pub amount: Decimal,
    /// Business date.
    pub post_date: NaiveDateTime,
    /// Description for the document and both slots.
    pub description: String,
    /// Acting user.
    pub user_id: i64,
}

impl TransferInput {
    /// Expands the transfer into a balanced manual document.
    #[must_use]
    pub fn into_transaction(self) -> TransactionInput {
        let description = self.description;
        TransactionInput {
            id: 0,
            company_id: self.company_id,
            node_id: self.node_id,
            transaction_type: TransactionType::Manual,
            post_date: self.post_date,
            currency_id: Some(self.currency_id),
            recipient_user_id: None,
            user_id: self.user_id,
            slots: vec![
                SlotInput::credit(self.pioneer_account_id, self.amount)
                    .described(description.clone()),
                SlotInput::debit(self.follower_account_id, self.amount)
                    .described(description.clone()),
            ],
            description,
        }
    }
}

/// Sequence numbers and invoice allocated to a new document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Counters {
    /// Counter group the numbers were drawn from.
    pub counter_group: String,
    /// Fiscal year the `year_counter` belongs to.
    pub fiscal_year: i32,
    /// Per-fiscal-year, per-group sequence number.
    pub year_counter: i64,
    /// Company-wide sequence number.
    pub year_cumulative: i64,
    /// Formatted invoice number.
    pub invoice: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn date() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2020, 10, 19)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_transaction_type_round_trips_through_str() {
        for ty in TransactionType::ALL {
            assert_eq!(ty.as_str().parse::<TransactionType>().unwrap(), ty);
        }
        assert!(matches!(
            "refund".parse::<TransactionType>(),
            Err(LedgerError::UnknownTransactionType(_))
        ));
    }

    #[test]
    fn test_status_transitions() {
        assert!(TransactionStatus::Unapproved.can_transition_to(TransactionStatus::Approved));
        assert!(!TransactionStatus::Approved.can_transition_to(TransactionStatus::Unapproved));
        assert!(!TransactionStatus::Approved.can_transition_to(TransactionStatus::Approved));
        assert!(TransactionStatus::Approved.is_terminal());
        assert!(!TransactionStatus::Unapproved.is_terminal());
    }

    #[test]
    fn test_transfer_expands_to_credit_then_debit() {
        let tx = TransferInput {
            company_id: 1001,
            node_id: 1,
            pioneer_account_id: 31,
            follower_account_id: 32,
            currency_id: 1,
            amount: dec!(1000),
            post_date: date(),
            description: "move cash".to_string(),
            user_id: 7,
        }
        .into_transaction();

        assert_eq!(tx.transaction_type, TransactionType::Manual);
        assert_eq!(tx.slots[0].account_id, 31);
        assert_eq!(tx.slots[0].credit, dec!(1000));
        assert_eq!(tx.slots[0].debit, Decimal::ZERO);
        assert_eq!(tx.slots[1].account_id, 32);
        assert_eq!(tx.slots[1].debit, dec!(1000));
    }

    #[test]
    fn test_stamp_slots_applies_document_fields() {
        let tx = TransactionInput {
            id: 5,
            company_id: 1001,
            node_id: 2,
            transaction_type: TransactionType::JournalEntry,
            post_date: date(),
            description: String::new(),
            currency_id: Some(1),
            recipient_user_id: None,
            user_id: 1,
            slots: vec![
                SlotInput::debit(10, dec!(5)),
                SlotInput::credit(11, dec!(5)).in_currency(3),
            ],
        };

        let drafts = tx.stamp_slots().unwrap();
        assert_eq!(drafts[0].currency_id, 1);
        assert_eq!(drafts[1].currency_id, 3);
        assert!(drafts.iter().all(|d| d.post_date == date() && d.transaction_id == 5));
        assert!(drafts.iter().all(|d| d.company_id == 1001 && d.node_id == 2));
    }

    #[test]
    fn test_stamp_slots_requires_a_currency() {
        let tx = TransactionInput {
            id: 0,
            company_id: 1,
            node_id: 1,
            transaction_type: TransactionType::JournalEntry,
            post_date: date(),
            description: String::new(),
            currency_id: None,
            recipient_user_id: None,
            user_id: 1,
            slots: vec![SlotInput::debit(10, dec!(5))],
        };

        assert!(matches!(
            tx.stamp_slots(),
            Err(LedgerError::MissingCurrency { account_id: 10 })
        ));
    }

    #[test]
    fn test_description_only_change_does_not_touch_balances() {
        let tx = TransactionInput {
            id: 1,
            company_id: 1,
            node_id: 1,
            transaction_type: TransactionType::JournalEntry,
            post_date: date(),
            description: String::new(),
            currency_id: Some(1),
            recipient_user_id: None,
            user_id: 1,
            slots: vec![SlotInput::debit(10, dec!(5))],
        };
        let before = tx.stamp_slots().unwrap().remove(0);
        let mut after = before.clone();
        after.description = "renamed".to_string();

        assert!(after.differs_from(&before));
        assert!(!after.changes_balances(&before));
    }
}
