//! Property-based tests for document validation rules.

use chrono::{NaiveDate, NaiveDateTime};
use proptest::prelude::*;
use rust_decimal::Decimal;

use super::error::LedgerError;
use super::types::SlotDraft;
use super::validation::{difference, validate_document, validate_slot};

/// Strategy to generate a valid positive amount (> 0).
fn positive_amount() -> impl Strategy<Value = Decimal> {
    // 0.01 to 1,000,000.00
    (1i64..100_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

fn post_date() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2020, 10, 19)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap()
}

fn make_slot(account_id: i64, debit: Decimal, credit: Decimal) -> SlotDraft {
    SlotDraft {
        id: 0,
        company_id: 1001,
        node_id: 1,
        transaction_id: 0,
        account_id,
        currency_id: 1,
        debit,
        credit,
        post_date: post_date(),
        description: String::new(),
    }
}

/// Debit slots for `amounts` plus one credit slot closing the document.
fn balanced(amounts: &[Decimal]) -> Vec<SlotDraft> {
    let total: Decimal = amounts.iter().copied().sum();
    let mut slots: Vec<SlotDraft> = amounts
        .iter()
        .zip(1..)
        .map(|(amount, account)| make_slot(account, *amount, Decimal::ZERO))
        .collect();
    slots.push(make_slot(0, Decimal::ZERO, total));
    slots
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Any set of debits closed by a single credit of their sum validates.
    #[test]
    fn prop_closed_document_is_balanced(
        amounts in prop::collection::vec(positive_amount(), 1..10),
    ) {
        let slots = balanced(&amounts);
        prop_assert!(validate_document(&slots).is_ok());
        prop_assert_eq!(difference(&slots), Decimal::ZERO);
    }

    /// Nudging the closing credit by any amount reports exactly that amount.
    #[test]
    fn prop_unbalanced_reports_difference(
        amounts in prop::collection::vec(positive_amount(), 1..10),
        nudge in positive_amount(),
    ) {
        let mut slots = balanced(&amounts);
        if let Some(last) = slots.last_mut() {
            last.credit += nudge;
        }
        match validate_document(&slots) {
            Err(LedgerError::Unbalanced { difference }) => prop_assert_eq!(difference, -nudge),
            other => prop_assert!(false, "expected Unbalanced, got {:?}", other),
        }
    }

    /// A slot with both sides set is rejected regardless of amounts.
    #[test]
    fn prop_two_sided_slot_rejected(debit in positive_amount(), credit in positive_amount()) {
        let is_two_sided = matches!(
            validate_slot(&make_slot(1, debit, credit)),
            Err(LedgerError::InvalidSlotSide { .. })
        );
        prop_assert!(is_two_sided);
    }

    /// Slot order never changes the outcome.
    #[test]
    fn prop_order_independent(
        amounts in prop::collection::vec(positive_amount(), 1..10),
        rotate in 0usize..10,
    ) {
        let mut slots = balanced(&amounts);
        let by = rotate % slots.len();
        slots.rotate_left(by);
        prop_assert!(validate_document(&slots).is_ok());
    }
}
