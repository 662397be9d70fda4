//! Property-based tests for running balance chains.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use proptest::prelude::*;
use rust_decimal::Decimal;

use super::balance::{first_break, Chain};
use super::types::ChainPosition;

fn base_date() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2020, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap()
}

/// Generated slot: (day offset, debit side?, amount in cents).
fn arb_slot() -> impl Strategy<Value = (i64, bool, i64)> {
    (0i64..30, any::<bool>(), 1i64..1_000_000)
}

fn build(slots: &[(i64, bool, i64)]) -> Chain {
    let mut chain = Chain::new();
    // ids are allocated in insertion order, like an auto-increment key
    for (id, (day, is_debit, cents)) in (1..).zip(slots) {
        let amount = Decimal::new(*cents, 2);
        let (debit, credit) = if *is_debit {
            (amount, Decimal::ZERO)
        } else {
            (Decimal::ZERO, amount)
        };
        let position = ChainPosition {
            post_date: base_date() + Duration::days(*day),
            id,
        };
        chain.insert(position, debit, credit);
    }
    chain
}

fn net(slots: &[(i64, bool, i64)]) -> Decimal {
    slots
        .iter()
        .map(|(_, is_debit, cents)| {
            let amount = Decimal::new(*cents, 2);
            if *is_debit { amount } else { -amount }
        })
        .sum()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Inserting in any date order keeps every stored balance consistent.
    #[test]
    fn prop_inserts_keep_chain_consistent(
        slots in prop::collection::vec(arb_slot(), 1..25),
    ) {
        let chain = build(&slots);
        prop_assert!(first_break(chain.entries()).is_none());
        prop_assert_eq!(chain.closing_balance(), net(&slots));
    }

    /// Removing any slot equals never having inserted it.
    #[test]
    fn prop_remove_matches_rebuild(
        slots in prop::collection::vec(arb_slot(), 1..25),
        pick in any::<prop::sample::Index>(),
    ) {
        let mut chain = build(&slots);
        let victim = chain.entries()[pick.index(slots.len())].position;
        prop_assert!(chain.remove(victim));
        prop_assert!(first_break(chain.entries()).is_none());

        let removed = usize::try_from(victim.id - 1).unwrap();
        let remaining: Vec<_> = slots
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != removed)
            .map(|(_, s)| *s)
            .collect();
        prop_assert_eq!(chain.closing_balance(), net(&remaining));
    }
}
