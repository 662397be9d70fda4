//! Chain behaviour of the permanent slot ledger.

mod common;

use common::*;
use rstest::rstest;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tally_core::ledger::{ErrorKind, LedgerError, SlotDraft, SlotInput, TransactionType};
use tally_db::repositories::SlotLedger;
use tally_db::{TransactionCoordinator, UnitOfWork};

async fn post(
    coordinator: &TransactionCoordinator,
    date: chrono::NaiveDateTime,
    debit_account: i64,
    credit_account: i64,
    value: i64,
) -> i64 {
    coordinator
        .journal_entry(document(
            TransactionType::JournalEntry,
            date,
            vec![
                SlotInput::debit(debit_account, amount(value)),
                SlotInput::credit(credit_account, amount(value)),
            ],
        ))
        .await
        .expect("Failed to post journal entry")
        .header
        .id
}

#[tokio::test]
async fn test_backdated_insert_shifts_later_balances() {
    let ctx = ledger().await;
    let coordinator = TransactionCoordinator::new(ctx.clone());

    post(&coordinator, day(2020, 10, 10), CASH, SALES, 100).await;
    post(&coordinator, day(2020, 10, 20), FEES, CASH, 40).await;

    let before = assert_chain_consistent(&ctx, CASH).await;
    let amounts_before: Vec<_> = before.iter().map(|s| (s.id, s.debit, s.credit)).collect();
    assert_eq!(
        before.iter().map(|s| s.balance).collect::<Vec<_>>(),
        vec![amount(100), amount(60)]
    );

    post(&coordinator, day(2020, 10, 15), CASH, SALES, 5).await;

    let after = assert_chain_consistent(&ctx, CASH).await;
    assert_eq!(
        after.iter().map(|s| s.balance).collect::<Vec<_>>(),
        vec![amount(100), amount(105), amount(65)]
    );
    for (id, debit, credit) in amounts_before {
        let slot = after.iter().find(|s| s.id == id).unwrap();
        assert_eq!((slot.debit, slot.credit), (debit, credit));
    }

    let balance = coordinator.balance(key(CASH)).await.unwrap();
    assert_eq!(balance, amount(65));
}

#[tokio::test]
async fn test_same_date_slots_ordered_by_id() {
    let ctx = ledger().await;
    let coordinator = TransactionCoordinator::new(ctx.clone());

    let date = day(2020, 10, 19);
    post(&coordinator, date, CASH, SALES, 10).await;
    post(&coordinator, date, CASH, SALES, 1).await;

    let chain = assert_chain_consistent(&ctx, CASH).await;
    assert!(chain[0].id < chain[1].id);
    assert_eq!(chain[0].balance, amount(10));
    assert_eq!(chain[1].balance, amount(11));
}

#[rstest]
#[case::inactive(DORMANT, LedgerError::AccountInactive(DORMANT), ErrorKind::Forbidden)]
#[case::read_only(LOCKED, LedgerError::AccountReadOnly(LOCKED), ErrorKind::Forbidden)]
#[case::unknown(999, LedgerError::AccountNotFound(999), ErrorKind::NotFound)]
#[tokio::test]
async fn test_guarded_accounts_are_vetoed(
    #[case] account_id: i64,
    #[case] expected: LedgerError,
    #[case] kind: ErrorKind,
) {
    let ctx = ledger().await;
    let coordinator = TransactionCoordinator::new(ctx.clone());
    let transaction_id = post(&coordinator, day(2020, 10, 19), CASH, SALES, 10).await;

    let draft = SlotDraft {
        id: 0,
        company_id: COMPANY,
        node_id: NODE,
        transaction_id,
        account_id,
        currency_id: IDR,
        debit: dec!(1),
        credit: Decimal::ZERO,
        post_date: day(2020, 10, 19),
        description: String::new(),
    };

    let uow = UnitOfWork::begin(ctx.db()).await.unwrap();
    let err = SlotLedger::new(&ctx)
        .create(uow.conn(), draft)
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), expected.error_code());
    assert_eq!(err.to_string(), expected.to_string());
    assert_eq!(err.kind(), kind);
    uow.rollback().await.unwrap();

    assert_chain_consistent(&ctx, CASH).await;
}

#[tokio::test]
async fn test_retract_then_reapply_keeps_chain_and_cache_in_step() {
    let ctx = ledger().await;
    let coordinator = TransactionCoordinator::new(ctx.clone());

    post(&coordinator, day(2020, 10, 10), CASH, SALES, 100).await;
    post(&coordinator, day(2020, 10, 15), CASH, SALES, 5).await;
    post(&coordinator, day(2020, 10, 20), FEES, CASH, 40).await;
    let before = assert_chain_consistent(&ctx, CASH).await;
    let (first, middle, last) = (before[0].id, before[1].id, before[2].id);

    let ledger = SlotLedger::new(&ctx);
    let uow = UnitOfWork::begin(ctx.db()).await.unwrap();
    let prior = ledger.find(uow.conn(), COMPANY, middle).await.unwrap();

    let retracted = ledger.retract(uow.conn(), &prior).await.unwrap();
    assert_eq!(retracted.debit, Decimal::ZERO);
    assert_eq!(retracted.balance, dec!(100));
    let chain = assert_chain_on(uow.conn(), &ctx, CASH).await;
    assert_eq!(
        chain.iter().map(|s| (s.id, s.balance)).collect::<Vec<_>>(),
        vec![(first, dec!(100)), (middle, dec!(100)), (last, dec!(60))]
    );

    let draft = SlotDraft {
        debit: dec!(7.25),
        post_date: day(2020, 10, 25),
        ..prior.draft()
    };
    let placed = ledger.reapply(uow.conn(), draft).await.unwrap();
    assert_eq!(placed.id, middle);
    assert_eq!(placed.balance, dec!(67.25));
    let chain = assert_chain_on(uow.conn(), &ctx, CASH).await;
    assert_eq!(
        chain.iter().map(|s| (s.id, s.balance)).collect::<Vec<_>>(),
        vec![(first, dec!(100)), (last, dec!(60)), (middle, dec!(67.25))]
    );
    uow.commit().await.unwrap();

    assert_chain_consistent(&ctx, CASH).await;
    assert_eq!(coordinator.balance(key(CASH)).await.unwrap(), dec!(67.25));
}

#[tokio::test]
async fn test_negative_amount_is_rejected_before_any_write() {
    let ctx = ledger().await;
    let coordinator = TransactionCoordinator::new(ctx.clone());

    let err = coordinator
        .journal_entry(document(
            TransactionType::JournalEntry,
            day(2020, 10, 19),
            vec![
                SlotInput::debit(CASH, amount(-5)),
                SlotInput::credit(SALES, amount(-5)),
            ],
        ))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ValidationFailed);

    let chain = assert_chain_consistent(&ctx, CASH).await;
    assert!(chain.is_empty());
}

#[tokio::test]
async fn test_unknown_currency_is_not_found() {
    let ctx = ledger().await;
    let coordinator = TransactionCoordinator::new(ctx.clone());

    let err = coordinator
        .journal_entry(document(
            TransactionType::JournalEntry,
            day(2020, 10, 19),
            vec![
                SlotInput::debit(CASH, amount(5)).in_currency(42),
                SlotInput::credit(SALES, amount(5)).in_currency(42),
            ],
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::CurrencyNotFound(42)));
}
