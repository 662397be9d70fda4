//! Document posting, update and deletion on the permanent ledger.

mod common;

use common::*;
use rust_decimal::Decimal;
use tally_core::ledger::{ErrorKind, LedgerError, SlotInput, TransactionType, TransferInput};
use tally_db::TransactionCoordinator;
use tally_shared::types::PageRequest;

fn transfer(value: i64) -> TransferInput {
    TransferInput {
        company_id: COMPANY,
        node_id: NODE,
        pioneer_account_id: CASH,
        follower_account_id: BANK,
        currency_id: IDR,
        amount: amount(value),
        post_date: day(2020, 10, 19),
        description: "Deposit takings".to_string(),
        user_id: USER,
    }
}

fn split_sale(credit: i64) -> Vec<SlotInput> {
    vec![
        SlotInput::debit(CASH, amount(200)),
        SlotInput::debit(BANK, amount(800)),
        SlotInput::credit(SALES, amount(credit)),
    ]
}

#[tokio::test]
async fn test_transfer_moves_money_between_accounts() {
    let ctx = ledger().await;
    let coordinator = TransactionCoordinator::new(ctx.clone());

    let posted = coordinator.transfer(transfer(1000)).await.unwrap();
    assert_eq!(posted.slots.len(), 2);

    let cash = posted.slots.iter().find(|s| s.account_id == CASH).unwrap();
    assert_eq!(cash.credit, amount(1000));
    assert_eq!(cash.debit, Decimal::ZERO);
    let bank = posted.slots.iter().find(|s| s.account_id == BANK).unwrap();
    assert_eq!(bank.debit, amount(1000));

    assert_eq!(coordinator.balance(key(CASH)).await.unwrap(), amount(-1000));
    assert_eq!(coordinator.balance(key(BANK)).await.unwrap(), amount(1000));
    assert_chain_consistent(&ctx, CASH).await;
    assert_chain_consistent(&ctx, BANK).await;
}

#[tokio::test]
async fn test_transfer_to_same_account_is_rejected() {
    let ctx = ledger().await;
    let coordinator = TransactionCoordinator::new(ctx);

    let mut input = transfer(1000);
    input.follower_account_id = CASH;
    let err = coordinator.transfer(input).await.unwrap_err();
    assert!(matches!(err, LedgerError::SelfTransfer(CASH)));

    let err = coordinator.transfer(transfer(0)).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ValidationFailed);
}

#[tokio::test]
async fn test_balanced_journal_entry_posts() {
    let ctx = ledger().await;
    let coordinator = TransactionCoordinator::new(ctx.clone());

    let posted = coordinator
        .journal_entry(document(
            TransactionType::JournalEntry,
            day(2020, 10, 19),
            split_sale(1000),
        ))
        .await
        .unwrap();

    assert_eq!(posted.slots.len(), 3);
    assert_eq!(posted.header.invoice, "HQ-2020-00001");
    assert_eq!(coordinator.balance(key(SALES)).await.unwrap(), amount(-1000));

    let found = coordinator.find_by_id(COMPANY, posted.header.id).await.unwrap();
    assert_eq!(found.slots.len(), 3);
    assert_eq!(found.header.hash, posted.header.hash);
}

#[tokio::test]
async fn test_unbalanced_journal_entry_writes_nothing() {
    let ctx = ledger().await;
    let coordinator = TransactionCoordinator::new(ctx.clone());

    let err = coordinator
        .journal_entry(document(
            TransactionType::JournalEntry,
            day(2020, 10, 19),
            split_sale(1001),
        ))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ValidationFailed);
    assert!(err.to_string().contains("difference is not zero"));

    let statement = coordinator
        .statement(scope(CASH), PageRequest::default())
        .await
        .unwrap();
    assert_eq!(statement.meta.total, 0);

    // Counters were not consumed by the failed attempt.
    let posted = coordinator
        .journal_entry(document(
            TransactionType::JournalEntry,
            day(2020, 10, 19),
            split_sale(1000),
        ))
        .await
        .unwrap();
    assert_eq!(posted.header.year_counter, 1);
}

#[tokio::test]
async fn test_empty_document_is_rejected() {
    let ctx = ledger().await;
    let coordinator = TransactionCoordinator::new(ctx);

    let err = coordinator
        .journal_entry(document(TransactionType::JournalEntry, day(2020, 10, 19), vec![]))
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::EmptyTransaction));
}

#[tokio::test]
async fn test_voucher_types_are_not_posted_directly() {
    let ctx = ledger().await;
    let coordinator = TransactionCoordinator::new(ctx);

    let err = coordinator
        .create(document(
            TransactionType::JournalVoucher,
            day(2020, 10, 19),
            split_sale(1000),
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::WrongTransactionType { .. }));
}

#[tokio::test]
async fn test_journal_update_applies_diff() {
    let ctx = ledger().await;
    let coordinator = TransactionCoordinator::new(ctx.clone());

    let posted = coordinator
        .journal_entry(document(
            TransactionType::JournalEntry,
            day(2020, 10, 19),
            split_sale(1000),
        ))
        .await
        .unwrap();
    let slot_of = |account_id| {
        posted
            .slots
            .iter()
            .find(|s| s.account_id == account_id)
            .unwrap()
            .id
    };

    let mut update = document(
        TransactionType::JournalUpdate,
        day(2020, 10, 19),
        vec![
            SlotInput::debit(CASH, amount(300)).with_id(slot_of(CASH)),
            SlotInput::credit(SALES, amount(1100))
                .with_id(slot_of(SALES))
                .described("Corrected total"),
            SlotInput::debit(FEES, amount(800)),
        ],
    );
    update.id = posted.header.id;
    update.description = "Corrected".to_string();

    let updated = coordinator.journal_update(update).await.unwrap();
    assert_eq!(updated.slots.len(), 3);
    assert_eq!(updated.header.description, "Corrected");
    assert_eq!(updated.header.invoice, posted.header.invoice);

    assert_eq!(coordinator.balance(key(CASH)).await.unwrap(), amount(300));
    assert_eq!(coordinator.balance(key(BANK)).await.unwrap(), Decimal::ZERO);
    assert_eq!(coordinator.balance(key(SALES)).await.unwrap(), amount(-1100));
    assert_eq!(coordinator.balance(key(FEES)).await.unwrap(), amount(800));
    for account in [CASH, BANK, SALES, FEES] {
        assert_chain_consistent(&ctx, account).await;
    }
}

#[tokio::test]
async fn test_journal_update_must_stay_balanced() {
    let ctx = ledger().await;
    let coordinator = TransactionCoordinator::new(ctx.clone());

    let posted = coordinator.transfer(transfer(1000)).await.unwrap();
    let cash = posted.slots.iter().find(|s| s.account_id == CASH).unwrap();

    let mut update = document(
        TransactionType::JournalUpdate,
        day(2020, 10, 19),
        vec![SlotInput::credit(CASH, amount(1000)).with_id(cash.id)],
    );
    update.id = posted.header.id;

    let err = coordinator.journal_update(update).await.unwrap_err();
    assert!(matches!(err, LedgerError::Unbalanced { .. }));
    assert_eq!(coordinator.balance(key(BANK)).await.unwrap(), amount(1000));
}

#[tokio::test]
async fn test_journal_update_rejects_foreign_slot() {
    let ctx = ledger().await;
    let coordinator = TransactionCoordinator::new(ctx.clone());

    let first = coordinator.transfer(transfer(10)).await.unwrap();
    let second = coordinator.transfer(transfer(20)).await.unwrap();
    let foreign = first.slots[0].id;

    let mut update = document(
        TransactionType::JournalUpdate,
        day(2020, 10, 19),
        vec![
            SlotInput::credit(CASH, amount(20)).with_id(foreign),
            SlotInput::debit(BANK, amount(20)),
        ],
    );
    update.id = second.header.id;

    let err = coordinator.journal_update(update).await.unwrap_err();
    assert!(matches!(err, LedgerError::ForeignSlot { .. }));
    assert_eq!(coordinator.balance(key(BANK)).await.unwrap(), amount(30));
}

#[tokio::test]
async fn test_moving_post_date_reorders_chain() {
    let ctx = ledger().await;
    let coordinator = TransactionCoordinator::new(ctx.clone());

    let early = coordinator.transfer(transfer(10)).await.unwrap();
    let mut later = transfer(5);
    later.post_date = day(2020, 11, 1);
    coordinator.transfer(later).await.unwrap();

    let mut update = document(
        TransactionType::JournalUpdate,
        day(2020, 12, 1),
        early
            .slots
            .iter()
            .map(|s| {
                if s.debit.is_zero() {
                    SlotInput::credit(s.account_id, s.credit).with_id(s.id)
                } else {
                    SlotInput::debit(s.account_id, s.debit).with_id(s.id)
                }
            })
            .collect(),
    );
    update.id = early.header.id;
    coordinator.journal_update(update).await.unwrap();

    let chain = assert_chain_consistent(&ctx, BANK).await;
    assert_eq!(
        chain.iter().map(|s| s.balance).collect::<Vec<_>>(),
        vec![amount(5), amount(15)]
    );
}

#[tokio::test]
async fn test_delete_restores_balances() {
    let ctx = ledger().await;
    let coordinator = TransactionCoordinator::new(ctx.clone());

    let kept = coordinator.transfer(transfer(100)).await.unwrap();
    let mut earlier = transfer(40);
    earlier.post_date = day(2020, 10, 1);
    let dropped = coordinator.transfer(earlier).await.unwrap();

    coordinator
        .delete(COMPANY, dropped.header.id, USER)
        .await
        .unwrap();

    assert_eq!(coordinator.balance(key(BANK)).await.unwrap(), amount(100));
    let chain = assert_chain_consistent(&ctx, BANK).await;
    assert_eq!(chain.len(), 1);
    assert_eq!(chain[0].transaction_id, kept.header.id);

    let err = coordinator
        .find_by_id(COMPANY, dropped.header.id)
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::TransactionNotFound(_)));
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn test_documents_are_company_scoped() {
    let ctx = ledger().await;
    let coordinator = TransactionCoordinator::new(ctx);

    let posted = coordinator.transfer(transfer(100)).await.unwrap();
    let err = coordinator.find_by_id(2002, posted.header.id).await.unwrap_err();
    assert!(matches!(err, LedgerError::TransactionNotFound(_)));

    let err = coordinator.delete(2002, posted.header.id, USER).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn test_statement_pages_in_chronological_order() {
    let ctx = ledger().await;
    let coordinator = TransactionCoordinator::new(ctx);

    for (d, value) in [(20, 3), (5, 1), (12, 2)] {
        let mut input = transfer(value);
        input.post_date = day(2020, 10, d);
        coordinator.transfer(input).await.unwrap();
    }

    let first = coordinator
        .statement(scope(BANK), PageRequest::new(1, 2))
        .await
        .unwrap();
    assert_eq!(first.meta.total, 3);
    assert_eq!(
        first.data.iter().map(|s| s.debit).collect::<Vec<_>>(),
        vec![amount(1), amount(2)]
    );

    let second = coordinator
        .statement(scope(BANK), PageRequest::new(2, 2))
        .await
        .unwrap();
    assert_eq!(second.data.len(), 1);
    assert_eq!(second.data[0].balance, amount(6));
}
