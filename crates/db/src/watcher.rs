//! Single-writer queue for journal and voucher commands.
//!
//! Commands routed through a [`JournalEntryWatcher`] run one at a time on a
//! dedicated task, in the order they were sent. Calls made directly on the
//! coordinators bypass the queue and rely on the database transaction
//! alone.

use std::panic::AssertUnwindSafe;

use futures::FutureExt;
use tally_core::ledger::{LedgerError, TransactionInput};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::context::LedgerContext;
use crate::repositories::{LedgerDocument, TransactionCoordinator, VoucherApproval, VoucherCoordinator};

type Reply = oneshot::Sender<Result<LedgerDocument, LedgerError>>;

/// A unit of work queued on the watcher.
pub enum Command {
    /// Post a journal entry.
    JournalEntry(TransactionInput, Reply),
    /// Update an approved document.
    JournalUpdate(TransactionInput, Reply),
    /// Record a voucher.
    JournalVoucher(TransactionInput, Reply),
    /// Approve a voucher.
    VoucherApprove(VoucherApproval, Reply),
    /// Update a pending voucher.
    VoucherUpdate(TransactionInput, Reply),
}

/// Handle to the watcher task.
///
/// Cheap to clone. The task exits once every handle is dropped and the
/// queue has drained.
#[derive(Clone)]
pub struct JournalEntryWatcher {
    tx: mpsc::Sender<Command>,
}

impl JournalEntryWatcher {
    /// Starts the watcher on the current tokio runtime.
    #[must_use]
    pub fn spawn(ctx: LedgerContext) -> (Self, JoinHandle<()>) {
        let capacity = ctx.config().watcher_capacity.max(1);
        let (tx, rx) = mpsc::channel(capacity);
        let transactions = TransactionCoordinator::new(ctx.clone());
        let vouchers = VoucherCoordinator::new(ctx);
        let handle = tokio::spawn(run_watcher_loop(rx, transactions, vouchers));
        (Self { tx }, handle)
    }

    /// Queues a journal entry and waits for its result.
    pub async fn journal_entry(&self, input: TransactionInput) -> Result<LedgerDocument, LedgerError> {
        self.request(|reply| Command::JournalEntry(input, reply)).await
    }

    /// Queues a journal update and waits for its result.
    pub async fn journal_update(&self, input: TransactionInput) -> Result<LedgerDocument, LedgerError> {
        self.request(|reply| Command::JournalUpdate(input, reply)).await
    }

    /// Queues a new voucher and waits for its result.
    pub async fn journal_voucher(&self, input: TransactionInput) -> Result<LedgerDocument, LedgerError> {
        self.request(|reply| Command::JournalVoucher(input, reply)).await
    }

    /// Queues a voucher approval and waits for its result.
    pub async fn approve_voucher(&self, approval: VoucherApproval) -> Result<LedgerDocument, LedgerError> {
        self.request(|reply| Command::VoucherApprove(approval, reply)).await
    }

    /// Queues a voucher update and waits for its result.
    pub async fn voucher_update(&self, input: TransactionInput) -> Result<LedgerDocument, LedgerError> {
        self.request(|reply| Command::VoucherUpdate(input, reply)).await
    }

    async fn request(
        &self,
        command: impl FnOnce(Reply) -> Command,
    ) -> Result<LedgerDocument, LedgerError> {
        let (reply, response) = oneshot::channel();
        self.tx.send(command(reply)).await.map_err(|_| stopped())?;
        response.await.map_err(|_| stopped())?
    }
}

fn stopped() -> LedgerError {
    LedgerError::Internal("journal entry watcher is not running".to_string())
}

/// The watcher task: drains the queue until every sender is gone.
pub async fn run_watcher_loop(
    mut rx: mpsc::Receiver<Command>,
    transactions: TransactionCoordinator,
    vouchers: VoucherCoordinator,
) {
    tracing::info!("journal entry watcher started");
    while let Some(command) = rx.recv().await {
        match command {
            Command::JournalEntry(input, reply) => {
                let _ = reply.send(contained(transactions.journal_entry(input)).await);
            }
            Command::JournalUpdate(input, reply) => {
                let _ = reply.send(contained(transactions.journal_update(input)).await);
            }
            Command::JournalVoucher(input, reply) => {
                let _ = reply.send(contained(vouchers.journal_voucher(input)).await);
            }
            Command::VoucherApprove(approval, reply) => {
                let _ = reply.send(contained(vouchers.approve_voucher(approval)).await);
            }
            Command::VoucherUpdate(input, reply) => {
                let _ = reply.send(contained(vouchers.voucher_update(input)).await);
            }
        }
    }
    tracing::info!("journal entry watcher stopped");
}

/// Runs one command, turning a panic into an error. The command's unit of
/// work has already rolled back by the time the panic is caught.
async fn contained<F>(operation: F) -> Result<LedgerDocument, LedgerError>
where
    F: Future<Output = Result<LedgerDocument, LedgerError>>,
{
    AssertUnwindSafe(operation)
        .catch_unwind()
        .await
        .unwrap_or_else(|_| {
            tracing::error!(trace = "JW-PANIC", "watcher command panicked");
            Err(LedgerError::Internal("operation panicked".to_string()))
        })
}
