//! Running balance math for slot chains.
//!
//! A chain is every live slot of one (company, account, currency) scope,
//! ordered by `(post_date, id)`. Each slot stores the balance of the chain
//! up to and including itself:
//!
//! ```text
//! balance[i] = balance[i-1] + debit[i] - credit[i],  balance[-1] = 0
//! ```
//!
//! The persistent ledgers keep this invariant with range updates in SQL;
//! [`Chain`] applies the same steps in memory so the algorithm can be
//! checked independently of a database.

use rust_decimal::Decimal;

use super::types::ChainPosition;

/// Signed effect of a slot on its chain.
#[must_use]
pub fn contribution(debit: Decimal, credit: Decimal) -> Decimal {
    debit - credit
}

/// Balance of a slot given the balance of the slot before it.
#[must_use]
pub fn running_balance(preceding: Option<Decimal>, debit: Decimal, credit: Decimal) -> Decimal {
    preceding.unwrap_or(Decimal::ZERO) + contribution(debit, credit)
}

/// One slot as seen by the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainEntry {
    /// Position in the chain.
    pub position: ChainPosition,
    /// Debit amount.
    pub debit: Decimal,
    /// Credit amount.
    pub credit: Decimal,
    /// Stored running balance.
    pub balance: Decimal,
}

/// First slot whose stored balance disagrees with the recurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainBreak {
    /// Position of the offending slot.
    pub position: ChainPosition,
    /// Balance the recurrence requires.
    pub expected: Decimal,
    /// Balance actually stored.
    pub actual: Decimal,
}

/// Walks a chain in `(post_date, id)` order and returns the first slot that
/// breaks the running balance recurrence.
///
/// Entries are sorted before the walk, so callers may pass them in any
/// order.
#[must_use]
pub fn first_break(entries: &[ChainEntry]) -> Option<ChainBreak> {
    let mut sorted = entries.to_vec();
    sorted.sort_by_key(|e| e.position);

    let mut previous = None;
    for entry in sorted {
        let expected = running_balance(previous, entry.debit, entry.credit);
        if expected != entry.balance {
            return Some(ChainBreak {
                position: entry.position,
                expected,
                actual: entry.balance,
            });
        }
        previous = Some(entry.balance);
    }
    None
}

/// In-memory chain applying the same steps as the slot ledgers.
#[derive(Debug, Clone, Default)]
pub struct Chain {
    entries: Vec<ChainEntry>,
}

impl Chain {
    /// Creates an empty chain.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Slots in chain order.
    #[must_use]
    pub fn entries(&self) -> &[ChainEntry] {
        &self.entries
    }

    /// Balance of the last slot, or zero for an empty chain.
    #[must_use]
    pub fn closing_balance(&self) -> Decimal {
        self.entries.last().map_or(Decimal::ZERO, |e| e.balance)
    }

    /// Inserts a slot: balance from the strictly preceding slot, then every
    /// strictly later slot shifted by the slot's contribution.
    pub fn insert(&mut self, position: ChainPosition, debit: Decimal, credit: Decimal) {
        let index = self.entries.partition_point(|e| e.position < position);
        let preceding = index
            .checked_sub(1)
            .and_then(|i| self.entries.get(i))
            .map(|e| e.balance);

        self.entries.insert(
            index,
            ChainEntry {
                position,
                debit,
                credit,
                balance: running_balance(preceding, debit, credit),
            },
        );
        self.regulate(position, contribution(debit, credit));
    }

    /// Removes a slot: every strictly later slot is shifted by
    /// `credit - debit`. Returns false if no slot sits at `position`.
    pub fn remove(&mut self, position: ChainPosition) -> bool {
        let Ok(index) = self.entries.binary_search_by_key(&position, |e| e.position) else {
            return false;
        };
        let entry = self.entries.remove(index);
        self.regulate(position, contribution(entry.credit, entry.debit));
        true
    }

    /// Adds `delta` to the balance of every slot strictly after `after`.
    pub fn regulate(&mut self, after: ChainPosition, delta: Decimal) {
        for entry in self.entries.iter_mut().filter(|e| e.position > after) {
            entry.balance += delta;
        }
    }
}
