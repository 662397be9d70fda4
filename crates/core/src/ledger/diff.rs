//! Three-way partition of a document's slots during an update.

use std::collections::BTreeMap;

use super::error::LedgerError;
use super::types::SlotDraft;

/// A slot present both before and after the update, with changed fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotChange {
    /// Stored version.
    pub prior: SlotDraft,
    /// Submitted version.
    pub next: SlotDraft,
}

impl SlotChange {
    /// Returns true if the change moves money, so the slot must be
    /// retracted and reapplied rather than just rewritten.
    #[must_use]
    pub fn changes_balances(&self) -> bool {
        self.next.changes_balances(&self.prior)
    }
}

/// Result of comparing stored slots against submitted slots by id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SlotDiff {
    /// Submitted slots with id 0.
    pub created: Vec<SlotDraft>,
    /// Slots in both sets with at least one differing field.
    pub updated: Vec<SlotChange>,
    /// Stored slots that were not resubmitted.
    pub deleted: Vec<SlotDraft>,
    /// Ids of slots resubmitted without change.
    pub unchanged: Vec<i64>,
}

impl SlotDiff {
    /// Partitions `prior` and `incoming` by slot id.
    ///
    /// # Errors
    ///
    /// Returns `ForeignSlot` if an incoming slot names an id that is not a
    /// stored slot of `transaction_id`, or names the same id twice.
    pub fn compute(
        transaction_id: i64,
        prior: Vec<SlotDraft>,
        incoming: Vec<SlotDraft>,
    ) -> Result<Self, LedgerError> {
        let mut stored: BTreeMap<i64, SlotDraft> =
            prior.into_iter().map(|slot| (slot.id, slot)).collect();
        let mut diff = Self::default();

        for next in incoming {
            if next.id == 0 {
                diff.created.push(next);
                continue;
            }
            let prior = stored.remove(&next.id).ok_or(LedgerError::ForeignSlot {
                slot_id: next.id,
                transaction_id,
            })?;
            if next.differs_from(&prior) {
                diff.updated.push(SlotChange { prior, next });
            } else {
                diff.unchanged.push(next.id);
            }
        }

        diff.deleted = stored.into_values().collect();
        Ok(diff)
    }

    /// Returns true if nothing needs to be written.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.created.is_empty() && self.updated.is_empty() && self.deleted.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn date(day: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2020, 10, day)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn slot(id: i64, account_id: i64, debit: Decimal, credit: Decimal) -> SlotDraft {
        SlotDraft {
            id,
            company_id: 1001,
            node_id: 1,
            transaction_id: 9,
            account_id,
            currency_id: 1,
            debit,
            credit,
            post_date: date(19),
            description: String::new(),
        }
    }

    #[test]
    fn test_partition() {
        let prior = vec![
            slot(1, 31, Decimal::ZERO, dec!(100)),
            slot(2, 32, dec!(100), Decimal::ZERO),
            slot(3, 33, dec!(5), Decimal::ZERO),
        ];
        let mut renamed = slot(2, 32, dec!(100), Decimal::ZERO);
        renamed.description = "renamed".to_string();
        let incoming = vec![
            slot(1, 31, Decimal::ZERO, dec!(100)),
            renamed,
            slot(0, 34, dec!(5), Decimal::ZERO),
        ];

        let diff = SlotDiff::compute(9, prior, incoming).unwrap();
        assert_eq!(diff.unchanged, vec![1]);
        assert_eq!(diff.updated.len(), 1);
        assert!(!diff.updated[0].changes_balances());
        assert_eq!(diff.created.len(), 1);
        assert_eq!(diff.deleted.len(), 1);
        assert_eq!(diff.deleted[0].id, 3);
    }

    #[test]
    fn test_date_change_moves_money() {
        let prior = vec![slot(1, 31, dec!(1), Decimal::ZERO)];
        let mut next = slot(1, 31, dec!(1), Decimal::ZERO);
        next.post_date = date(20);

        let diff = SlotDiff::compute(9, prior, vec![next]).unwrap();
        assert!(diff.updated[0].changes_balances());
    }

    #[test]
    fn test_unchanged_document_is_empty() {
        let prior = vec![slot(1, 31, dec!(1), Decimal::ZERO)];
        let diff = SlotDiff::compute(9, prior.clone(), prior).unwrap();
        assert!(diff.is_empty());
    }

    #[test]
    fn test_unknown_id_rejected() {
        let prior = vec![slot(1, 31, dec!(1), Decimal::ZERO)];
        let err = SlotDiff::compute(9, prior, vec![slot(77, 31, dec!(1), Decimal::ZERO)])
            .unwrap_err();
        assert!(matches!(
            err,
            LedgerError::ForeignSlot {
                slot_id: 77,
                transaction_id: 9
            }
        ));
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let prior = vec![slot(1, 31, dec!(1), Decimal::ZERO)];
        let incoming = vec![
            slot(1, 31, dec!(1), Decimal::ZERO),
            slot(1, 31, dec!(1), Decimal::ZERO),
        ];
        assert!(SlotDiff::compute(9, prior, incoming).is_err());
    }
}
