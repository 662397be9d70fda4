//! Core ledger logic for Tally.
//!
//! This crate contains pure business logic with ZERO database dependencies:
//! document validation, running balance math, slot diffs, counter numbering
//! rules and the voucher state machine. The `tally-db` crate drives these
//! against persistent storage.

pub mod ledger;
