//! Counter groups and invoice number formatting.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use super::error::LedgerError;
use super::types::TransactionType;

/// Maps each transaction type onto the counter sequence it draws from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CounterGroups {
    groups: BTreeMap<TransactionType, String>,
}

impl Default for CounterGroups {
    fn default() -> Self {
        let groups = TransactionType::ALL
            .into_iter()
            .map(|ty| (ty, default_group(ty).to_string()))
            .collect();
        Self { groups }
    }
}

const fn default_group(ty: TransactionType) -> &'static str {
    match ty {
        TransactionType::Manual | TransactionType::JournalEntry | TransactionType::JournalUpdate => {
            "journal"
        }
        TransactionType::JournalVoucher
        | TransactionType::VoucherApprove
        | TransactionType::VoucherUpdate => "voucher",
        TransactionType::OpeningEntry => "opening",
        TransactionType::PaymentEntry => "payment",
        TransactionType::ReceiptEntry => "receipt",
    }
}

impl CounterGroups {
    /// Builds the table from the defaults, moving every type listed in
    /// `overrides` into the named group.
    ///
    /// # Errors
    ///
    /// Returns `UnknownTransactionType` for an unrecognised type name.
    pub fn with_overrides(overrides: &BTreeMap<String, Vec<String>>) -> Result<Self, LedgerError> {
        let mut table = Self::default();
        for (group, types) in overrides {
            for name in types {
                let ty: TransactionType = name.parse()?;
                table.groups.insert(ty, group.clone());
            }
        }
        Ok(table)
    }

    /// Group name for `ty`.
    #[must_use]
    pub fn group_of(&self, ty: TransactionType) -> &str {
        self.groups
            .get(&ty)
            .map_or_else(|| default_group(ty), String::as_str)
    }
}

/// Values substituted into an invoice pattern.
#[derive(Debug, Clone, Copy)]
pub struct InvoiceFields<'a> {
    /// Fiscal year.
    pub year: i32,
    /// Store code.
    pub store: &'a str,
    /// Per-year counter.
    pub counter: i64,
    /// Cumulative counter.
    pub cumulative: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Year,
    ShortYear,
    Store,
    Counter(usize),
    Cumulative,
}

/// Parsed invoice pattern.
///
/// Tokens: `{year}`, `{yy}`, `{store}`, `{counter}`, `{counter:N}` (zero
/// padded to `N` digits) and `{cumulative}`. Anything outside braces is
/// copied verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvoicePattern {
    segments: Vec<Segment>,
}

/// Widest zero padding accepted by `{counter:N}`.
const MAX_WIDTH: usize = 18;

impl InvoicePattern {
    /// Parses a pattern.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInvoicePattern` for an unknown token, an unclosed
    /// brace or a bad width.
    pub fn parse(pattern: &str) -> Result<Self, LedgerError> {
        let invalid = || LedgerError::InvalidInvoicePattern(pattern.to_string());
        let mut segments = Vec::new();
        let mut rest = pattern;

        while let Some(open) = rest.find('{') {
            if open > 0 {
                segments.push(Segment::Literal(rest[..open].to_string()));
            }
            let after = &rest[open + 1..];
            let close = after.find('}').ok_or_else(invalid)?;
            segments.push(parse_token(&after[..close]).ok_or_else(invalid)?);
            rest = &after[close + 1..];
        }
        if !rest.is_empty() {
            segments.push(Segment::Literal(rest.to_string()));
        }

        Ok(Self { segments })
    }

    /// Renders the pattern.
    #[must_use]
    pub fn render(&self, fields: &InvoiceFields<'_>) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            // Writing into a String cannot fail.
            let _ = match segment {
                Segment::Literal(text) => out.write_str(text),
                Segment::Year => write!(out, "{}", fields.year),
                Segment::ShortYear => write!(out, "{:02}", fields.year.rem_euclid(100)),
                Segment::Store => out.write_str(fields.store),
                Segment::Counter(width) => write!(out, "{:0width$}", fields.counter),
                Segment::Cumulative => write!(out, "{}", fields.cumulative),
            };
        }
        out
    }
}

fn parse_token(token: &str) -> Option<Segment> {
    match token {
        "year" => Some(Segment::Year),
        "yy" => Some(Segment::ShortYear),
        "store" => Some(Segment::Store),
        "counter" => Some(Segment::Counter(0)),
        "cumulative" => Some(Segment::Cumulative),
        _ => {
            let width = token.strip_prefix("counter:")?.parse::<usize>().ok()?;
            (1..=MAX_WIDTH).contains(&width).then_some(Segment::Counter(width))
        }
    }
}
