//! Fiscal year bounds used for counter numbering.
//!
//! A fiscal year is the calendar year of the post date, taken as the
//! half-open range `[Jan 1 00:00:00, next Jan 1 00:00:00)`.

use chrono::{Datelike, NaiveDate, NaiveDateTime};

use super::error::LedgerError;

/// Calendar-year fiscal year.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FiscalYear {
    /// Year number.
    pub year: i32,
    /// First instant of the year.
    pub start: NaiveDateTime,
    /// First instant of the following year.
    pub next_start: NaiveDateTime,
}

impl FiscalYear {
    /// Returns the fiscal year containing `post_date`.
    ///
    /// # Errors
    ///
    /// Returns `NoFiscalYear` if the next year boundary is not representable.
    pub fn containing(post_date: NaiveDateTime) -> Result<Self, LedgerError> {
        let year = post_date.year();
        let start = year_start(year).ok_or(LedgerError::NoFiscalYear(post_date))?;
        let next_start = year
            .checked_add(1)
            .and_then(year_start)
            .ok_or(LedgerError::NoFiscalYear(post_date))?;
        Ok(Self {
            year,
            start,
            next_start,
        })
    }

    /// Returns true if `at` falls inside this fiscal year.
    #[must_use]
    pub fn contains(&self, at: NaiveDateTime) -> bool {
        self.start <= at && at < self.next_start
    }
}

fn year_start(year: i32) -> Option<NaiveDateTime> {
    NaiveDate::from_ymd_opt(year, 1, 1).and_then(|d| d.and_hms_opt(0, 0, 0))
}
