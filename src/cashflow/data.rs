//! Dated cash flow entries and the sorted schedule the solver consumes

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::xirr::{XirrError, XirrResult};

/// Day count used to turn elapsed days into year fractions (Actual/365 Fixed)
pub const DAYS_PER_YEAR: f64 = 365.0;

/// A single cash flow: positive amounts are inflows, negative are outflows
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CashFlowEntry {
    pub date: NaiveDate,
    pub amount: f64,
}

impl CashFlowEntry {
    pub fn new(date: NaiveDate, amount: f64) -> Self {
        Self { date, amount }
    }

    /// Money returned to the investor
    pub fn is_inflow(&self) -> bool {
        self.amount > 0.0
    }

    /// Money invested
    pub fn is_outflow(&self) -> bool {
        self.amount < 0.0
    }
}

impl From<(NaiveDate, f64)> for CashFlowEntry {
    fn from((date, amount): (NaiveDate, f64)) -> Self {
        Self::new(date, amount)
    }
}

/// Validated cash flows in chronological order.
///
/// Always non-empty with finite amounts. Entries sharing a date are kept
/// as separate rows; they are summed when the NPV is evaluated.
#[derive(Debug, Clone, PartialEq)]
pub struct CashFlowSchedule {
    entries: Vec<CashFlowEntry>,
}

impl CashFlowSchedule {
    /// Validate and sort the caller's entries by date, then by amount.
    ///
    /// Ordering same-date amounts as well makes the schedule, and the order in
    /// which same-date amounts are later summed, independent of the caller's
    /// ordering.
    pub fn new(entries: &[CashFlowEntry]) -> XirrResult<Self> {
        if entries.is_empty() {
            return Err(XirrError::EmptyCashFlows);
        }

        if let Some((index, entry)) = entries
            .iter()
            .enumerate()
            .find(|(_, entry)| !entry.amount.is_finite())
        {
            return Err(XirrError::NonFiniteAmount {
                index,
                amount: entry.amount,
            });
        }

        let mut sorted = entries.to_vec();
        sorted.sort_by(|a, b| {
            a.date
                .cmp(&b.date)
                .then_with(|| a.amount.total_cmp(&b.amount))
        });

        Ok(Self { entries: sorted })
    }

    pub fn entries(&self) -> &[CashFlowEntry] {
        &self.entries
    }

    /// Earliest date in the schedule; the discounting time origin
    pub fn origin(&self) -> NaiveDate {
        self.entries[0].date
    }

    /// Days between the first and last cash flow
    pub fn span_days(&self) -> i64 {
        let last = self.entries[self.entries.len() - 1].date;
        (last - self.origin()).num_days()
    }

    /// (years since origin, amount) for every entry, in date order
    pub fn year_fractions(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        let origin = self.origin();
        self.entries.iter().map(move |entry| {
            let days = (entry.date - origin).num_days() as f64;
            (days / DAYS_PER_YEAR, entry.amount)
        })
    }

    pub fn has_inflow(&self) -> bool {
        self.entries.iter().any(CashFlowEntry::is_inflow)
    }

    pub fn has_outflow(&self) -> bool {
        self.entries.iter().any(CashFlowEntry::is_outflow)
    }

    /// Undiscounted sum of all amounts
    pub fn total(&self) -> f64 {
        self.entries.iter().map(|entry| entry.amount).sum()
    }
}
