//! Month-end date offsets for look-back windows

use chrono::{Datelike, Months, NaiveDate};

/// Roll `date` by `months` month ends.
///
/// Positive offsets roll forward; a date already on a month end counts as the
/// starting point, so `+1` from Jan 31 is Feb 28/29 and `+1` from Jan 15 is
/// Jan 31. Negative offsets roll back: `-1` from Jan 15 or Jan 31 is Dec 31.
/// Zero rolls forward to the current month end.
///
/// Returns `None` only when the result falls outside chrono's date range.
pub fn month_end_offset(date: NaiveDate, months: i32) -> Option<NaiveDate> {
    let shift = if months > 0 && !is_month_end(date) {
        months - 1
    } else {
        months
    };

    let first = date.with_day(1)?;
    let shifted = if shift >= 0 {
        first.checked_add_months(Months::new(shift.unsigned_abs()))?
    } else {
        first.checked_sub_months(Months::new(shift.unsigned_abs()))?
    };

    end_of_month(shifted)
}

/// Last calendar day of the month containing `date`
pub fn end_of_month(date: NaiveDate) -> Option<NaiveDate> {
    date.with_day(1)?
        .checked_add_months(Months::new(1))?
        .pred_opt()
}

pub fn is_month_end(date: NaiveDate) -> bool {
    date.succ_opt()
        .map_or(true, |next| next.month() != date.month())
}
