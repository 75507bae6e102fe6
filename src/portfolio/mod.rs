//! Portfolio reporting helpers used alongside XIRR

mod calendar;
mod turnover;

pub use calendar::{end_of_month, is_month_end, month_end_offset};
pub use turnover::turnover_ratio;
