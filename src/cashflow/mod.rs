//! Cash flow data structures and CSV loading

mod data;
pub mod loader;

pub use data::{CashFlowEntry, CashFlowSchedule, DAYS_PER_YEAR};
pub use loader::{
    load_batch, load_batch_from_reader, load_cash_flows, load_cash_flows_from_reader, LoadError,
};
