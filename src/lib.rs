//! XIRR Solver - extended internal rate of return for irregularly dated cash flows
//!
//! This library provides:
//! - Validated, date-sorted cash flow schedules and CSV loading
//! - NPV and its rate derivatives, evaluated in complex arithmetic
//! - A Halley/Newton root solver with a guess ladder for hard sign patterns
//! - Month-end look-back and turnover helpers for portfolio reporting

pub mod cashflow;
pub mod portfolio;
pub mod xirr;

// Re-export commonly used types
pub use cashflow::{CashFlowEntry, CashFlowSchedule};
pub use xirr::{
    solve_xirr, solve_xirr_default, xnpv, SolveStatus, SolverConfig, XirrError, XirrReport,
    XirrSolver,
};
