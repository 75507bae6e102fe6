//! Extended internal rate of return for irregularly dated cash flows

mod error;
pub mod npv;
mod solver;

pub use error::{XirrError, XirrResult};
pub use npv::{xnpv, NpvEvaluation, NpvFunction};
pub use solver::{
    solve_xirr, solve_xirr_default, SolveStatus, SolverConfig, XirrReport, XirrSolver,
    DEFAULT_INITIAL_GUESS, DEFAULT_MAX_ITERATIONS, DEFAULT_TOLERANCE,
};
