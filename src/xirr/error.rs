//! Input-validation errors for the XIRR solver
//!
//! "No rate exists" is not an error: the solver reports it as an absent
//! result. These variants cover input that should never reach the solver.

use thiserror::Error;

/// A specialized Result type for XIRR operations.
pub type XirrResult<T> = Result<T, XirrError>;

/// Invalid input rejected before any NPV evaluation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum XirrError {
    /// No cash flows were supplied.
    #[error("Cash flow sequence is empty")]
    EmptyCashFlows,

    /// A cash flow amount is NaN or infinite.
    #[error("Cash flow {index} has non-finite amount {amount}")]
    NonFiniteAmount {
        /// Position of the offending entry in the caller's sequence.
        index: usize,
        /// The rejected amount.
        amount: f64,
    },

    /// The starting rate cannot be used to discount.
    #[error("Invalid initial guess {guess}: must be finite and greater than -1")]
    InvalidGuess {
        /// The rejected guess.
        guess: f64,
    },
}
