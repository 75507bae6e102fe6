//! Second-order Newton (Halley) iteration for the XIRR root
//!
//! Each step uses NPV, NPV' and NPV'' at the current estimate:
//!
//! `r_new = r - 2·f·f' / (2·f'² - f·f'')`
//!
//! falling back to the plain Newton step `r - f / f'` when the Halley
//! denominator degenerates. Iterates live in the complex plane; convergence is
//! judged on the real part only, and a root with a material imaginary part is
//! rejected.

use log::{debug, log, warn, Level};
use num_complex::Complex64;
use serde::Serialize;
use std::env;

use super::npv::{NpvEvaluation, NpvFunction};
use super::{XirrError, XirrResult};
use crate::cashflow::{CashFlowEntry, CashFlowSchedule};

/// Convergence threshold on the change in the real part of the rate
pub const DEFAULT_TOLERANCE: f64 = 1e-6;

/// Iteration cap per starting guess
pub const DEFAULT_MAX_ITERATIONS: u32 = 50;

/// Starting rate when the caller does not supply one (10%)
pub const DEFAULT_INITIAL_GUESS: f64 = 0.1;

/// No step is attempted when |NPV'| falls below this fraction of the largest
/// |amount|
const DERIVATIVE_EPSILON: f64 = 1e-15;

/// Halley denominator is degenerate when smaller than this fraction of 2·|f'|²
const HALLEY_DENOMINATOR_EPSILON: f64 = 1e-14;

/// Imaginary parts above this are treated as genuinely complex
const IMAGINARY_TOLERANCE: f64 = 1e-6;

/// Solver settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SolverConfig {
    pub tolerance: f64,
    pub max_iterations: u32,
    pub initial_guess: f64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_TOLERANCE,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            initial_guess: DEFAULT_INITIAL_GUESS,
        }
    }
}

impl SolverConfig {
    /// Read XIRR_TOLERANCE, XIRR_MAX_ITERATIONS and XIRR_INITIAL_GUESS,
    /// keeping the default for anything missing or unparsable. A tolerance
    /// that is not a positive finite number also keeps the default.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            tolerance: env::var("XIRR_TOLERANCE")
                .ok()
                .and_then(|s| parse_tolerance(&s))
                .unwrap_or(defaults.tolerance),
            max_iterations: env::var("XIRR_MAX_ITERATIONS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_iterations),
            initial_guess: env::var("XIRR_INITIAL_GUESS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.initial_guess),
        }
    }

    #[must_use]
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    #[must_use]
    pub fn with_max_iterations(mut self, max_iterations: u32) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    #[must_use]
    pub fn with_initial_guess(mut self, initial_guess: f64) -> Self {
        self.initial_guess = initial_guess;
        self
    }
}

/// Why a solve ended the way it did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SolveStatus {
    /// A real rate above -100% was found
    Converged,
    /// No sign mix, or every flow on one date; nothing to iterate
    DegenerateInput,
    /// Iteration cap reached, or the derivative vanished
    ConvergenceFailure,
    /// Iteration settled on a root with a material imaginary part
    ComplexRoot,
}

/// Outcome of a single solve
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct XirrReport {
    /// Annualized rate, present only when `status` is `Converged`
    pub rate: Option<f64>,
    pub status: SolveStatus,
    pub iterations: u32,
    /// NPV at the returned rate
    pub residual: Option<f64>,
    /// Evaluations made where 1 + r was not a positive real number
    pub complex_steps: u32,
}

impl XirrReport {
    fn degenerate() -> Self {
        Self {
            rate: None,
            status: SolveStatus::DegenerateInput,
            iterations: 0,
            residual: None,
            complex_steps: 0,
        }
    }

    fn failed(status: SolveStatus, iterations: u32, complex_steps: u32) -> Self {
        Self {
            rate: None,
            status,
            iterations,
            residual: None,
            complex_steps,
        }
    }

    pub fn is_converged(&self) -> bool {
        self.status == SolveStatus::Converged
    }
}

/// XIRR solver
#[derive(Debug, Clone, Copy, Default)]
pub struct XirrSolver {
    config: SolverConfig,
}

impl XirrSolver {
    pub fn new(config: SolverConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Annualized rate, or `None` when no real rate exists or the search fails
    pub fn solve(&self, cash_flows: &[CashFlowEntry]) -> XirrResult<Option<f64>> {
        Ok(self.solve_detailed(cash_flows)?.rate)
    }

    /// Solve from the configured initial guess and report how it went
    pub fn solve_detailed(&self, cash_flows: &[CashFlowEntry]) -> XirrResult<XirrReport> {
        validate_guess(self.config.initial_guess)?;

        let npv = match prepare(cash_flows)? {
            Some(npv) => npv,
            None => return Ok(XirrReport::degenerate()),
        };

        Ok(self.iterate(&npv, self.config.initial_guess, Level::Warn))
    }

    /// Try 0.1, -0.1, 0.2, -0.2, ... 0.9, -0.9 in turn and keep the first
    /// real root. The configured initial guess is not used.
    ///
    /// When every guess fails, the report of the last attempt is returned.
    /// Individual guess failures are logged at debug level; a single warning
    /// is logged when the whole ladder fails.
    pub fn solve_with_guess_ladder(&self, cash_flows: &[CashFlowEntry]) -> XirrResult<XirrReport> {
        let npv = match prepare(cash_flows)? {
            Some(npv) => npv,
            None => return Ok(XirrReport::degenerate()),
        };

        let mut last = XirrReport::failed(SolveStatus::ConvergenceFailure, 0, 0);
        let mut attempts = 0;
        for guess in guess_ladder() {
            attempts += 1;
            let report = self.iterate(&npv, guess, Level::Debug);
            if report.is_converged() {
                debug!("Guess ladder converged from {}", guess);
                return Ok(report);
            }
            last = report;
        }

        warn!(
            "XIRR guess ladder found no real root after {} guesses (last status {:?})",
            attempts, last.status
        );
        Ok(last)
    }

    /// Run the iteration from `guess`, logging trouble at `level`
    fn iterate(&self, npv: &NpvFunction, guess: f64, level: Level) -> XirrReport {
        let mut rate = Complex64::new(guess, 0.0);
        let mut complex_steps = 0;
        let derivative_floor = DERIVATIVE_EPSILON * npv.scale();

        for iteration in 1..=self.config.max_iterations {
            if is_complex_point(rate) {
                if complex_steps == 0 {
                    log!(
                        level,
                        "XIRR search entered the complex plane at r = {} (guess {}); continuing",
                        rate,
                        guess
                    );
                }
                complex_steps += 1;
            }

            let eval = npv.evaluate(rate);
            if !eval.is_finite() {
                log!(level, "NPV is not finite at r = {}; abandoning guess {}", rate, guess);
                return XirrReport::failed(SolveStatus::ConvergenceFailure, iteration, complex_steps);
            }

            let step = match halley_step(&eval, derivative_floor)
                .or_else(|| newton_step(&eval, derivative_floor))
            {
                Some(step) => step,
                None => {
                    log!(
                        level,
                        "NPV derivative vanished at r = {}; abandoning guess {}",
                        rate,
                        guess
                    );
                    return XirrReport::failed(SolveStatus::ConvergenceFailure, iteration, complex_steps);
                }
            };

            let next = rate - step;
            if !next.is_finite() {
                log!(
                    level,
                    "XIRR step from r = {} is not finite; abandoning guess {}",
                    rate,
                    guess
                );
                return XirrReport::failed(SolveStatus::ConvergenceFailure, iteration, complex_steps);
            }

            if (next.re - rate.re).abs() < self.config.tolerance {
                return finish(npv, next, iteration, complex_steps, level);
            }

            rate = next;
        }

        log!(
            level,
            "XIRR did not converge within {} iterations from guess {} (last r = {})",
            self.config.max_iterations, guess, rate
        );
        XirrReport::failed(
            SolveStatus::ConvergenceFailure,
            self.config.max_iterations,
            complex_steps,
        )
    }
}

/// Compute XIRR from `initial_guess` with default tolerance and iteration cap.
///
/// # Arguments
/// * `cash_flows` - Dated amounts in any order (positive = inflow, negative = outflow)
/// * `initial_guess` - Starting annual rate, e.g. 0.1
///
/// # Returns
/// * `Ok(Some(rate))` - Annual rate as a decimal (e.g., 0.05 for 5%)
/// * `Ok(None)` - No real rate exists, or the search did not converge
/// * `Err(_)` - Empty input, non-finite amounts, or an unusable guess
pub fn solve_xirr(cash_flows: &[CashFlowEntry], initial_guess: f64) -> XirrResult<Option<f64>> {
    XirrSolver::new(SolverConfig::default().with_initial_guess(initial_guess)).solve(cash_flows)
}

/// [`solve_xirr`] starting from 10%
pub fn solve_xirr_default(cash_flows: &[CashFlowEntry]) -> XirrResult<Option<f64>> {
    solve_xirr(cash_flows, DEFAULT_INITIAL_GUESS)
}

/// A usable tolerance is a positive finite number
fn parse_tolerance(value: &str) -> Option<f64> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|tolerance| tolerance.is_finite() && *tolerance > 0.0)
}

fn validate_guess(guess: f64) -> XirrResult<()> {
    if !guess.is_finite() || guess <= -1.0 {
        return Err(XirrError::InvalidGuess { guess });
    }
    Ok(())
}

/// Validate the input and build the NPV function, or `None` when no root can
/// exist: a single sign, or no elapsed time between flows
fn prepare(cash_flows: &[CashFlowEntry]) -> XirrResult<Option<NpvFunction>> {
    let schedule = CashFlowSchedule::new(cash_flows)?;

    if !schedule.has_inflow() || !schedule.has_outflow() {
        debug!(
            "XIRR undefined: {} cash flows lack both an inflow and an outflow",
            schedule.entries().len()
        );
        return Ok(None);
    }

    if schedule.span_days() == 0 {
        debug!("XIRR undefined: all cash flows fall on {}", schedule.origin());
        return Ok(None);
    }

    Ok(Some(NpvFunction::new(&schedule)))
}

fn guess_ladder() -> impl Iterator<Item = f64> {
    (1..=9).flat_map(|tenths| {
        let guess = tenths as f64 / 10.0;
        [guess, -guess]
    })
}

/// True when 1 + r is not a positive real number
fn is_complex_point(rate: Complex64) -> bool {
    rate.re <= -1.0 || rate.im.abs() > IMAGINARY_TOLERANCE
}

/// `derivative_floor` is the |NPV'| below which no step is taken
fn halley_step(eval: &NpvEvaluation, derivative_floor: f64) -> Option<Complex64> {
    let NpvEvaluation { value, first, second } = *eval;
    if first.norm() < derivative_floor {
        return None;
    }

    let newton_term = first * first * 2.0;
    let denominator = newton_term - value * second;
    if !denominator.is_finite()
        || denominator.norm() <= HALLEY_DENOMINATOR_EPSILON * newton_term.norm()
    {
        return None;
    }

    Some(value * first * 2.0 / denominator)
}

fn newton_step(eval: &NpvEvaluation, derivative_floor: f64) -> Option<Complex64> {
    if eval.first.norm() < derivative_floor {
        return None;
    }
    Some(eval.value / eval.first)
}

fn finish(
    npv: &NpvFunction,
    root: Complex64,
    iterations: u32,
    complex_steps: u32,
    level: Level,
) -> XirrReport {
    if root.im.abs() > IMAGINARY_TOLERANCE || root.re <= -1.0 {
        log!(level, "XIRR converged to a complex root {}; no real rate", root);
        return XirrReport::failed(SolveStatus::ComplexRoot, iterations, complex_steps);
    }

    let residual = npv.value_at(root.re);
    debug!(
        "XIRR converged to {:.8} in {} iterations (residual {:.3e})",
        root.re, iterations, residual
    );

    XirrReport {
        rate: Some(root.re),
        status: SolveStatus::Converged,
        iterations,
        residual: Some(residual),
        complex_steps,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xirr::xnpv;
    use approx::{assert_abs_diff_eq, assert_relative_eq};
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn flow(y: i32, m: u32, d: u32, amount: f64) -> CashFlowEntry {
        CashFlowEntry::new(date(y, m, d), amount)
    }

    /// Spreadsheet XIRR reference schedule, rate 37.3362535%
    fn reference_flows() -> Vec<CashFlowEntry> {
        vec![
            flow(2008, 1, 1, -10000.0),
            flow(2008, 3, 1, 2750.0),
            flow(2008, 10, 30, 4250.0),
            flow(2009, 2, 15, 3250.0),
            flow(2009, 4, 1, 2750.0),
        ]
    }

    #[test]
    fn test_simple_one_year() {
        // 2019 is not a leap year: exactly 365 days
        let flows = vec![flow(2019, 1, 1, -1000.0), flow(2020, 1, 1, 1100.0)];

        let rate = solve_xirr_default(&flows).unwrap().unwrap();
        assert_abs_diff_eq!(rate, 0.10, epsilon = 1e-4);
    }

    #[test]
    fn test_reference_schedule() {
        let rate = solve_xirr_default(&reference_flows()).unwrap().unwrap();
        assert_abs_diff_eq!(rate, 0.373362535, epsilon = 1e-6);
    }

    #[test]
    fn test_negative_rate() {
        // Lose 20% over two years
        let flows = vec![flow(2019, 1, 1, -1000.0), flow(2021, 1, 1, 800.0)];

        let rate = solve_xirr_default(&flows).unwrap().unwrap();
        let expected = 0.8_f64.powf(365.0 / 731.0) - 1.0;
        assert_relative_eq!(rate, expected, epsilon = 1e-8);
    }

    #[test]
    fn test_all_outflows_is_undefined() {
        let flows = vec![
            flow(2019, 1, 1, -1000.0),
            flow(2019, 6, 1, 0.0),
            flow(2020, 1, 1, -50.0),
        ];

        let report = XirrSolver::default().solve_detailed(&flows).unwrap();
        assert_eq!(report.rate, None);
        assert_eq!(report.status, SolveStatus::DegenerateInput);
        assert_eq!(report.iterations, 0);
    }

    #[test]
    fn test_all_outflows_undefined_for_any_magnitude() {
        let flows = vec![flow(2001, 3, 9, -1e-9), flow(2030, 12, 31, -1e12)];
        assert_eq!(solve_xirr(&flows, 0.5).unwrap(), None);
    }

    #[test]
    fn test_all_inflows_is_undefined() {
        let flows = vec![flow(2019, 1, 1, 1000.0), flow(2020, 1, 1, 1100.0)];
        assert_eq!(solve_xirr_default(&flows).unwrap(), None);
    }

    #[test]
    fn test_same_date_flows_are_undefined() {
        let balanced = vec![flow(2019, 1, 1, -100.0), flow(2019, 1, 1, 100.0)];
        let unbalanced = vec![flow(2019, 1, 1, -100.0), flow(2019, 1, 1, 50.0)];

        assert_eq!(solve_xirr_default(&balanced).unwrap(), None);
        assert_eq!(solve_xirr_default(&unbalanced).unwrap(), None);
    }

    #[test]
    fn test_empty_input_is_an_error() {
        assert_eq!(solve_xirr_default(&[]), Err(XirrError::EmptyCashFlows));
    }

    #[test]
    fn test_nan_amount_is_an_error() {
        let flows = vec![flow(2019, 1, 1, -1000.0), flow(2020, 1, 1, f64::NAN)];
        let err = solve_xirr_default(&flows).unwrap_err();
        assert!(matches!(err, XirrError::NonFiniteAmount { index: 1, .. }));
    }

    #[test]
    fn test_guess_at_or_below_minus_one_is_an_error() {
        let flows = reference_flows();
        assert_eq!(
            solve_xirr(&flows, -1.0),
            Err(XirrError::InvalidGuess { guess: -1.0 })
        );
        assert!(solve_xirr(&flows, f64::NAN).is_err());
    }

    #[test]
    fn test_deterministic() {
        let flows = reference_flows();
        let first = solve_xirr(&flows, 0.25).unwrap();
        let second = solve_xirr(&flows, 0.25).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_order_invariant() {
        let flows = reference_flows();
        let shuffled = vec![flows[3], flows[0], flows[4], flows[2], flows[1]];

        assert_eq!(
            solve_xirr_default(&flows).unwrap(),
            solve_xirr_default(&shuffled).unwrap()
        );
    }

    #[test]
    fn test_npv_at_solved_rate_is_zero() {
        let flows = reference_flows();
        let rate = solve_xirr_default(&flows).unwrap().unwrap();

        assert_abs_diff_eq!(xnpv(rate, &flows).unwrap(), 0.0, epsilon = 1e-6);

        let report = XirrSolver::default().solve_detailed(&flows).unwrap();
        assert_abs_diff_eq!(report.residual.unwrap(), 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_iteration_cap_returns_none() {
        let config = SolverConfig::default()
            .with_initial_guess(0.9)
            .with_max_iterations(1);

        let report = XirrSolver::new(config).solve_detailed(&reference_flows()).unwrap();
        assert_eq!(report.rate, None);
        assert_eq!(report.status, SolveStatus::ConvergenceFailure);
        assert_eq!(report.iterations, 1);
    }

    #[test]
    fn test_guess_ladder_recovers_root() {
        // Two flows: a single Halley step lands exactly on the root, so one
        // iteration only confirms convergence when the guess is already there.
        let flows = vec![flow(2019, 1, 1, -1000.0), flow(2020, 1, 1, 1200.0)];
        let solver = XirrSolver::new(SolverConfig::default().with_max_iterations(1));

        assert_eq!(solver.solve(&flows).unwrap(), None);

        let report = solver.solve_with_guess_ladder(&flows).unwrap();
        assert_eq!(report.status, SolveStatus::Converged);
        assert_abs_diff_eq!(report.rate.unwrap(), 0.2, epsilon = 1e-9);
    }

    #[test]
    fn test_guess_ladder_agrees_with_default_solve() {
        let flows = reference_flows();
        let direct = solve_xirr_default(&flows).unwrap().unwrap();
        let laddered = XirrSolver::default()
            .solve_with_guess_ladder(&flows)
            .unwrap()
            .rate
            .unwrap();

        assert_abs_diff_eq!(direct, laddered, epsilon = 1e-9);
    }

    #[test]
    fn test_guess_ladder_degenerate_input() {
        let flows = vec![flow(2019, 1, 1, -1000.0), flow(2020, 1, 1, -1.0)];
        let report = XirrSolver::default().solve_with_guess_ladder(&flows).unwrap();
        assert_eq!(report.status, SolveStatus::DegenerateInput);
    }

    #[test]
    fn test_guess_ladder_order() {
        let guesses: Vec<f64> = guess_ladder().collect();
        assert_eq!(guesses.len(), 18);
        assert_eq!(guesses[0], 0.1);
        assert_eq!(guesses[1], -0.1);
        assert_eq!(guesses[17], -0.9);
    }

    #[test]
    fn test_search_through_negative_base_continues() {
        // Starting at -150% puts 1 + r below zero; the step still lands on
        // the real root
        let flows = vec![flow(2019, 1, 1, -1000.0), flow(2020, 1, 1, 1100.0)];
        let npv = prepare(&flows).unwrap().unwrap();

        let report = XirrSolver::default().iterate(&npv, -1.5, Level::Warn);
        assert_eq!(report.status, SolveStatus::Converged);
        assert_eq!(report.complex_steps, 1);
        assert_abs_diff_eq!(report.rate.unwrap(), 0.1, epsilon = 1e-9);
    }

    #[test]
    fn test_halley_falls_back_to_newton() {
        // f'' chosen so that 2f'^2 - f f'' = 0
        let eval = NpvEvaluation {
            value: Complex64::new(2.0, 0.0),
            first: Complex64::new(1.0, 0.0),
            second: Complex64::new(1.0, 0.0),
        };

        assert_eq!(halley_step(&eval, DERIVATIVE_EPSILON), None);
        assert_eq!(
            newton_step(&eval, DERIVATIVE_EPSILON),
            Some(Complex64::new(2.0, 0.0))
        );
    }

    #[test]
    fn test_vanishing_derivative_has_no_step() {
        let eval = NpvEvaluation {
            value: Complex64::new(5.0, 0.0),
            first: Complex64::new(0.0, 0.0),
            second: Complex64::new(1.0, 0.0),
        };

        assert_eq!(
            halley_step(&eval, DERIVATIVE_EPSILON)
                .or_else(|| newton_step(&eval, DERIVATIVE_EPSILON)),
            None
        );
    }

    #[test]
    fn test_derivative_floor_is_relative() {
        let eval = NpvEvaluation {
            value: Complex64::new(1e-20, 0.0),
            first: Complex64::new(-1e-20, 0.0),
            second: Complex64::new(0.0, 0.0),
        };

        // Small against amounts near 1000, material against amounts near 1e-19
        assert_eq!(halley_step(&eval, DERIVATIVE_EPSILON * 1000.0), None);
        assert_eq!(
            halley_step(&eval, DERIVATIVE_EPSILON * 1e-19),
            Some(Complex64::new(-1.0, 0.0))
        );
    }

    #[test]
    fn test_tiny_amounts_solve_like_large_ones() {
        let flows = reference_flows();
        let tiny: Vec<CashFlowEntry> = flows
            .iter()
            .map(|entry| CashFlowEntry::new(entry.date, entry.amount * 1e-19))
            .collect();

        let rate = solve_xirr_default(&flows).unwrap().unwrap();
        let tiny_rate = solve_xirr_default(&tiny).unwrap().unwrap();
        assert_abs_diff_eq!(tiny_rate, 0.373362535, epsilon = 1e-6);
        assert_abs_diff_eq!(tiny_rate, rate, epsilon = 1e-9);

        let one_year = vec![flow(2019, 1, 1, -1000e-19), flow(2020, 1, 1, 1100e-19)];
        let report = XirrSolver::default().solve_detailed(&one_year).unwrap();
        assert_eq!(report.status, SolveStatus::Converged);
        assert_abs_diff_eq!(report.rate.unwrap(), 0.1, epsilon = 1e-9);
    }

    #[test]
    fn test_same_date_amounts_ignore_input_order() {
        // Same-date amounts that cancel only up to rounding
        let flows = vec![
            flow(2019, 1, 1, -1000.0),
            flow(2020, 1, 1, 1e16),
            flow(2020, 1, 1, 1.0),
            flow(2020, 1, 1, 1.0),
            flow(2020, 1, 1, -1e16),
            flow(2020, 1, 1, 1100.0),
        ];
        let shuffled = vec![flows[2], flows[4], flows[0], flows[1], flows[3], flows[5]];

        let rate = solve_xirr_default(&flows).unwrap().unwrap();
        assert_eq!(solve_xirr_default(&shuffled).unwrap(), Some(rate));
        assert_abs_diff_eq!(rate, 0.1, epsilon = 1e-2);

        let mut reversed = flows.clone();
        reversed.reverse();
        assert_eq!(
            XirrSolver::default().solve_detailed(&reversed).unwrap(),
            XirrSolver::default().solve_detailed(&flows).unwrap()
        );
    }

    #[test]
    fn test_complex_root_is_rejected() {
        let npv = prepare(&reference_flows()).unwrap().unwrap();

        let off_axis = finish(&npv, Complex64::new(0.3, 0.5), 7, 3, Level::Warn);
        assert_eq!(off_axis.rate, None);
        assert_eq!(off_axis.status, SolveStatus::ComplexRoot);
        assert_eq!(off_axis.residual, None);
        assert_eq!(off_axis.iterations, 7);
        assert_eq!(off_axis.complex_steps, 3);

        let below_minus_one = finish(&npv, Complex64::new(-1.2, 0.0), 4, 4, Level::Warn);
        assert_eq!(below_minus_one.rate, None);
        assert_eq!(below_minus_one.status, SolveStatus::ComplexRoot);

        // Imaginary noise under the threshold still counts as real
        let near_real = finish(&npv, Complex64::new(0.373362535, 1e-9), 5, 0, Level::Warn);
        assert_eq!(near_real.status, SolveStatus::Converged);
    }

    #[test]
    fn test_failed_ladder_warns_once() {
        let solver = XirrSolver::new(SolverConfig::default().with_max_iterations(1));
        let flows = reference_flows();

        let mut report = None;
        let warnings = warning_count::warnings_during(|| {
            report = Some(solver.solve_with_guess_ladder(&flows).unwrap());
        });
        let report = report.unwrap();
        assert_eq!(report.status, SolveStatus::ConvergenceFailure);
        assert_eq!(warnings, 1);

        let warnings = warning_count::warnings_during(|| {
            assert_eq!(solver.solve(&flows).unwrap(), None);
        });
        assert_eq!(warnings, 1);
    }

    #[test]
    fn test_parse_tolerance() {
        assert_eq!(parse_tolerance("1e-8"), Some(1e-8));
        assert_eq!(parse_tolerance(" 0.001 "), Some(0.001));
        assert_eq!(parse_tolerance("NaN"), None);
        assert_eq!(parse_tolerance("inf"), None);
        assert_eq!(parse_tolerance("-1"), None);
        assert_eq!(parse_tolerance("0"), None);
        assert_eq!(parse_tolerance("tight"), None);
    }

    /// Counts warnings logged on the calling thread
    mod warning_count {
        use log::{Level, LevelFilter, Log, Metadata, Record};
        use std::cell::Cell;
        use std::sync::Once;

        thread_local! {
            static WARNINGS: Cell<usize> = Cell::new(0);
        }

        struct CountingLogger;

        impl Log for CountingLogger {
            fn enabled(&self, _metadata: &Metadata) -> bool {
                true
            }

            fn log(&self, record: &Record) {
                if record.level() == Level::Warn {
                    WARNINGS.with(|count| count.set(count.get() + 1));
                }
            }

            fn flush(&self) {}
        }

        static LOGGER: CountingLogger = CountingLogger;
        static INIT: Once = Once::new();

        pub fn warnings_during(run: impl FnOnce()) -> usize {
            INIT.call_once(|| {
                log::set_logger(&LOGGER).unwrap();
                log::set_max_level(LevelFilter::Debug);
            });

            let before = WARNINGS.with(Cell::get);
            run();
            WARNINGS.with(Cell::get) - before
        }
    }

    #[test]
    fn test_solver_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<XirrSolver>();
        assert_send_sync::<XirrReport>();
    }

    #[test]
    fn test_config_builders() {
        let config = SolverConfig::default()
            .with_tolerance(1e-9)
            .with_max_iterations(10)
            .with_initial_guess(0.05);

        assert_eq!(config.tolerance, 1e-9);
        assert_eq!(config.max_iterations, 10);
        assert_eq!(config.initial_guess, 0.05);
        assert_eq!(XirrSolver::new(config).config().max_iterations, 10);
    }
}
