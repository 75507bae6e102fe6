//! Net present value of a dated schedule and its rate derivatives
//!
//! NPV(r) = Σ a_i / (1 + r)^t_i, with t_i the Actual/365 year fraction from
//! the earliest date. Evaluation is done in complex arithmetic so that rates
//! below -100% (negative base, fractional exponent) give complex values on the
//! principal branch instead of NaN.

use num_complex::Complex64;

use super::XirrResult;
use crate::cashflow::{CashFlowEntry, CashFlowSchedule};

/// NPV and its first two rate derivatives at a single rate
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NpvEvaluation {
    pub value: Complex64,
    pub first: Complex64,
    pub second: Complex64,
}

impl NpvEvaluation {
    pub fn is_finite(&self) -> bool {
        self.value.is_finite() && self.first.is_finite() && self.second.is_finite()
    }
}

/// Discounting function over a fixed schedule.
///
/// Same-date amounts are merged into one term when the function is built.
#[derive(Debug, Clone)]
pub struct NpvFunction {
    /// (year fraction, net amount), strictly increasing in year fraction
    terms: Vec<(f64, f64)>,
    /// Largest |amount| in the schedule
    scale: f64,
}

impl NpvFunction {
    pub fn new(schedule: &CashFlowSchedule) -> Self {
        let mut terms: Vec<(f64, f64)> = Vec::with_capacity(schedule.entries().len());
        let mut scale: f64 = 0.0;

        for (years, amount) in schedule.year_fractions() {
            scale = scale.max(amount.abs());
            if let Some((last_years, total)) = terms.last_mut() {
                if *last_years == years {
                    *total += amount;
                    continue;
                }
            }
            terms.push((years, amount));
        }

        Self { terms, scale }
    }

    /// Number of distinct dates
    pub fn term_count(&self) -> usize {
        self.terms.len()
    }

    /// Magnitude of the largest single amount, before same-date merging.
    ///
    /// NPV and its derivatives are linear in the amounts, so thresholds on
    /// them are taken relative to this.
    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Evaluate NPV, dNPV/dr and d²NPV/dr² in one pass.
    ///
    /// With x = 1 + r and d = x^(-t):
    /// - NPV   = Σ a·d
    /// - NPV'  = Σ -t·a·d / x
    /// - NPV'' = Σ t(t+1)·a·d / x²
    pub fn evaluate(&self, rate: Complex64) -> NpvEvaluation {
        let base = rate + 1.0;
        let zero = Complex64::new(0.0, 0.0);
        let mut value = zero;
        let mut first = zero;
        let mut second = zero;

        for &(years, amount) in &self.terms {
            // Origin term is undiscounted and has no rate sensitivity
            if years == 0.0 {
                value += amount;
                continue;
            }

            let discount = base.powf(-years);
            value += discount * amount;
            first += discount / base * (-years * amount);
            second += discount / (base * base) * (years * (years + 1.0) * amount);
        }

        NpvEvaluation { value, first, second }
    }

    /// Real part of NPV at a real rate
    pub fn value_at(&self, rate: f64) -> f64 {
        self.evaluate(Complex64::new(rate, 0.0)).value.re
    }
}

/// Net present value of `cash_flows` discounted at `rate`, in any order.
///
/// Equivalent to the spreadsheet XNPV function. For rates at or below -1 the
/// real part of the principal-branch value is returned.
pub fn xnpv(rate: f64, cash_flows: &[CashFlowEntry]) -> XirrResult<f64> {
    let schedule = CashFlowSchedule::new(cash_flows)?;
    Ok(NpvFunction::new(&schedule).value_at(rate))
}
