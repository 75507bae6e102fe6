//! Portfolio turnover

/// Turnover as the smaller of total purchases and total sales over the
/// portfolio value.
///
/// A side with a non-positive total is ignored, so one-sided trading uses the
/// side that traded. With no positive side the turnover is zero. Returns `None`
/// when the portfolio value is not positive.
pub fn turnover_ratio(purchases: &[f64], sales: &[f64], portfolio_value: f64) -> Option<f64> {
    if portfolio_value.is_nan() || portfolio_value <= 0.0 {
        return None;
    }

    let bought: f64 = purchases.iter().sum();
    let sold: f64 = sales.iter().sum();

    let traded = if bought.max(sold) > 0.0 {
        [bought, sold]
            .into_iter()
            .filter(|total| *total > 0.0)
            .fold(f64::INFINITY, f64::min)
    } else {
        0.0
    };

    Some(traded / portfolio_value)
}
