//! Beta of a symbol against a benchmark index.
//!
//! beta = Cov(symbol, benchmark) / Var(benchmark) over daily returns aligned
//! by date, using sample statistics (ddof = 1).

use chrono::NaiveDate;

use crate::types::PriceSeries;

/// Nominal trailing window for beta.
pub const BETA_WINDOW_MONTHS: u32 = 12;

/// Close-to-close return attributed to the later of the two dates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DailyReturn {
    pub date: NaiveDate,
    pub value: f64,
}

/// `(close[i] - close[i-1]) / close[i-1]` for every row after the first.
pub fn daily_returns(series: &PriceSeries) -> Vec<DailyReturn> {
    series
        .points()
        .windows(2)
        .map(|pair| DailyReturn {
            date: pair[1].date,
            value: (pair[1].close - pair[0].close) / pair[0].close,
        })
        .collect()
}

/// Pair up returns that share a date. Both inputs must be ascending by date.
pub fn align_returns(symbol: &[DailyReturn], benchmark: &[DailyReturn]) -> Vec<(f64, f64)> {
    let mut aligned = Vec::with_capacity(symbol.len().min(benchmark.len()));
    let (mut i, mut j) = (0, 0);
    while i < symbol.len() && j < benchmark.len() {
        let (a, b) = (&symbol[i], &benchmark[j]);
        match a.date.cmp(&b.date) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                aligned.push((a.value, b.value));
                i += 1;
                j += 1;
            }
        }
    }
    aligned
}

/// Sample covariance of x and y and sample variance of y.
fn covariance_and_variance(pairs: &[(f64, f64)]) -> Option<(f64, f64)> {
    if pairs.len() < 2 {
        return None;
    }
    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|(x, _)| x).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|(_, y)| y).sum::<f64>() / n;

    let (cov, var) = pairs.iter().fold((0.0, 0.0), |(cov, var), (x, y)| {
        let dy = y - mean_y;
        (cov + (x - mean_x) * dy, var + dy * dy)
    });

    Some((cov / (n - 1.0), var / (n - 1.0)))
}

/// Beta of `symbol` against `benchmark`.
///
/// `None` when fewer than two dates overlap or the benchmark has zero
/// variance over the overlap.
pub fn compute_beta(symbol: &[DailyReturn], benchmark: &[DailyReturn]) -> Option<f64> {
    let aligned = align_returns(symbol, benchmark);
    let (cov, var) = covariance_and_variance(&aligned)?;
    if var == 0.0 || !var.is_finite() {
        return None;
    }
    let beta = cov / var;
    beta.is_finite().then_some(beta)
}

/// Beta from two price series over the trailing [`BETA_WINDOW_MONTHS`].
pub fn beta_between(symbol: &PriceSeries, benchmark: &PriceSeries) -> Option<f64> {
    let symbol = symbol.trailing_months(BETA_WINDOW_MONTHS);
    let benchmark = benchmark.trailing_months(BETA_WINDOW_MONTHS);
    compute_beta(&daily_returns(&symbol), &daily_returns(&benchmark))
}
