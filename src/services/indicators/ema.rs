//! Exponential moving average (EMA) smoothing state.

/// A running EMA, held as a plain value.
///
/// The recurrence is seeded with the first observation, with no SMA warm-up
/// and no look-ahead:
/// - `ema[0] = x[0]`
/// - `ema[i] = alpha * x[i] + (1 - alpha) * ema[i - 1]`
///
/// [`Ema::next`] consumes the state and returns the successor, so a series
/// of EMAs is a fold over the input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ema {
    alpha: f64,
    value: Option<f64>,
}

impl Ema {
    /// Span-based EMA: `alpha = 2 / (span + 1)`.
    pub fn with_span(span: usize) -> Self {
        Self::with_alpha(2.0 / (span.max(1) as f64 + 1.0))
    }

    /// Wilder smoothing: `alpha = 1 / period`.
    pub fn wilder(period: usize) -> Self {
        Self::with_alpha(1.0 / period.max(1) as f64)
    }

    pub fn with_alpha(alpha: f64) -> Self {
        Self { alpha, value: None }
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Current smoothed value, `None` before the first observation.
    pub fn value(&self) -> Option<f64> {
        self.value
    }

    #[must_use]
    pub fn next(self, x: f64) -> Self {
        let value = match self.value {
            None => x,
            Some(prev) => self.alpha * x + (1.0 - self.alpha) * prev,
        };
        Self {
            alpha: self.alpha,
            value: Some(value),
        }
    }
}

/// EMA over a whole slice, one output per input.
pub fn ema_series(values: &[f64], span: usize) -> Vec<f64> {
    values
        .iter()
        .scan(Ema::with_span(span), |ema, &x| {
            *ema = ema.next(x);
            ema.value()
        })
        .collect()
}
